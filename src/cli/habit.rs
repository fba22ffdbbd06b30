use anyhow::Result;
use chronos_planning::{ActivityScope, HabitInput, compute_streak, load_year_activity};
use chronos_shared::{Habit, HabitMode};
use clap::{Args, Subcommand};
use serde_json::json;

use super::{print_json, require_user};
use crate::{app::App, config::Config};

#[derive(Subcommand)]
pub enum HabitCommand {
    /// List the user's habits
    List,
    /// Define a new habit
    Add {
        name: String,

        #[arg(long, default_value_t = HabitMode::Checkbox)]
        mode: HabitMode,

        /// Daily target of a quantifiable habit
        #[arg(long)]
        target: Option<f64>,

        /// Default amount added per log
        #[arg(long)]
        increment: Option<f64>,

        #[arg(long)]
        unit: Option<String>,
    },
    /// Delete a habit by id
    Remove { id: String },
}

#[derive(Args)]
pub struct LogArgs {
    /// Habit id or name
    pub habit: String,

    /// Amount to add, defaults to the habit increment
    #[arg(long)]
    pub amount: Option<f64>,
}

#[derive(Args)]
pub struct ActivityArgs {
    #[arg(long)]
    pub year: Option<i32>,

    /// Restrict to one habit id
    #[arg(long)]
    pub habit: Option<String>,
}

pub async fn habit(config: Config, command: HabitCommand) -> Result<()> {
    let app = App::open(&config).await?;
    require_user(&app)?;

    match command {
        HabitCommand::List => {
            let habits = app.habits.list().await?;
            let listed = habits
                .iter()
                .map(|h| json!({ "id": h.id, "habit": h }))
                .collect::<Vec<_>>();

            print_json(&listed)
        }
        HabitCommand::Add {
            name,
            mode,
            target,
            increment,
            unit,
        } => {
            let habit = app
                .habits
                .add(HabitInput {
                    name,
                    mode,
                    daily_target: target,
                    increment,
                    unit,
                    ..Default::default()
                })
                .await?;

            print_json(&json!({ "id": habit.id, "habit": habit }))
        }
        HabitCommand::Remove { id } => {
            app.habits.remove(&id).await?;
            tracing::info!(id, "Habit removed");

            Ok(())
        }
    }
}

pub async fn log(config: Config, args: LogArgs) -> Result<()> {
    let app = App::open(&config).await?;
    require_user(&app)?;

    let habits = app.habits.list().await?;
    let habit = find_habit(&habits, &args.habit)?;

    app.daily.ensure_plan(Some(&habits)).await?;

    let amount = args.amount.or(habit.increment).unwrap_or(1.0);
    let Some(log) = app.daily.log_habit(habit, amount).await? else {
        anyhow::bail!("no plan for {}", app.navigation.view_date());
    };

    print_json(&json!({ "habit": habit.id, "log": log }))
}

pub async fn streak(config: Config) -> Result<()> {
    let app = App::open(&config).await?;
    let uid = require_user(&app)?;

    let streak = compute_streak(app.store.as_ref(), &uid, app.clock.today()).await?;

    print_json(&json!({ "streak": streak }))
}

pub async fn activity(config: Config, args: ActivityArgs) -> Result<()> {
    let app = App::open(&config).await?;
    let uid = require_user(&app)?;

    let today = app.clock.today();
    let year = args.year.unwrap_or(today.year());
    let habits = app.habits.list().await?;

    let scope = match args.habit.as_deref() {
        Some(id) => ActivityScope::Habit(find_habit(&habits, id)?),
        None => ActivityScope::AllHabits(&habits),
    };

    let cells = load_year_activity(app.store.as_ref(), &uid, year, scope, today).await?;

    print_json(&cells)
}

fn find_habit<'a>(habits: &'a [Habit], id_or_name: &str) -> Result<&'a Habit> {
    habits
        .iter()
        .find(|h| h.id == id_or_name)
        .or_else(|| habits.iter().find(|h| h.name == id_or_name))
        .ok_or_else(|| anyhow::anyhow!("habit {id_or_name} not found"))
}
