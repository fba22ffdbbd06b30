use anyhow::Result;
use chronos_planning::{MonthKey, WeekKey};
use chronos_shared::{AnnualPatch, BigThing, Goal, Milestone, MonthlyPatch, WeeklyPatch, parse_date};
use clap::Args;
use ulid::Ulid;

use super::{print_json, require_user};
use crate::{app::App, config::Config};

#[derive(Args)]
pub struct DayArgs {
    /// Day to show, `YYYY-MM-DD` (defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Set the day's big thing
    #[arg(long)]
    pub big_thing: Option<String>,

    /// Mark the big thing as completed
    #[arg(long)]
    pub done: bool,
}

#[derive(Args)]
pub struct WeekArgs {
    #[arg(long)]
    pub year: Option<i32>,

    /// ISO week number
    #[arg(long, requires = "year")]
    pub week: Option<u8>,

    /// Append a goal to the week
    #[arg(long)]
    pub goal: Option<String>,
}

#[derive(Args)]
pub struct MonthArgs {
    #[arg(long)]
    pub year: Option<i32>,

    /// 1-12
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u8).range(1..=12))]
    pub month: Option<u8>,

    /// Append a milestone to the month
    #[arg(long, requires_all = ["start", "end"])]
    pub milestone: Option<String>,

    /// Milestone start, `YYYY-MM-DD`
    #[arg(long)]
    pub start: Option<String>,

    /// Milestone end, `YYYY-MM-DD`
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Args)]
pub struct YearArgs {
    #[arg(long)]
    pub year: Option<i32>,

    /// Append a goal to the year
    #[arg(long)]
    pub goal: Option<String>,
}

pub async fn day(config: Config, args: DayArgs) -> Result<()> {
    let app = App::open(&config).await?;
    require_user(&app)?;

    if let Some(date) = args.date.as_deref() {
        app.navigation.daily().set(parse_date(date)?);
    }

    app.daily.ensure_plan(None).await?;

    if args.big_thing.is_some() || args.done {
        let current = app.daily.current_plan().map(|p| p.big_thing);
        let Some(big_thing) = edit_big_thing(current, args.big_thing, args.done) else {
            anyhow::bail!("no plan for {}", app.navigation.view_date());
        };

        app.daily
            .set_big_thing(big_thing.text, big_thing.completed)
            .await?;
    }

    print_json(&app.daily.current_state())
}

/// New text replaces the stored one; completion is only ever set by `done`.
fn edit_big_thing(current: Option<BigThing>, text: Option<String>, done: bool) -> Option<BigThing> {
    match (current, text) {
        (Some(current), text) => Some(BigThing {
            text: text.unwrap_or(current.text),
            completed: current.completed || done,
        }),
        (None, Some(text)) => Some(BigThing {
            text,
            completed: done,
        }),
        (None, None) => None,
    }
}

pub async fn week(config: Config, args: WeekArgs) -> Result<()> {
    let app = App::open(&config).await?;
    require_user(&app)?;

    if let Some(year) = args.year {
        let week = args.week.unwrap_or(1);
        app.navigation.weekly().set(WeekKey::new(year, week));
    }

    app.weekly.ensure_plan().await?;

    if let Some(text) = args.goal {
        let mut goals = app
            .weekly
            .current_plan()
            .map(|p| p.goals)
            .unwrap_or_default();
        goals.push(Goal::new(Ulid::new().to_string(), text));

        app.weekly
            .update_plan(&WeeklyPatch {
                goals: Some(goals),
                ..Default::default()
            })
            .await?;
    }

    print_json(&app.weekly.current_state())
}

pub async fn month(config: Config, args: MonthArgs) -> Result<()> {
    let app = App::open(&config).await?;
    require_user(&app)?;

    if let Some(year) = args.year {
        let month = args.month.unwrap_or(1) - 1;
        app.navigation.monthly().set(MonthKey::new(year, month));
    }

    app.monthly.ensure_plan().await?;

    if let (Some(text), Some(start), Some(end)) = (args.milestone, args.start, args.end) {
        parse_date(&start)?;
        parse_date(&end)?;

        let mut milestones = app
            .monthly
            .current_plan()
            .map(|p| p.milestones)
            .unwrap_or_default();
        milestones.push(Milestone {
            id: Ulid::new().to_string(),
            text,
            start_date: start,
            end_date: end,
            completed: false,
        });

        app.monthly
            .update_plan(&MonthlyPatch {
                milestones: Some(milestones),
            })
            .await?;
    }

    print_json(&app.monthly.current_state())
}

pub async fn year(config: Config, args: YearArgs) -> Result<()> {
    let app = App::open(&config).await?;
    require_user(&app)?;

    if let Some(year) = args.year {
        app.navigation.annual().set(year);
    }

    app.annual.ensure_plan().await?;

    if let Some(text) = args.goal {
        let mut goals = app
            .annual
            .current_plan()
            .map(|p| p.goals)
            .unwrap_or_default();
        goals.push(Goal::new(Ulid::new().to_string(), text));

        app.annual
            .update_plan(&AnnualPatch { goals: Some(goals) })
            .await?;
    }

    print_json(&app.annual.current_state())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big_thing(text: &str, completed: bool) -> BigThing {
        BigThing {
            text: text.to_owned(),
            completed,
        }
    }

    #[test]
    fn new_text_keeps_completion() {
        let edited = edit_big_thing(Some(big_thing("ship", true)), Some("ship v2".to_owned()), false);

        assert_eq!(edited, Some(big_thing("ship v2", true)));
    }

    #[test]
    fn done_completes_without_new_text() {
        let edited = edit_big_thing(Some(big_thing("ship", false)), None, true);

        assert_eq!(edited, Some(big_thing("ship", true)));
    }

    #[test]
    fn no_plan_and_no_text_is_nothing() {
        assert_eq!(edit_big_thing(None, None, true), None);
        assert_eq!(
            edit_big_thing(None, Some("ship".to_owned()), false),
            Some(big_thing("ship", false))
        );
    }
}
