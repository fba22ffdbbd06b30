use anyhow::Result;
use chronos::cli::{ActivityArgs, DayArgs, HabitCommand, LogArgs, MonthArgs, WeekArgs, YearArgs};
use clap::{Parser, Subcommand};

/// chronos - annual, monthly, weekly and daily planning
#[derive(Parser)]
#[command(name = "chronos")]
#[command(about = "Plan years, months, weeks and days, and track habits", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Show or edit a daily plan
    Day(DayArgs),
    /// Manage habits
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Log a habit on today's plan
    Log(LogArgs),
    /// Consecutive fully completed days ending yesterday
    Streak,
    /// Show or edit a weekly plan
    Week(WeekArgs),
    /// Show or edit a monthly plan
    Month(MonthArgs),
    /// Show or edit an annual plan
    Year(YearArgs),
    /// Habit activity per day of a year
    Activity(ActivityArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = chronos::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    chronos::observability::init_observability(
        &config.observability.log_level,
        config.observability.json,
    )?;

    match cli.command {
        Commands::Migrate => migrate_command(config).await,
        Commands::Day(args) => chronos::cli::day(config, args).await,
        Commands::Habit(command) => chronos::cli::habit(config, command).await,
        Commands::Log(args) => chronos::cli::log(config, args).await,
        Commands::Streak => chronos::cli::streak(config).await,
        Commands::Week(args) => chronos::cli::week(config, args).await,
        Commands::Month(args) => chronos::cli::month(config, args).await,
        Commands::Year(args) => chronos::cli::year(config, args).await,
        Commands::Activity(args) => chronos::cli::activity(config, args).await,
    }
}

async fn migrate_command(config: chronos::Config) -> Result<()> {
    tracing::info!(url = %config.database.url, "Running database migrations...");

    let pool = chronos::db::create_write_pool(&config.database.url).await?;
    chronos::db::migrate(&pool).await?;

    tracing::info!("Migrations completed successfully");

    Ok(())
}
