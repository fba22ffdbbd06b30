use std::sync::Arc;

use chronos_planning::{
    AnnualEngine, DailyEngine, HabitCatalog, Identity, MonthlyEngine, Navigation, PlanEngine,
    StreakTracker, WeeklyEngine,
};
use chronos_shared::{SharedClock, SystemClock};
use chronos_store::{SharedStore, SqliteStore};

use crate::config::Config;

/// Composition root: one identity, one set of navigation cursors and one
/// engine per period type sharing a store.
pub struct App {
    pub identity: Identity,
    pub navigation: Navigation,
    pub store: SharedStore,
    pub clock: SharedClock,
    pub daily: DailyEngine,
    pub weekly: WeeklyEngine,
    pub monthly: MonthlyEngine,
    pub annual: AnnualEngine,
    pub habits: HabitCatalog,
    pub streak: StreakTracker,
}

impl App {
    pub fn new(config: &Config, store: SharedStore, clock: SharedClock) -> Self {
        let identity = match config.user.id.as_deref() {
            Some(uid) => Identity::signed_in(uid),
            None => Identity::new(),
        };
        let navigation = Navigation::new(clock.clone(), config.planning.week_wrap);
        let sync = &config.sync;

        let daily = DailyEngine::new(PlanEngine::new(
            store.clone(),
            clock.clone(),
            identity.subscribe(),
            navigation.daily().subscribe(),
            sync.daily,
        ));
        let weekly = WeeklyEngine::new(PlanEngine::new(
            store.clone(),
            clock.clone(),
            identity.subscribe(),
            navigation.weekly().subscribe(),
            sync.weekly,
        ));
        let monthly = PlanEngine::new(
            store.clone(),
            clock.clone(),
            identity.subscribe(),
            navigation.monthly().subscribe(),
            sync.monthly,
        );
        let annual = PlanEngine::new(
            store.clone(),
            clock.clone(),
            identity.subscribe(),
            navigation.annual().subscribe(),
            sync.annual,
        );
        let habits = HabitCatalog::new(store.clone(), clock.clone(), identity.subscribe());
        let streak = StreakTracker::new(store.clone(), clock.clone(), identity.subscribe());

        Self {
            identity,
            navigation,
            store,
            clock,
            daily,
            weekly,
            monthly,
            annual,
            habits,
            streak,
        }
    }

    /// Opens the configured SQLite database with separate read and write
    /// pools and a clock in the configured time zone.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let write_db = crate::db::create_write_pool(&config.database.url).await?;
        crate::db::migrate(&write_db).await?;
        let read_db =
            crate::db::create_read_pool(&config.database.url, config.database.max_connections)
                .await?;

        let store: SharedStore = Arc::new(SqliteStore::new(read_db, write_db));
        let clock: SharedClock = Arc::new(SystemClock::new(&config.user.timezone));

        Ok(Self::new(config, store, clock))
    }

    pub fn start(&self) {
        self.daily.start();
        self.weekly.start();
        self.monthly.start();
        self.annual.start();
        self.habits.start();
        self.streak.start();

        tracing::debug!("App started");
    }

    pub fn stop(&self) {
        self.daily.stop();
        self.weekly.stop();
        self.monthly.stop();
        self.annual.stop();
        self.habits.stop();
        self.streak.stop();

        tracing::debug!("App stopped");
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop();
    }
}
