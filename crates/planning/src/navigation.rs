use chronos_shared::SharedClock;
use time::Date;
use tokio::sync::watch;

use crate::{MonthKey, WeekKey, WeekWrap};

/// Observable value that only notifies when it actually changes.
pub struct Cursor<T>(watch::Sender<T>);

impl<T: Clone + PartialEq + Send + Sync> Cursor<T> {
    pub fn new(value: T) -> Self {
        Self(watch::channel(value).0)
    }

    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: T) {
        self.0.send_if_modified(|current| {
            if *current == value {
                return false;
            }

            *current = value;
            true
        });
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.get());
        self.set(next);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.0.subscribe()
    }
}

/// Per-page view cursors. Each period type steps independently so moving
/// one page never shifts another.
pub struct Navigation {
    clock: SharedClock,
    week_wrap: WeekWrap,
    daily: Cursor<Date>,
    annual: Cursor<i32>,
    monthly: Cursor<MonthKey>,
    weekly: Cursor<WeekKey>,
}

impl Navigation {
    pub fn new(clock: SharedClock, week_wrap: WeekWrap) -> Self {
        let today = clock.today();

        Self {
            clock,
            week_wrap,
            daily: Cursor::new(today),
            annual: Cursor::new(today.year()),
            monthly: Cursor::new(MonthKey::of(today)),
            weekly: Cursor::new(WeekKey::of(today)),
        }
    }

    pub fn daily(&self) -> &Cursor<Date> {
        &self.daily
    }

    pub fn annual(&self) -> &Cursor<i32> {
        &self.annual
    }

    pub fn monthly(&self) -> &Cursor<MonthKey> {
        &self.monthly
    }

    pub fn weekly(&self) -> &Cursor<WeekKey> {
        &self.weekly
    }

    pub fn view_date(&self) -> Date {
        self.daily.get()
    }

    pub fn prev_day(&self) {
        self.daily.update(|date| date.previous_day().unwrap_or(*date));
    }

    pub fn next_day(&self) {
        self.daily.update(|date| date.next_day().unwrap_or(*date));
    }

    pub fn reset_daily_view(&self) {
        self.daily.set(self.clock.today());
    }

    pub fn annual_view_year(&self) -> i32 {
        self.annual.get()
    }

    pub fn prev_year(&self) {
        self.annual.update(|year| year - 1);
    }

    pub fn next_year(&self) {
        self.annual.update(|year| year + 1);
    }

    pub fn monthly_view(&self) -> MonthKey {
        self.monthly.get()
    }

    pub fn prev_month(&self) {
        self.monthly.update(|key| key.prev());
    }

    pub fn next_month(&self) {
        self.monthly.update(|key| key.next());
    }

    pub fn reset_monthly_view(&self) {
        self.monthly.set(MonthKey::of(self.clock.today()));
    }

    pub fn weekly_view(&self) -> WeekKey {
        self.weekly.get()
    }

    pub fn prev_week(&self) {
        let wrap = self.week_wrap;
        self.weekly.update(|key| key.prev(wrap));
    }

    pub fn next_week(&self) {
        let wrap = self.week_wrap;
        self.weekly.update(|key| key.next(wrap));
    }

    pub fn reset_weekly_view(&self) {
        self.weekly.set(WeekKey::of(self.clock.today()));
    }
}
