use std::fmt::{self, Debug, Display};

use chronos_shared::{
    AnnualPatch, AnnualPlan, Collection, DailyPatch, DailyPlan, Filter, MonthlyPatch, MonthlyPlan,
    TypedDocument, WeeklyPatch, WeeklyPlan, format_date, iso_week, iso_weeks_in_year,
    month_index,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumString};
use time::Date;

/// Where weekly navigation wraps to the next year.
#[derive(
    Serialize, Deserialize, EnumString, StrumDisplay, AsRefStr, Clone, Copy, Debug, Default, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeekWrap {
    /// Always wraps after week 52, ignoring 53-week ISO years.
    #[default]
    Fixed,
    Iso,
}

impl WeekWrap {
    pub fn last_week(self, year: i32) -> u8 {
        match self {
            WeekWrap::Fixed => 52,
            WeekWrap::Iso => iso_weeks_in_year(year),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    /// 0-11
    pub month: u8,
}

impl MonthKey {
    pub fn new(year: i32, month: u8) -> Self {
        Self { year, month }
    }

    pub fn of(date: Date) -> Self {
        Self::new(date.year(), month_index(date))
    }

    pub fn prev(self) -> Self {
        match self.month {
            0 => Self::new(self.year - 1, 11),
            month => Self::new(self.year, month - 1),
        }
    }

    pub fn next(self) -> Self {
        match self.month {
            11.. => Self::new(self.year + 1, 0),
            month => Self::new(self.year, month + 1),
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month + 1)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub year: i32,
    /// ISO-8601 week number, 1-based.
    pub week: u8,
}

impl WeekKey {
    pub fn new(year: i32, week: u8) -> Self {
        Self { year, week }
    }

    /// Calendar year paired with the ISO week of `date`.
    pub fn of(date: Date) -> Self {
        Self::new(date.year(), iso_week(date))
    }

    pub fn prev(self, wrap: WeekWrap) -> Self {
        if self.week <= 1 {
            let year = self.year - 1;
            return Self::new(year, wrap.last_week(year));
        }

        Self::new(self.year, self.week - 1)
    }

    pub fn next(self, wrap: WeekWrap) -> Self {
        if self.week >= wrap.last_week(self.year) {
            return Self::new(self.year + 1, 1);
        }

        Self::new(self.year, self.week + 1)
    }
}

impl Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// What resolution does when no document matches a period key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Absence {
    /// Write a new document with empty defaults.
    Create,
    /// Keep an in-memory draft that is written on the first edit.
    Unsaved,
    /// Keep an in-memory locked placeholder that is never written.
    ReadOnly,
    /// Resolve to nothing.
    Skip,
}

/// One planning horizon: how its key maps to a document and how the past is
/// treated.
pub trait Period: Send + Sync + 'static {
    type Key: Clone + Debug + Display + PartialEq + Send + Sync + 'static;
    type Plan: TypedDocument;
    type Patch: Serialize + Send + Sync;

    fn collection() -> Collection {
        <Self::Plan as TypedDocument>::COLLECTION
    }

    fn filters(uid: &str, key: &Self::Key) -> chronos_shared::Result<Vec<Filter>>;

    /// Empty plan for `key`, without an id.
    fn draft(uid: &str, key: &Self::Key) -> chronos_shared::Result<Self::Plan>;

    fn is_past(key: &Self::Key, today: Date) -> bool;

    fn absence(key: &Self::Key, today: Date) -> Absence;
}

pub struct Annual;

impl Period for Annual {
    type Key = i32;
    type Plan = AnnualPlan;
    type Patch = AnnualPatch;

    fn filters(uid: &str, year: &i32) -> chronos_shared::Result<Vec<Filter>> {
        Ok(vec![Filter::eq("uid", uid), Filter::eq("year", *year)])
    }

    fn draft(uid: &str, year: &i32) -> chronos_shared::Result<AnnualPlan> {
        Ok(AnnualPlan {
            uid: uid.to_owned(),
            year: *year,
            ..Default::default()
        })
    }

    fn is_past(_year: &i32, _today: Date) -> bool {
        false
    }

    fn absence(_year: &i32, _today: Date) -> Absence {
        Absence::Unsaved
    }
}

/// Display-only lock for annual views. Annual resolution never applies it.
pub fn is_past_year(year: i32, today: Date) -> bool {
    year < today.year()
}

pub struct Monthly;

impl Period for Monthly {
    type Key = MonthKey;
    type Plan = MonthlyPlan;
    type Patch = MonthlyPatch;

    fn filters(uid: &str, key: &MonthKey) -> chronos_shared::Result<Vec<Filter>> {
        Ok(vec![
            Filter::eq("uid", uid),
            Filter::eq("year", key.year),
            Filter::eq("month", key.month),
        ])
    }

    fn draft(uid: &str, key: &MonthKey) -> chronos_shared::Result<MonthlyPlan> {
        Ok(MonthlyPlan {
            uid: uid.to_owned(),
            year: key.year,
            month: key.month,
            ..Default::default()
        })
    }

    fn is_past(key: &MonthKey, today: Date) -> bool {
        let current = MonthKey::of(today);
        key.year < current.year || (key.year == current.year && key.month < current.month)
    }

    fn absence(key: &MonthKey, today: Date) -> Absence {
        if Self::is_past(key, today) {
            Absence::ReadOnly
        } else {
            Absence::Create
        }
    }
}

pub struct Weekly;

impl Period for Weekly {
    type Key = WeekKey;
    type Plan = WeeklyPlan;
    type Patch = WeeklyPatch;

    fn filters(uid: &str, key: &WeekKey) -> chronos_shared::Result<Vec<Filter>> {
        Ok(vec![
            Filter::eq("uid", uid),
            Filter::eq("year", key.year),
            Filter::eq("week", key.week),
        ])
    }

    fn draft(uid: &str, key: &WeekKey) -> chronos_shared::Result<WeeklyPlan> {
        Ok(WeeklyPlan {
            uid: uid.to_owned(),
            year: key.year,
            week: key.week,
            ..Default::default()
        })
    }

    fn is_past(key: &WeekKey, today: Date) -> bool {
        let current = WeekKey::of(today);
        key.year < current.year || (key.year == current.year && key.week < current.week)
    }

    fn absence(key: &WeekKey, today: Date) -> Absence {
        if Self::is_past(key, today) {
            Absence::ReadOnly
        } else {
            Absence::Create
        }
    }
}

pub struct Daily;

impl Period for Daily {
    type Key = Date;
    type Plan = DailyPlan;
    type Patch = DailyPatch;

    fn filters(uid: &str, date: &Date) -> chronos_shared::Result<Vec<Filter>> {
        Ok(vec![Filter::eq("uid", uid), Filter::eq("date", format_date(*date)?)])
    }

    fn draft(uid: &str, date: &Date) -> chronos_shared::Result<DailyPlan> {
        Ok(DailyPlan {
            uid: uid.to_owned(),
            date: format_date(*date)?,
            ..Default::default()
        })
    }

    fn is_past(date: &Date, today: Date) -> bool {
        *date < today
    }

    fn absence(date: &Date, today: Date) -> Absence {
        if Self::is_past(date, today) {
            Absence::Skip
        } else {
            Absence::Create
        }
    }
}
