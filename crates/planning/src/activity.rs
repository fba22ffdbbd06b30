use std::collections::{BTreeMap, HashSet};

use chronos_shared::{
    Collection, DailyPlan, Filter, Habit, HabitMode, TypedDocument, format_date,
};
use chronos_store::DocumentStore;
use serde::Serialize;
use time::Date;

/// Heatmap cell for one day of a year.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DayActivity {
    pub date: String,
    /// Completion ratio, never negative.
    pub value: f64,
    pub label: String,
    pub total: usize,
}

#[derive(Clone, Copy, Debug)]
pub enum ActivityScope<'a> {
    /// Share of completed logs per day. Today's plan only counts habits that
    /// still exist.
    AllHabits(&'a [Habit]),
    Habit(&'a Habit),
}

/// One cell per day of `year` that has a plan, ordered by date. When several
/// plans share a date the highest value wins.
pub fn year_activity(
    plans: &[DailyPlan],
    year: i32,
    scope: ActivityScope<'_>,
    today: Date,
) -> Vec<DayActivity> {
    let prefix = format!("{year}-");
    let today = format_date(today).unwrap_or_default();
    let mut days: BTreeMap<&str, DayActivity> = BTreeMap::new();

    for plan in plans.iter().filter(|p| p.date.starts_with(&prefix)) {
        let activity = match scope {
            ActivityScope::Habit(habit) => habit_activity(plan, habit),
            ActivityScope::AllHabits(habits) => all_habits_activity(plan, habits, &today),
        };

        let better = days
            .get(plan.date.as_str())
            .is_none_or(|existing| activity.value > existing.value);

        if better {
            days.insert(plan.date.as_str(), activity);
        }
    }

    days.into_values().collect()
}

fn habit_activity(plan: &DailyPlan, habit: &Habit) -> DayActivity {
    let target = habit.daily_target.filter(|t| *t != 0.0).unwrap_or(1.0);
    let (value, label) = match (plan.habit_logs.get(&habit.id), habit.mode) {
        (None, _) => (0.0, "0".to_owned()),
        (Some(log), HabitMode::Quantifiable) => (log.value / target, format!("{}", log.value)),
        (Some(log), HabitMode::Checkbox) if log.completed => (1.0, "Done".to_owned()),
        (Some(_), HabitMode::Checkbox) => (0.0, "Missed".to_owned()),
    };

    DayActivity {
        date: plan.date.to_owned(),
        value: value.max(0.0),
        label,
        total: target as usize,
    }
}

fn all_habits_activity(plan: &DailyPlan, habits: &[Habit], today: &str) -> DayActivity {
    let active = habits.iter().map(|h| h.id.as_str()).collect::<HashSet<_>>();
    let logs = plan
        .habit_logs
        .iter()
        .filter(|(id, _)| plan.date != today || active.contains(id.as_str()))
        .map(|(_, log)| log)
        .collect::<Vec<_>>();

    if logs.is_empty() {
        return DayActivity {
            date: plan.date.to_owned(),
            value: 0.0,
            label: "0".to_owned(),
            total: 1,
        };
    }

    let completed = logs.iter().filter(|l| l.completed).count();

    DayActivity {
        date: plan.date.to_owned(),
        value: completed as f64 / logs.len() as f64,
        label: completed.to_string(),
        total: logs.len(),
    }
}

/// Loads the plans of `year` onwards with a range query and builds the
/// heatmap cells of that year.
pub async fn load_year_activity(
    store: &dyn DocumentStore,
    uid: &str,
    year: i32,
    scope: ActivityScope<'_>,
    today: Date,
) -> chronos_shared::Result<Vec<DayActivity>> {
    let docs = store
        .query(
            Collection::DailyPlans,
            &[
                Filter::eq("uid", uid),
                Filter::gte("date", format!("{year:04}-01-01")),
            ],
        )
        .await?;

    let plans = docs
        .into_iter()
        .map(DailyPlan::from_document)
        .collect::<chronos_shared::Result<Vec<_>>>()?;

    Ok(year_activity(&plans, year, scope, today))
}
