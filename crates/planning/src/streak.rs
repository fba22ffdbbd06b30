use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chronos_shared::{
    Collection, DailyPlan, Document, Filter, SharedClock, TypedDocument, format_date,
};
use chronos_store::{DocumentStore, SharedStore, Subscription, next_snapshot};
use time::Date;
use tokio::{sync::watch, task::JoinHandle};

/// Consecutive fully completed days ending yesterday. Today never counts,
/// and the walk stops at the first day without a plan or with an
/// incomplete one.
pub fn current_streak(plans: &[DailyPlan], today: Date) -> u32 {
    let mut sorted = plans.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut by_date = HashMap::with_capacity(sorted.len());
    for plan in sorted {
        by_date.entry(plan.date.as_str()).or_insert(plan);
    }

    let mut streak = 0;
    let mut day = today.previous_day();

    while let Some(date) = day {
        let Ok(key) = format_date(date) else {
            break;
        };

        match by_date.get(key.as_str()) {
            Some(plan) if plan.is_fully_completed() => {
                streak += 1;
                day = date.previous_day();
            }
            _ => break,
        }
    }

    streak
}

/// One-shot streak over every daily plan of `uid`.
pub async fn compute_streak(
    store: &dyn DocumentStore,
    uid: &str,
    today: Date,
) -> chronos_shared::Result<u32> {
    let docs = store
        .query(Collection::DailyPlans, &[Filter::eq("uid", uid)])
        .await?;

    Ok(current_streak(&decode_plans(docs)?, today))
}

fn decode_plans(docs: Vec<Document>) -> chronos_shared::Result<Vec<DailyPlan>> {
    docs.into_iter().map(DailyPlan::from_document).collect()
}

/// Keeps the signed-in user's streak up to date from a live subscription on
/// their daily plans.
pub struct StreakTracker {
    inner: Arc<TrackerInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct TrackerInner {
    store: SharedStore,
    clock: SharedClock,
    users: watch::Receiver<Option<String>>,
    streak: watch::Sender<u32>,
}

impl StreakTracker {
    pub fn new(
        store: SharedStore,
        clock: SharedClock,
        users: watch::Receiver<Option<String>>,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                store,
                clock,
                users,
                streak: watch::channel(0).0,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn current_streak(&self) -> u32 {
        *self.inner.streak.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<u32> {
        self.inner.streak.subscribe()
    }

    pub fn start(&self) {
        let Ok(mut task) = self.task.lock() else {
            return;
        };

        if task.is_some() {
            return;
        }

        let inner = self.inner.clone();
        *task = Some(tokio::spawn(inner.run()));
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().ok().and_then(|mut t| t.take()) {
            task.abort();
        }
    }
}

impl Drop for StreakTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl TrackerInner {
    async fn run(self: Arc<Self>) {
        let mut users = self.users.clone();

        loop {
            let uid = users.borrow_and_update().clone();
            let mut subscription = uid.as_deref().map(|uid| {
                Subscription::spawn(
                    self.store.clone(),
                    Collection::DailyPlans,
                    vec![Filter::eq("uid", uid)],
                )
            });

            if subscription.is_none() {
                self.streak.send_replace(0);
            }

            loop {
                tokio::select! {
                    res = users.changed() => {
                        if res.is_err() {
                            return;
                        }
                        break;
                    }
                    docs = next_snapshot(&mut subscription) => {
                        match decode_plans(docs) {
                            Ok(plans) => {
                                let streak = current_streak(&plans, self.clock.today());
                                self.streak.send_if_modified(|current| {
                                    let changed = *current != streak;
                                    *current = streak;
                                    changed
                                });
                            }
                            Err(err) => tracing::warn!("invalid daily plan document: {err}"),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chronos_shared::{BigThing, HabitLog};
    use time::macros::date;

    use super::*;

    fn plan(date: &str, completed: bool) -> DailyPlan {
        DailyPlan {
            date: date.to_owned(),
            big_thing: BigThing {
                text: String::new(),
                completed,
            },
            ..Default::default()
        }
    }

    #[test]
    fn counts_back_from_yesterday() {
        let plans = [
            plan("2024-01-10", true),
            plan("2024-01-09", true),
            plan("2024-01-08", false),
        ];

        assert_eq!(current_streak(&plans, date!(2024 - 01 - 11)), 2);
    }

    #[test]
    fn missing_yesterday_breaks_the_streak() {
        let plans = [plan("2024-01-09", true)];

        assert_eq!(current_streak(&plans, date!(2024 - 01 - 11)), 0);
        assert_eq!(current_streak(&[], date!(2024 - 01 - 11)), 0);
    }

    #[test]
    fn today_is_not_counted() {
        let plans = [plan("2024-01-11", true), plan("2024-01-10", true)];

        assert_eq!(current_streak(&plans, date!(2024 - 01 - 11)), 1);
    }

    #[test]
    fn unsorted_history_across_month_boundary() {
        let plans = [
            plan("2024-02-29", true),
            plan("2024-03-01", true),
            plan("2024-02-27", true),
            plan("2024-02-28", true),
        ];

        assert_eq!(current_streak(&plans, date!(2024 - 03 - 02)), 4);
    }

    #[test]
    fn habits_must_be_done_for_a_day_to_count() {
        let mut yesterday = plan("2024-01-10", true);
        yesterday
            .habit_logs
            .insert("h1".to_owned(), HabitLog { completed: false, value: 0.0 });

        assert_eq!(current_streak(&[yesterday.clone()], date!(2024 - 01 - 11)), 0);

        yesterday
            .habit_logs
            .insert("h1".to_owned(), HabitLog { completed: false, value: 2.0 });
        assert_eq!(current_streak(&[yesterday], date!(2024 - 01 - 11)), 1);
    }
}
