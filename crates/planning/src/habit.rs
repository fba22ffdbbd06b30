use std::sync::{Arc, Mutex};

use chronos_shared::{
    Collection, Document, Error, Fields, Filter, Habit, HabitLog, HabitMode, SharedClock,
    TypedDocument,
};
use chronos_store::{DocumentStore, SharedStore, Subscription, next_snapshot};
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use validator::Validate;

/// Next log entry after one logging action.
///
/// Checkbox habits toggle and carry a value of 1 when done, 0 otherwise.
/// Quantifiable habits add `amount` (which may be negative) and complete once
/// the value reaches `target`. Completion is sticky: lowering the value never
/// clears it.
pub fn next_log(current: Option<HabitLog>, mode: HabitMode, target: f64, amount: f64) -> HabitLog {
    let current = current.unwrap_or_default();

    match mode {
        HabitMode::Checkbox => {
            let completed = !current.completed;
            HabitLog {
                completed,
                value: if completed { 1.0 } else { 0.0 },
            }
        }
        HabitMode::Quantifiable => {
            let value = current.value + amount;
            HabitLog {
                completed: current.completed || value >= target,
                value,
            }
        }
    }
}

/// Partial update touching only `habitLogs.<habit_id>`.
pub fn log_fields(habit_id: &str, log: &HabitLog) -> chronos_shared::Result<Fields> {
    let mut fields = Fields::new();
    fields.insert(format!("habitLogs.{habit_id}"), serde_json::to_value(log)?);

    Ok(fields)
}

/// Applies one logging action to a stored daily plan. Does nothing without a
/// plan id.
pub async fn log_habit(
    store: &dyn DocumentStore,
    plan_id: &str,
    habit_id: &str,
    current: Option<HabitLog>,
    mode: HabitMode,
    target: f64,
    amount: f64,
) -> chronos_shared::Result<Option<HabitLog>> {
    if plan_id.is_empty() {
        return Ok(None);
    }

    let log = next_log(current, mode, target, amount);
    store
        .update(Collection::DailyPlans, plan_id, log_fields(habit_id, &log)?)
        .await?;

    Ok(Some(log))
}

#[derive(Validate, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct HabitInput {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[serde(default)]
    pub mode: HabitMode,
    #[validate(range(min = 0.0))]
    pub daily_target: Option<f64>,
    #[validate(range(min = 0.0))]
    pub increment: Option<f64>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub frequency: Vec<u8>,
}

#[derive(Validate, Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct HabitPatch {
    #[validate(length(min = 1, max = 80))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<HabitMode>,
    #[validate(range(min = 0.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_target: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The signed-in user's habit definitions.
pub struct HabitCatalog {
    inner: Arc<CatalogInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct CatalogInner {
    store: SharedStore,
    clock: SharedClock,
    users: watch::Receiver<Option<String>>,
    habits: watch::Sender<Vec<Habit>>,
}

impl HabitCatalog {
    pub fn new(
        store: SharedStore,
        clock: SharedClock,
        users: watch::Receiver<Option<String>>,
    ) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                store,
                clock,
                users,
                habits: watch::channel(vec![]).0,
            }),
            task: Mutex::new(None),
        }
    }

    /// Live list kept up to date once [`Self::start`] ran.
    pub fn habits(&self) -> watch::Receiver<Vec<Habit>> {
        self.inner.habits.subscribe()
    }

    pub fn current_habits(&self) -> Vec<Habit> {
        self.inner.habits.borrow().clone()
    }

    pub async fn list(&self) -> chronos_shared::Result<Vec<Habit>> {
        let Some(uid) = self.inner.users.borrow().clone() else {
            return Ok(vec![]);
        };

        load_habits(self.inner.store.as_ref(), &uid).await
    }

    pub async fn add(&self, input: HabitInput) -> chronos_shared::Result<Habit> {
        input.validate()?;

        let Some(uid) = self.inner.users.borrow().clone() else {
            return Err(Error::Unauthenticated);
        };

        let created_at = self.inner.clock.now().unix_timestamp_nanos() / 1_000_000;
        let mut habit = Habit {
            id: String::default(),
            uid,
            name: input.name,
            mode: input.mode,
            daily_target: input.daily_target,
            increment: input.increment,
            unit: input.unit,
            description: input.description,
            color: input.color,
            time_of_day: input.time_of_day,
            frequency: input.frequency,
            created_at: i64::try_from(created_at).unwrap_or(i64::MAX),
        };

        let id = self
            .inner
            .store
            .create(Collection::Habits, habit.to_fields()?)
            .await?;
        tracing::info!(id = %id, name = %habit.name, "habit added");

        habit.set_id(id);

        Ok(habit)
    }

    pub async fn update(&self, id: &str, patch: HabitPatch) -> chronos_shared::Result<()> {
        patch.validate()?;

        if self.owned(id).await?.is_none() {
            return Ok(());
        }

        self.inner
            .store
            .update(Collection::Habits, id, chronos_shared::to_fields(&patch)?)
            .await
    }

    pub async fn remove(&self, id: &str) -> chronos_shared::Result<()> {
        if self.owned(id).await?.is_none() {
            return Ok(());
        }

        self.inner.store.delete(Collection::Habits, id).await?;
        tracing::info!(id, "habit removed");

        Ok(())
    }

    /// The habit when it belongs to the signed-in user. `None` when signed out.
    async fn owned(&self, id: &str) -> chronos_shared::Result<Option<Habit>> {
        let Some(uid) = self.inner.users.borrow().clone() else {
            return Ok(None);
        };

        match load_habits(self.inner.store.as_ref(), &uid)
            .await?
            .into_iter()
            .find(|h| h.id == id)
        {
            Some(habit) => Ok(Some(habit)),
            None => chronos_shared::not_found!("habit {id}"),
        }
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

impl Drop for HabitCatalog {
    fn drop(&mut self) {
        self.stop();
    }
}

impl CatalogInner {
    async fn run(self: Arc<Self>) {
        let mut users = self.users.clone();

        loop {
            let uid = users.borrow_and_update().clone();
            let mut subscription = match &uid {
                Some(uid) => Some(Subscription::spawn(
                    self.store.clone(),
                    Collection::Habits,
                    vec![Filter::eq("uid", uid.as_str())],
                )),
                None => {
                    self.habits.send_replace(vec![]);
                    None
                }
            };

            loop {
                tokio::select! {
                    res = users.changed() => {
                        if res.is_err() {
                            return;
                        }
                        break;
                    }
                    docs = next_snapshot(&mut subscription) => {
                        match decode_habits(docs) {
                            Ok(habits) => {
                                self.habits.send_replace(habits);
                            }
                            Err(err) => tracing::warn!("invalid habit document: {err}"),
                        }
                    }
                }
            }
        }
    }
}

/// Every habit of `uid`, oldest first.
pub async fn load_habits(store: &dyn DocumentStore, uid: &str) -> chronos_shared::Result<Vec<Habit>> {
    let docs = store
        .query(Collection::Habits, &[Filter::eq("uid", uid)])
        .await?;

    decode_habits(docs)
}

fn decode_habits(docs: Vec<Document>) -> chronos_shared::Result<Vec<Habit>> {
    let mut habits = docs
        .into_iter()
        .map(Habit::from_document)
        .collect::<chronos_shared::Result<Vec<_>>>()?;
    habits.sort_by_key(|h| h.created_at);

    Ok(habits)
}
