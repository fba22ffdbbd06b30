use std::ops::Deref;

use chronos_shared::{BigThing, DailyPatch, DailyPlan, Fields, Habit, HabitLog};

use crate::{Daily, PlanEngine, PlanState, load_habits, log_fields, next_log};

/// Daily plans: never created for past dates, seeded with a zero log for
/// every habit and back-filled when habits are added later.
pub struct DailyEngine(PlanEngine<Daily>);

impl DailyEngine {
    pub fn new(engine: PlanEngine<Daily>) -> Self {
        Self(engine)
    }

    /// Resolves today's (or the viewed day's) plan. Without `habits` the
    /// signed-in user's catalog is loaded from the store.
    pub async fn ensure_plan(
        &self,
        habits: Option<&[Habit]>,
    ) -> chronos_shared::Result<Option<DailyPlan>> {
        let Some(uid) = self.user_id() else {
            return Ok(None);
        };

        let loaded;
        let habits = match habits {
            Some(habits) => habits,
            None => {
                loaded = load_habits(self.store().as_ref(), &uid).await?;
                loaded.as_slice()
            }
        };

        let state = self
            .ensure_with(|plan| {
                for habit in habits {
                    plan.habit_logs.insert(habit.id.to_owned(), HabitLog::default());
                }
            })
            .await?;

        if let PlanState::Persisted(plan) = &state {
            let missing = missing_logs(plan, habits)?;
            if !missing.is_empty() {
                tracing::debug!(id = %plan.id, count = missing.len(), "habit logs back-filled");
                self.update_fields(missing).await?;
            }
        }

        Ok(self.current_plan())
    }

    pub async fn set_big_thing(
        &self,
        text: impl Into<String>,
        completed: bool,
    ) -> chronos_shared::Result<()> {
        self.update_plan(&DailyPatch {
            big_thing: Some(BigThing {
                text: text.into(),
                completed,
            }),
            ..Default::default()
        })
        .await
    }

    /// Logs `habit` on the current plan. `amount` is ignored for checkbox
    /// habits. Does nothing while no plan is materialized.
    pub async fn log_habit(
        &self,
        habit: &Habit,
        amount: f64,
    ) -> chronos_shared::Result<Option<HabitLog>> {
        let Some(plan) = self.current_plan() else {
            return Ok(None);
        };

        let current = plan.habit_logs.get(&habit.id).copied();
        let log = next_log(current, habit.mode, habit.target(), amount);
        self.update_fields(log_fields(&habit.id, &log)?).await?;

        Ok(Some(log))
    }
}

impl Deref for DailyEngine {
    type Target = PlanEngine<Daily>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Dotted updates adding a zero log for every habit the plan does not know
/// yet. Existing entries are left alone.
fn missing_logs(plan: &DailyPlan, habits: &[Habit]) -> chronos_shared::Result<Fields> {
    let mut fields = Fields::new();

    for habit in habits {
        if plan.habit_logs.contains_key(&habit.id) {
            continue;
        }

        fields.extend(log_fields(&habit.id, &HabitLog::default())?);
    }

    Ok(fields)
}
