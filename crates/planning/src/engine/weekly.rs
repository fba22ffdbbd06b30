use std::ops::Deref;

use chronos_shared::{Goal, WeeklyPatch, WeeklyPlan};
use ulid::Ulid;

use crate::{PlanEngine, PlanState, Weekly};

/// Weekly plans, with the legacy single `focus` folded into `goals`.
pub struct WeeklyEngine(PlanEngine<Weekly>);

impl WeeklyEngine {
    pub fn new(engine: PlanEngine<Weekly>) -> Self {
        Self(engine)
    }

    pub async fn ensure_plan(&self) -> chronos_shared::Result<Option<WeeklyPlan>> {
        let state = self.ensure_with(|_| {}).await?;

        let PlanState::Persisted(plan) = &state else {
            return Ok(self.current_plan());
        };

        if let Some(patch) = migrate_focus(plan) {
            tracing::info!(id = %plan.id, "weekly focus migrated to goals");
            self.update_plan(&patch).await?;
        }

        Ok(self.current_plan())
    }
}

impl Deref for WeeklyEngine {
    type Target = PlanEngine<Weekly>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rewrite for a plan that still carries a legacy focus and no goals.
fn migrate_focus(plan: &WeeklyPlan) -> Option<WeeklyPatch> {
    if plan.focus.trim().is_empty() || !plan.goals.is_empty() {
        return None;
    }

    Some(WeeklyPatch {
        focus: Some(String::new()),
        goals: Some(vec![Goal::new(Ulid::new().to_string(), plan.focus.to_owned())]),
        blocks: None,
    })
}
