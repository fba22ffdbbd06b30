use serde::Serialize;

/// Resolution state of one plan.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "state", content = "plan", rename_all = "snake_case")]
pub enum PlanState<P> {
    /// No user signed in.
    Idle,
    /// Waiting on the store.
    Pending,
    /// Nothing stored for this key and nothing to create.
    Missing,
    /// Draft only kept in memory until the first edit writes it.
    Unsaved(P),
    /// Locked placeholder for a past period, never written.
    ReadOnly(P),
    Persisted(P),
}

impl<P> PlanState<P> {
    pub fn plan(&self) -> Option<&P> {
        match self {
            PlanState::Unsaved(plan) | PlanState::ReadOnly(plan) | PlanState::Persisted(plan) => {
                Some(plan)
            }
            PlanState::Idle | PlanState::Pending | PlanState::Missing => None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, PlanState::ReadOnly(_))
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, PlanState::Persisted(_))
    }

    pub(crate) fn is_materialized(&self) -> bool {
        self.plan().is_some()
    }

    /// Folds the store's authoritative result into the local state.
    ///
    /// A stored document always wins. Without one, in-memory placeholders
    /// stay as they are and anything else becomes [`PlanState::Missing`].
    pub fn merge_remote(self, remote: Option<P>) -> Self {
        match (self, remote) {
            (_, Some(plan)) => PlanState::Persisted(plan),
            (state @ (PlanState::Unsaved(_) | PlanState::ReadOnly(_)), None) => state,
            (_, None) => PlanState::Missing,
        }
    }
}

/// What an engine currently shows: the state resolved for one user and key.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PlanView<K, P> {
    pub uid: Option<String>,
    pub key: K,
    #[serde(flatten)]
    pub state: PlanState<P>,
}

impl<K: PartialEq, P> PlanView<K, P> {
    pub fn targets(&self, uid: &str, key: &K) -> bool {
        self.uid.as_deref() == Some(uid) && self.key == *key
    }
}
