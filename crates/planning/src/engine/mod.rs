mod daily;
mod state;
mod weekly;

pub use daily::*;
pub use state::*;
pub use weekly::*;

use std::sync::{Arc, Mutex};

use chronos_shared::{
    Document, Error, Fields, READ_ONLY_ID, SharedClock, TypedDocument, UNSAVED_ID,
};
use chronos_store::{SharedStore, Subscription, next_snapshot};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tokio::{sync::watch, task::JoinHandle};

use crate::{Absence, Annual, Monthly, Period};

/// How an engine keeps its materialized plan in sync with the store.
#[derive(Serialize, Deserialize, EnumString, Display, AsRefStr, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncMode {
    /// Subscribe to the current key and replace the local copy on every change.
    Live,
    /// Resolve once per cursor or user change and rely on local updates in between.
    Once,
}

pub type AnnualEngine = PlanEngine<Annual>;
pub type MonthlyEngine = PlanEngine<Monthly>;

/// Resolves the cursor of one period type to its plan document.
pub struct PlanEngine<K: Period> {
    inner: Arc<Inner<K>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Inner<K: Period> {
    store: SharedStore,
    clock: SharedClock,
    users: watch::Receiver<Option<String>>,
    cursor: watch::Receiver<K::Key>,
    view: watch::Sender<PlanView<K::Key, K::Plan>>,
    // Serializes resolution and the unsaved -> persisted transition.
    guard: tokio::sync::Mutex<()>,
    mode: SyncMode,
}

enum LocalWrite {
    Write(String),
    Promote,
    Nothing,
}

impl<K: Period> PlanEngine<K> {
    pub fn new(
        store: SharedStore,
        clock: SharedClock,
        users: watch::Receiver<Option<String>>,
        cursor: watch::Receiver<K::Key>,
        mode: SyncMode,
    ) -> Self {
        let uid = users.borrow().clone();
        let key = cursor.borrow().clone();
        let state = if uid.is_some() {
            PlanState::Pending
        } else {
            PlanState::Idle
        };
        let (view, _) = watch::channel(PlanView { uid, key, state });

        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                users,
                cursor,
                view,
                guard: tokio::sync::Mutex::new(()),
                mode,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.inner.mode
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.users.borrow().clone()
    }

    pub fn key(&self) -> K::Key {
        self.inner.cursor.borrow().clone()
    }

    pub(crate) fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    /// Materialized plan for the current user and cursor, `None` while
    /// unresolved, signed out or when no plan applies.
    pub fn current_plan(&self) -> Option<K::Plan> {
        self.current_state().plan().cloned()
    }

    pub fn current_state(&self) -> PlanState<K::Plan> {
        let (Some(uid), key) = self.inner.target() else {
            return PlanState::Idle;
        };

        let view = self.inner.view.borrow();
        if !view.targets(&uid, &key) {
            return PlanState::Pending;
        }

        view.state.clone()
    }

    pub fn watch(&self) -> watch::Receiver<PlanView<K::Key, K::Plan>> {
        self.inner.view.subscribe()
    }

    pub fn is_past_period(&self) -> bool {
        K::is_past(&self.key(), self.inner.clock.today())
    }

    /// Resolves the current key, creating the plan when the period allows it.
    /// Idempotent: a key that is already materialized is returned as is.
    pub async fn ensure_plan(&self) -> chronos_shared::Result<Option<K::Plan>> {
        let state = self.ensure_with(|_| {}).await?;

        Ok(state.plan().cloned())
    }

    /// Same as [`Self::ensure_plan`], `seed` fills a draft right before it is
    /// created in the store.
    pub(crate) async fn ensure_with(
        &self,
        seed: impl FnOnce(&mut K::Plan) + Send,
    ) -> chronos_shared::Result<PlanState<K::Plan>> {
        let (Some(uid), key) = self.inner.target() else {
            return Ok(PlanState::Idle);
        };

        let _guard = self.inner.guard.lock().await;
        self.inner.resolve(&uid, &key, true, seed).await
    }

    /// Optimistically merges `patch` into the local copy, then persists it.
    pub async fn update_plan(&self, patch: &K::Patch) -> chronos_shared::Result<()> {
        self.update_fields(chronos_shared::to_fields(patch)?).await
    }

    /// Partial update with dotted-path keys. Placeholders of past periods
    /// reject writes; an unsaved draft is created exactly once.
    pub async fn update_fields(&self, fields: Fields) -> chronos_shared::Result<()> {
        let (Some(uid), key) = self.inner.target() else {
            return Ok(());
        };

        match self.inner.merge_local(&uid, &key, &fields)? {
            LocalWrite::Write(id) => self.inner.persist(&id, fields).await,
            LocalWrite::Nothing => Ok(()),
            LocalWrite::Promote => {
                let _guard = self.inner.guard.lock().await;

                // Another writer may have promoted the draft while we waited.
                match self.inner.merge_local(&uid, &key, &fields)? {
                    LocalWrite::Write(id) => self.inner.persist(&id, fields).await,
                    LocalWrite::Promote => self.inner.promote(&uid, &key, &fields).await,
                    LocalWrite::Nothing => Ok(()),
                }
            }
        }
    }

    /// Starts following user and cursor changes.
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

impl<K: Period> Drop for PlanEngine<K> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<K: Period> Inner<K> {
    fn target(&self) -> (Option<String>, K::Key) {
        let uid = self.users.borrow().clone();
        let key = self.cursor.borrow().clone();

        (uid, key)
    }

    fn is_target(&self, uid: &str, key: &K::Key) -> bool {
        let (current_uid, current_key) = self.target();

        current_uid.as_deref() == Some(uid) && current_key == *key
    }

    async fn resolve(
        &self,
        uid: &str,
        key: &K::Key,
        create: bool,
        seed: impl FnOnce(&mut K::Plan) + Send,
    ) -> chronos_shared::Result<PlanState<K::Plan>> {
        {
            let view = self.view.borrow();
            if view.targets(uid, key) && view.state.is_materialized() {
                return Ok(view.state.clone());
            }
        }

        let collection = K::collection();
        let docs = self.store.query(collection, &K::filters(uid, key)?).await?;

        let state = match docs.into_iter().next() {
            Some(doc) => {
                tracing::debug!(%collection, %key, id = %doc.id, "plan adopted");
                PlanState::Persisted(<K::Plan>::from_document(doc)?)
            }
            None => match K::absence(key, self.clock.today()) {
                Absence::Create if create => {
                    let mut draft = K::draft(uid, key)?;
                    seed(&mut draft);

                    let id = self.store.create(collection, draft.to_fields()?).await?;
                    tracing::info!(%collection, %key, id, "plan created");

                    draft.set_id(id);
                    PlanState::Persisted(draft)
                }
                Absence::Create | Absence::Skip => PlanState::Missing,
                Absence::Unsaved => {
                    let mut draft = K::draft(uid, key)?;
                    draft.set_id(UNSAVED_ID.to_owned());
                    PlanState::Unsaved(draft)
                }
                Absence::ReadOnly => {
                    let mut draft = K::draft(uid, key)?;
                    draft.set_id(READ_ONLY_ID.to_owned());
                    PlanState::ReadOnly(draft)
                }
            },
        };

        self.publish(uid, key, state.clone());

        Ok(state)
    }

    /// Replaces the view when it still matches the current user and cursor.
    /// Results for a key the user navigated away from are dropped.
    fn publish(&self, uid: &str, key: &K::Key, state: PlanState<K::Plan>) -> bool {
        if !self.is_target(uid, key) {
            tracing::debug!(collection = %K::collection(), %key, "stale plan dropped");
            return false;
        }

        let next = PlanView {
            uid: Some(uid.to_owned()),
            key: key.clone(),
            state,
        };

        self.view.send_if_modified(|view| {
            if *view == next {
                return false;
            }

            *view = next;
            true
        })
    }

    /// Points the view at a new target without discarding a copy it already
    /// holds for that target.
    fn retarget(&self, uid: Option<&str>, key: &K::Key) {
        self.view.send_if_modified(|view| {
            if uid.is_some_and(|uid| view.targets(uid, key)) {
                return false;
            }

            *view = PlanView {
                uid: uid.map(str::to_owned),
                key: key.clone(),
                state: if uid.is_some() {
                    PlanState::Pending
                } else {
                    PlanState::Idle
                },
            };
            true
        });
    }

    fn apply_remote(&self, uid: &str, key: &K::Key, docs: Vec<Document>) {
        let remote = match docs.into_iter().next().map(<K::Plan>::from_document).transpose() {
            Ok(remote) => remote,
            Err(err) => {
                tracing::warn!(collection = %K::collection(), %key, "invalid plan document: {err}");
                return;
            }
        };

        let current = {
            let view = self.view.borrow();
            if view.targets(uid, key) {
                view.state.clone()
            } else {
                PlanState::Pending
            }
        };

        self.publish(uid, key, current.merge_remote(remote));
    }

    fn merge_local(
        &self,
        uid: &str,
        key: &K::Key,
        fields: &Fields,
    ) -> chronos_shared::Result<LocalWrite> {
        let mut res = Ok(LocalWrite::Nothing);

        self.view.send_if_modified(|view| {
            if !view.targets(uid, key) {
                return false;
            }

            match &mut view.state {
                PlanState::Persisted(plan) => match plan.merge_fields(fields) {
                    Ok(()) => {
                        res = Ok(LocalWrite::Write(plan.id().to_owned()));
                        true
                    }
                    Err(err) => {
                        res = Err(err);
                        false
                    }
                },
                PlanState::Unsaved(_) => {
                    res = Ok(LocalWrite::Promote);
                    false
                }
                PlanState::ReadOnly(_) => {
                    res = Err(Error::ReadOnly(format!("{} {key}", K::collection())));
                    false
                }
                PlanState::Idle | PlanState::Pending | PlanState::Missing => false,
            }
        });

        res
    }

    async fn persist(&self, id: &str, fields: Fields) -> chronos_shared::Result<()> {
        self.store.update(K::collection(), id, fields).await
    }

    /// Writes an unsaved draft with `fields` applied and adopts the new id.
    /// Runs under the guard.
    async fn promote(
        &self,
        uid: &str,
        key: &K::Key,
        fields: &Fields,
    ) -> chronos_shared::Result<()> {
        let draft = {
            let view = self.view.borrow();
            match (&view.state, view.targets(uid, key)) {
                (PlanState::Unsaved(draft), true) => draft.clone(),
                _ => return Ok(()),
            }
        };

        let mut plan = draft;
        plan.merge_fields(fields)?;
        self.publish(uid, key, PlanState::Unsaved(plan.clone()));

        let collection = K::collection();
        let id = self.store.create(collection, plan.to_fields()?).await?;
        tracing::info!(%collection, %key, id, "unsaved plan promoted");

        plan.set_id(id);
        self.publish(uid, key, PlanState::Persisted(plan));

        Ok(())
    }

    async fn run(self: Arc<Self>) {
        let mut users = self.users.clone();
        let mut cursor = self.cursor.clone();

        loop {
            let uid = users.borrow_and_update().clone();
            let key = cursor.borrow_and_update().clone();
            self.retarget(uid.as_deref(), &key);

            let mut subscription = match (&uid, self.mode) {
                (None, _) => None,
                (Some(uid), SyncMode::Live) => match K::filters(uid, &key) {
                    Ok(filters) => Some(Subscription::spawn(
                        self.store.clone(),
                        K::collection(),
                        filters,
                    )),
                    Err(err) => {
                        tracing::warn!(%key, "failed to subscribe: {err}");
                        None
                    }
                },
                (Some(uid), SyncMode::Once) => {
                    let _guard = self.guard.lock().await;
                    if let Err(err) = self.resolve(uid, &key, false, |_| {}).await {
                        tracing::warn!(collection = %K::collection(), %key, "failed to resolve plan: {err}");
                    }
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
                    res = cursor.changed() => {
                        if res.is_err() {
                            return;
                        }
                        break;
                    }
                    docs = next_snapshot(&mut subscription) => {
                        if let Some(uid) = &uid {
                            self.apply_remote(uid, &key, docs);
                        }
                    }
                }
            }
        }
    }
}
