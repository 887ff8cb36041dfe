//! Synchronization between an edit session and the transform store.
//!
//! The store is authoritative. The bridge pulls the selected transform into
//! the session, pushes commits back as partial updates, and re-pulls after
//! every successful write so the session shows what the store kept.

use recode_editor_core::{CaptureSurface, EditSessionController, FocusSuspension, OperatorPopup};

use crate::error::StoreError;
use crate::store::{StoreEvent, TransformId, TransformStore, TransformUpdate, TransformValues};

/// State of the most recent store write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing in flight, last write (if any) succeeded.
    #[default]
    Idle,
    /// A write is awaiting the store.
    Pending,
    /// The last write failed with this message. The local chain is kept.
    Failed(String),
}

/// Header texts of the displayed transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderText {
    pub name: String,
    pub description: String,
}

/// Keeps one [`EditSessionController`] in step with a [`TransformStore`].
pub struct SynchronizationBridge<S> {
    store: S,
    header: HeaderText,
    status: SyncStatus,
    /// Transform whose chain the session holds.
    loaded: Option<TransformId>,
    /// Update to resend on retry or fold into the next commit.
    last_failed: Option<TransformUpdate>,
}

impl<S: TransformStore> SynchronizationBridge<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            header: HeaderText::default(),
            status: SyncStatus::Idle,
            loaded: None,
            last_failed: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn header(&self) -> &HeaderText {
        &self.header
    }

    /// Pull the transform currently selected in the store.
    ///
    /// Returns whether the session's clause list was rebuilt.
    pub fn populate<F, C, P>(&mut self, session: &mut EditSessionController<F, C, P>) -> bool
    where
        F: FocusSuspension,
        C: CaptureSurface,
        P: OperatorPopup,
    {
        let selected = self.store.editing_transform();
        self.on_selection_changed(selected, session)
    }

    /// The store's selection moved to `id`.
    ///
    /// Without a record the header is cleared but the chain is left alone,
    /// so a transient unselect does not throw away the clause list. With a
    /// record the chain is rebuilt only if it differs from the session's.
    /// Re-reading the loaded transform keeps the session's undo snapshot;
    /// loading another transform moves it.
    pub fn on_selection_changed<F, C, P>(
        &mut self,
        id: Option<TransformId>,
        session: &mut EditSessionController<F, C, P>,
    ) -> bool
    where
        F: FocusSuspension,
        C: CaptureSurface,
        P: OperatorPopup,
    {
        let Some(record) = id.and_then(|id| self.store.transform_by_id(id)) else {
            tracing::debug!(?id, "No transform record, clearing header");
            self.header = HeaderText::default();
            return false;
        };

        self.header = HeaderText {
            name: record.name,
            description: record.description,
        };
        let rebuilt = if self.loaded == Some(record.id) {
            session.load_flat(&record.formula)
        } else {
            self.loaded = Some(record.id);
            session.switch_flat(&record.formula)
        };
        tracing::debug!(id = %record.id, rebuilt, "Populated from store");
        rebuilt
    }

    pub fn on_store_event<F, C, P>(
        &mut self,
        event: StoreEvent,
        session: &mut EditSessionController<F, C, P>,
    ) -> bool
    where
        F: FocusSuspension,
        C: CaptureSurface,
        P: OperatorPopup,
    {
        tracing::trace!(?event, "Store event");
        match event {
            StoreEvent::EditingTransChanged | StoreEvent::DataSetLoaded => self.populate(session),
        }
    }

    /// Send a partial update for transform `id`, then reconcile.
    ///
    /// Fields of a previously failed update to the same transform ride
    /// along unless `values` sets them too. On failure the session keeps its
    /// local state and the update is held for [`retry`](Self::retry).
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn push_commit<F, C, P>(
        &mut self,
        id: TransformId,
        values: TransformValues,
        session: &mut EditSessionController<F, C, P>,
    ) -> Result<(), StoreError>
    where
        F: FocusSuspension,
        C: CaptureSurface,
        P: OperatorPopup,
    {
        let mut values = values;
        if let Some(failed) = self.last_failed.take_if(|failed| failed.id == id) {
            values.fill_from(failed.values);
        }
        if values.is_empty() {
            return Ok(());
        }

        let update = TransformUpdate { id, values };
        self.status = SyncStatus::Pending;
        match self.store.set_transforms(vec![update.clone()]).await {
            Ok(()) => {
                self.status = SyncStatus::Idle;
                self.populate(session);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "Store write failed, keeping local state");
                self.status = SyncStatus::Failed(err.to_string());
                self.last_failed = Some(update);
                Err(err)
            }
        }
    }

    /// Push the session's pending chain write, if one is due.
    ///
    /// The host calls this once per turn after dispatching its events.
    /// Returns whether a write was sent.
    #[tracing::instrument(skip_all)]
    pub async fn flush<F, C, P>(
        &mut self,
        session: &mut EditSessionController<F, C, P>,
    ) -> Result<bool, StoreError>
    where
        F: FocusSuspension,
        C: CaptureSurface,
        P: OperatorPopup,
    {
        let Some(formula) = session.take_due_apply() else {
            return Ok(false);
        };
        let Some(id) = self.store.editing_transform() else {
            tracing::warn!(len = formula.len(), "Chain write with no transform selected");
            let err = StoreError::NoSelection;
            self.status = SyncStatus::Failed(err.to_string());
            return Err(err);
        };
        self.push_commit(id, TransformValues::formula(formula), session)
            .await
            .map(|()| true)
    }

    /// Resend the last failed update. Returns whether anything was sent.
    #[tracing::instrument(skip_all)]
    pub async fn retry<F, C, P>(
        &mut self,
        session: &mut EditSessionController<F, C, P>,
    ) -> Result<bool, StoreError>
    where
        F: FocusSuspension,
        C: CaptureSurface,
        P: OperatorPopup,
    {
        let Some(update) = self.last_failed.take() else {
            return Ok(false);
        };
        tracing::debug!(id = %update.id, "Retrying store write");
        self.push_commit(update.id, update.values, session)
            .await
            .map(|()| true)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use recode_editor_core::{EditorConfig, Key, KeydownResult, Modifiers, Services, Slot};

    use super::*;
    use crate::store::TransformRecord;

    type HeadlessSession = EditSessionController<(), (), ()>;

    /// In-memory store that trims names and formula tokens and logs every write.
    #[derive(Default)]
    struct FakeStore {
        records: RefCell<BTreeMap<TransformId, TransformRecord>>,
        selected: RefCell<Option<TransformId>>,
        fail_next: RefCell<Option<StoreError>>,
        writes: RefCell<Vec<String>>,
    }

    impl FakeStore {
        fn with(record: TransformRecord) -> Self {
            let store = Self::default();
            *store.selected.borrow_mut() = Some(record.id);
            store.records.borrow_mut().insert(record.id, record);
            store
        }

        fn select(&self, id: Option<TransformId>) {
            *self.selected.borrow_mut() = id;
        }

        fn formula(&self, id: TransformId) -> Vec<String> {
            self.records.borrow()[&id].formula.clone()
        }

        fn writes(&self) -> Vec<String> {
            self.writes.borrow().clone()
        }
    }

    impl TransformStore for FakeStore {
        fn editing_transform(&self) -> Option<TransformId> {
            *self.selected.borrow()
        }

        fn transform_by_id(&self, id: TransformId) -> Option<TransformRecord> {
            self.records.borrow().get(&id).cloned()
        }

        async fn set_transforms(&self, updates: Vec<TransformUpdate>) -> Result<(), StoreError> {
            if let Some(err) = self.fail_next.borrow_mut().take() {
                return Err(err);
            }
            let mut records = self.records.borrow_mut();
            for TransformUpdate { id, values } in updates {
                let record = records
                    .get_mut(&id)
                    .ok_or(StoreError::UnknownTransform(id))?;
                let mut entry = id.to_string();
                if let Some(name) = values.name {
                    record.name = name.trim().to_owned();
                    entry.push_str(&format!(" name={}", record.name));
                }
                if let Some(description) = values.description {
                    entry.push_str(&format!(" description={description}"));
                    record.description = description;
                }
                if let Some(formula) = values.formula {
                    entry.push_str(&format!(" formula={}", formula.join("|")));
                    record.formula = formula.iter().map(|t| t.trim().to_owned()).collect();
                }
                self.writes.borrow_mut().push(entry);
            }
            Ok(())
        }
    }

    fn record(id: u32, formula: &[&str]) -> TransformRecord {
        TransformRecord {
            id: TransformId(id),
            name: format!("Transform {id}"),
            description: String::new(),
            formula: formula.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn make_session() -> HeadlessSession {
        EditSessionController::new(Services::default(), EditorConfig::default())
    }

    #[test]
    fn test_populate_rebuilds_only_on_change() {
        let store = FakeStore::with(record(1, &["A==5", "'x'", "'y'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();

        assert!(bridge.populate(&mut session));
        assert_eq!(session.chain().encode(), vec!["A==5", "'x'", "'y'"]);
        assert_eq!(bridge.header().name, "Transform 1");

        assert!(!bridge.on_store_event(StoreEvent::DataSetLoaded, &mut session));
    }

    #[test]
    fn test_unselect_keeps_chain() {
        let store = FakeStore::with(record(1, &["'tom'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        bridge.store().select(None);
        assert!(!bridge.on_store_event(StoreEvent::EditingTransChanged, &mut session));
        assert_eq!(bridge.header(), &HeaderText::default());
        assert_eq!(session.chain().encode(), vec!["'tom'"]);

        assert!(!bridge.on_selection_changed(Some(TransformId(9)), &mut session));
        assert_eq!(session.chain().encode(), vec!["'tom'"]);
    }

    #[test]
    fn test_malformed_record_falls_back() {
        let store = FakeStore::with(record(1, &["A==5", "'x'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        session.insert_clause();

        assert!(bridge.populate(&mut session));
        assert_eq!(session.chain().encode(), vec![""]);
        assert!(!bridge.populate(&mut session));
    }

    #[tokio::test]
    async fn test_burst_of_mutations_is_one_write() {
        let store = FakeStore::with(record(1, &["'tom'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        session.insert_clause();
        session.insert_clause();
        assert_eq!(
            session.keydown(&Key::Enter, Modifiers::NONE, None),
            KeydownResult::Handled
        );

        assert!(bridge.flush(&mut session).await.unwrap());
        assert!(!bridge.flush(&mut session).await.unwrap());

        insta::assert_debug_snapshot!(bridge.store().writes(), @r#"
        [
            "1 formula=||||'tom'",
        ]
        "#);
        assert_eq!(bridge.status(), &SyncStatus::Idle);
    }

    #[tokio::test]
    async fn test_escape_wins_over_scheduled_write() {
        let store = FakeStore::with(record(1, &["'tom'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        let clause = session.insert_clause();
        session.focus_gained(Slot::Condition(clause));
        assert_eq!(
            session.keydown(&Key::Escape, Modifiers::NONE, Some("> 5")),
            KeydownResult::Blur
        );
        assert!(!session.focus_lost(Slot::Condition(clause), "> 5"));

        bridge.flush(&mut session).await.unwrap();
        assert_eq!(bridge.store().writes(), vec!["1 formula='tom'"]);
        assert_eq!(session.chain().encode(), vec!["'tom'"]);
    }

    #[tokio::test]
    async fn test_escape_after_normalized_write_restores_pre_focus_chain() {
        let store = FakeStore::with(record(1, &["'tom'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        session.focus_gained(Slot::Default);
        session.focus_lost(Slot::Default, " 'jerry' ");
        assert!(bridge.flush(&mut session).await.unwrap());
        assert_eq!(session.chain().encode(), vec!["'jerry'"]);

        session.focus_gained(Slot::Default);
        session.keydown(&Key::Escape, Modifiers::NONE, Some("'jerry'"));
        assert_eq!(session.chain().encode(), vec!["'tom'"]);

        bridge.flush(&mut session).await.unwrap();
        assert_eq!(bridge.store().formula(TransformId(1)), vec!["'tom'"]);
    }

    #[test]
    fn test_selecting_another_transform_moves_snapshot() {
        let store = FakeStore::with(record(1, &["'tom'"]));
        store.records.borrow_mut().insert(TransformId(2), record(2, &["'ann'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        session.focus_gained(Slot::Default);
        bridge.store().select(Some(TransformId(2)));
        assert!(bridge.on_store_event(StoreEvent::EditingTransChanged, &mut session));

        session.focus_gained(Slot::Default);
        session.keydown(&Key::Escape, Modifiers::NONE, None);
        assert_eq!(session.chain().encode(), vec!["'ann'"]);
        assert_eq!(bridge.header().name, "Transform 2");
    }

    #[tokio::test]
    async fn test_commit_reconciles_with_store() {
        let store = FakeStore::with(record(1, &[""]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        bridge
            .push_commit(TransformId(1), TransformValues::name("  Ages "), &mut session)
            .await
            .unwrap();

        assert_eq!(bridge.header().name, "Ages");
        assert_eq!(bridge.store().writes(), vec!["1 name=Ages"]);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_local_chain() {
        let store = FakeStore::with(record(1, &["'tom'"]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        session.insert_clause();
        session.keydown(&Key::Enter, Modifiers::NONE, None);
        *bridge.store().fail_next.borrow_mut() = Some(StoreError::Transport("offline".into()));

        let err = bridge.flush(&mut session).await.unwrap_err();
        assert_eq!(err, StoreError::Transport("offline".into()));
        assert_eq!(
            bridge.status(),
            &SyncStatus::Failed("store transport failed: offline".into())
        );
        assert_eq!(session.chain().encode(), vec!["", "", "'tom'"]);
        assert_eq!(bridge.store().formula(TransformId(1)), vec!["'tom'"]);

        assert!(bridge.retry(&mut session).await.unwrap());
        assert_eq!(bridge.status(), &SyncStatus::Idle);
        assert_eq!(bridge.store().formula(TransformId(1)), vec!["", "", "'tom'"]);
        assert!(!bridge.retry(&mut session).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_fields_ride_along_with_next_commit() {
        let store = FakeStore::with(record(1, &[""]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);

        *bridge.store().fail_next.borrow_mut() = Some(StoreError::Rejected("busy".into()));
        assert!(
            bridge
                .push_commit(TransformId(1), TransformValues::name("Ages"), &mut session)
                .await
                .is_err()
        );

        bridge
            .push_commit(
                TransformId(1),
                TransformValues::description("Bands"),
                &mut session,
            )
            .await
            .unwrap();

        assert_eq!(
            bridge.store().writes(),
            vec!["1 name=Ages description=Bands"]
        );
        assert_eq!(bridge.header().description, "Bands");
    }

    #[tokio::test]
    async fn test_flush_without_selection() {
        let store = FakeStore::with(record(1, &[""]));
        let mut bridge = SynchronizationBridge::new(store);
        let mut session = make_session();
        bridge.populate(&mut session);
        bridge.store().select(None);

        session.insert_clause();
        assert_eq!(
            bridge.flush(&mut session).await,
            Err(StoreError::NoSelection)
        );
        assert!(bridge.store().writes().is_empty());
        assert_eq!(session.chain().clause_count(), 1);
    }
}
