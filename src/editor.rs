// src/editor.rs
//! Server-held editor sessions. Each session owns one
//! `InteractionController`; HTTP calls drive it and the registry drops
//! sessions nobody touched for the configured idle time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::error::ApiError;
use crate::odontogram::{ChangeListener, Chart, EditorState, InteractionController, Palette};
use crate::store::{ChartStore, StoreError};

pub struct EditorSession {
    pub session_id: Uuid,
    pub patient_id: Uuid,
    pub base_entry_id: Option<Uuid>,
    pub opened_by: Uuid,
    pub opened_at: DateTime<Utc>,
    pub last_touched: DateTime<Utc>,
    /// Bumped on every applied change.
    pub revision: u64,
    pub controller: InteractionController,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditorSnapshot {
    pub session_id: Uuid,
    pub patient_id: Uuid,
    pub base_entry_id: Option<Uuid>,
    pub read_only: bool,
    pub revision: u64,
    pub state: EditorState,
    pub palette: Option<Palette>,
    pub chart: Chart,
    pub opened_at: DateTime<Utc>,
    pub last_touched: DateTime<Utc>,
}

impl EditorSession {
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            session_id: self.session_id,
            patient_id: self.patient_id,
            base_entry_id: self.base_entry_id,
            read_only: self.controller.read_only(),
            revision: self.revision,
            state: self.controller.state(),
            palette: self.controller.palette(),
            chart: self.controller.chart().clone(),
            opened_at: self.opened_at,
            last_touched: self.last_touched,
        }
    }

    fn idle_since(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_touched
    }
}

#[derive(Clone)]
pub struct EditorSessions {
    inner: Arc<Mutex<HashMap<Uuid, EditorSession>>>,
    idle_ttl: Duration,
}

impl EditorSessions {
    pub fn new(idle_minutes: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl: Duration::try_minutes(idle_minutes).unwrap_or_else(|| Duration::minutes(30)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, EditorSession>>, ApiError> {
        self.inner
            .lock()
            .map_err(|_| ApiError::Internal("editor registry poisoned".into()))
    }

    /// Registers a new session. A patient has at most one editable session
    /// at a time; read-only sessions never conflict.
    pub fn open(
        &self,
        patient_id: Uuid,
        opened_by: Uuid,
        base_entry_id: Option<Uuid>,
        controller: InteractionController,
    ) -> Result<EditorSnapshot, ApiError> {
        let now = Utc::now();
        let mut sessions = self.lock()?;
        prune(&mut sessions, now, self.idle_ttl);

        if !controller.read_only()
            && sessions
                .values()
                .any(|s| s.patient_id == patient_id && !s.controller.read_only())
        {
            return Err(ApiError::Conflict(
                "EDITOR_OPEN",
                "an editable chart session is already open for this patient".into(),
            ));
        }

        let session = EditorSession {
            session_id: Uuid::new_v4(),
            patient_id,
            base_entry_id,
            opened_by,
            opened_at: now,
            last_touched: now,
            revision: 0,
            controller,
        };
        let snapshot = session.snapshot();
        tracing::info!(
            session_id = %session.session_id,
            %patient_id,
            read_only = snapshot.read_only,
            "editor session opened"
        );
        sessions.insert(session.session_id, session);
        Ok(snapshot)
    }

    /// Runs `f` on the caller's own live session and marks it touched.
    pub fn with<T>(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        f: impl FnOnce(&mut EditorSession) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        let expired = match sessions.get(&session_id) {
            None => return Err(ApiError::editor_not_found()),
            Some(s) => s.idle_since(now) > self.idle_ttl,
        };
        if expired {
            sessions.remove(&session_id);
            tracing::debug!(%session_id, "editor session expired");
            return Err(ApiError::editor_not_found());
        }

        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(ApiError::editor_not_found)?;
        if session.opened_by != user_id {
            return Err(ApiError::Forbidden(
                "EDITOR_NOT_OWNED",
                "editor session belongs to another user".into(),
            ));
        }
        session.last_touched = now;
        f(session)
    }

    pub fn remove(&self, session_id: Uuid, user_id: Uuid) -> Result<EditorSession, ApiError> {
        let mut sessions = self.lock()?;
        match sessions.get(&session_id) {
            None => return Err(ApiError::editor_not_found()),
            Some(s) if s.opened_by != user_id => {
                return Err(ApiError::Forbidden(
                    "EDITOR_NOT_OWNED",
                    "editor session belongs to another user".into(),
                ));
            }
            Some(_) => {}
        }
        let session = sessions
            .remove(&session_id)
            .ok_or_else(ApiError::editor_not_found)?;
        tracing::info!(%session_id, patient_id = %session.patient_id, "editor session discarded");
        Ok(session)
    }

    /// Drops sessions idle for longer than the ttl at `now`.
    pub fn prune_idle(&self, now: DateTime<Utc>) -> Result<usize, ApiError> {
        let mut sessions = self.lock()?;
        Ok(prune(&mut sessions, now, self.idle_ttl))
    }

    pub fn count(&self) -> usize {
        self.inner.lock().map(|s| s.len()).unwrap_or(0)
    }
}

fn prune(sessions: &mut HashMap<Uuid, EditorSession>, now: DateTime<Utc>, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|id, s| {
        let keep = s.idle_since(now) <= ttl;
        if !keep {
            tracing::debug!(session_id = %id, "editor session expired");
        }
        keep
    });
    before - sessions.len()
}

/* -------------------------
   Live-save
--------------------------*/

#[derive(Debug, Clone)]
pub struct DraftUpdate {
    pub patient_id: Uuid,
    pub user_id: Uuid,
    pub chart: Chart,
}

/// Work for the draft writer, processed in send order.
#[derive(Debug, Clone)]
pub enum DraftCommand {
    Write(DraftUpdate),
    /// The chart was saved as an entry; drop the draft and anything still
    /// queued before this point.
    Discard { patient_id: Uuid },
}

impl DraftCommand {
    fn patient_id(&self) -> Uuid {
        match self {
            DraftCommand::Write(update) => update.patient_id,
            DraftCommand::Discard { patient_id } => *patient_id,
        }
    }
}

/// Forwards every chart change to the draft writer. Sending never blocks
/// the editor.
pub struct DraftSink {
    patient_id: Uuid,
    user_id: Uuid,
    tx: UnboundedSender<DraftCommand>,
}

impl DraftSink {
    pub fn new(patient_id: Uuid, user_id: Uuid, tx: UnboundedSender<DraftCommand>) -> Self {
        Self { patient_id, user_id, tx }
    }
}

impl ChangeListener for DraftSink {
    fn chart_changed(&mut self, chart: &Chart) {
        let update = DraftUpdate {
            patient_id: self.patient_id,
            user_id: self.user_id,
            chart: chart.clone(),
        };
        if self.tx.send(DraftCommand::Write(update)).is_err() {
            tracing::warn!(patient_id = %self.patient_id, "draft writer is gone; live-save skipped");
        }
    }
}

/// Removes the patient's draft after a save. With live-save on, the discard
/// goes through the writer queue so that drafts queued earlier cannot
/// recreate it.
pub async fn discard_draft(
    store: &dyn ChartStore,
    drafts: Option<&UnboundedSender<DraftCommand>>,
    patient_id: Uuid,
) -> Result<(), StoreError> {
    if let Some(tx) = drafts {
        if tx.send(DraftCommand::Discard { patient_id }).is_ok() {
            return Ok(());
        }
        tracing::warn!(%patient_id, "draft writer is gone; deleting draft directly");
    }
    store.delete_draft(patient_id).await
}

/// Runs commands until every sender is dropped. Only the newest pending
/// command per patient is carried out.
pub async fn run_draft_writer(store: Arc<dyn ChartStore>, mut rx: UnboundedReceiver<DraftCommand>) {
    while let Some(first) = rx.recv().await {
        let mut pending: Vec<DraftCommand> = vec![first];
        while let Ok(next) = rx.try_recv() {
            match pending.iter_mut().find(|c| c.patient_id() == next.patient_id()) {
                Some(slot) => *slot = next,
                None => pending.push(next),
            }
        }

        for command in pending {
            let patient_id = command.patient_id();
            let (action, result) = match &command {
                DraftCommand::Write(update) => (
                    "write",
                    store
                        .upsert_draft(update.patient_id, update.user_id, &update.chart)
                        .await,
                ),
                DraftCommand::Discard { .. } => ("discard", store.delete_draft(patient_id).await),
            };
            match result {
                Ok(()) => tracing::debug!(%patient_id, action, "chart draft updated"),
                Err(e) => tracing::warn!(%patient_id, error = %e, "chart draft update failed"),
            }
        }
    }
    tracing::debug!("draft writer stopped");
}

/// Sweeps idle sessions so abandoned editors do not pile up between opens.
pub async fn run_idle_pruner(sessions: EditorSessions, every: std::time::Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match sessions.prune_idle(Utc::now()) {
            Ok(0) => {}
            Ok(n) => tracing::info!(expired = n, "idle editor sessions dropped"),
            Err(_) => tracing::warn!("editor registry poisoned; pruning skipped"),
        }
    }
}
