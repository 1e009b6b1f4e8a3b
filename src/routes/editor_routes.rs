// src/routes/editor_routes.rs
//
// One open editor per session id. Handlers never hold the registry lock
// across an await.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    editor::{self, DraftSink, EditorSnapshot},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiData, AppState, OkResponse},
    odontogram::{Chart, InteractionController, Marking, Point, Target, ToothId},
    routes::chart_routes::{clean_note, ensure_patient},
    routes::odontogram_routes::svg_response,
    store::NewChartEntry,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients/{patient_id}/editor", post(open_editor))
        .route("/editor/{session_id}", get(get_editor).delete(discard_editor))
        .route("/editor/{session_id}/select", post(select))
        .route("/editor/{session_id}/choose", post(choose))
        .route("/editor/{session_id}/close", post(close))
        .route("/editor/{session_id}/notes", put(set_notes))
        .route("/editor/{session_id}/chart.svg", get(chart_svg))
        .route("/editor/{session_id}/save", post(save))
}

type SnapshotResult = Result<Json<ApiData<EditorSnapshot>>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct OpenEditorQuery {
    /// Forces read-only even for editing roles.
    pub read_only: Option<bool>,
    /// Start from the live-saved draft instead of the latest entry.
    pub resume_draft: Option<bool>,
}

pub async fn open_editor(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Query(q): Query<OpenEditorQuery>,
) -> SnapshotResult {
    ensure_patient(&state, patient_id).await?;

    let read_only = q.read_only.unwrap_or(false) || !auth.can_edit_charts();

    let latest = state.charts.latest_entry(patient_id).await?;
    let base_entry_id = latest.as_ref().map(|e| e.entry_id);

    let draft = if q.resume_draft.unwrap_or(false) {
        state.charts.get_draft(patient_id).await?
    } else {
        None
    };
    let initial: Option<Chart> = match draft {
        Some(d) => Some(d.chart),
        None => latest.map(|e| e.chart),
    };

    let mut controller =
        InteractionController::new(Chart::load(initial)?, Arc::clone(&state.layout), read_only);
    if let (false, Some(tx)) = (read_only, state.drafts.as_ref()) {
        controller = controller.with_listener(DraftSink::new(patient_id, auth.user_id, tx.clone()));
    }

    let snapshot = state
        .editors
        .open(patient_id, auth.user_id, base_entry_id, controller)?;
    Ok(Json(ApiData::new(snapshot)))
}

pub async fn get_editor(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
) -> SnapshotResult {
    let snapshot = state
        .editors
        .with(session_id, auth.user_id, |s| Ok(s.snapshot()))?;
    Ok(Json(ApiData::new(snapshot)))
}

/// Either a pick in chart coordinates or a named target.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SelectRequest {
    Target { target: Target },
    Point { x: f64, y: f64 },
}

pub async fn select(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SelectRequest>,
) -> SnapshotResult {
    let snapshot = state.editors.with(session_id, auth.user_id, |s| {
        match req {
            SelectRequest::Target { target } => {
                s.controller.select(target)?;
            }
            SelectRequest::Point { x, y } => {
                s.controller.click(Point::new(x, y));
            }
        }
        Ok(s.snapshot())
    })?;
    Ok(Json(ApiData::new(snapshot)))
}

pub async fn choose(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
    Json(marking): Json<Marking>,
) -> SnapshotResult {
    let snapshot = state.editors.with(session_id, auth.user_id, |s| {
        s.controller.choose(marking)?;
        s.revision += 1;
        Ok(s.snapshot())
    })?;
    Ok(Json(ApiData::new(snapshot)))
}

pub async fn close(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
) -> SnapshotResult {
    let snapshot = state.editors.with(session_id, auth.user_id, |s| {
        s.controller.close();
        Ok(s.snapshot())
    })?;
    Ok(Json(ApiData::new(snapshot)))
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub tooth: ToothId,
    pub notes: Option<String>,
}

/// Read-only sessions accept the call and change nothing.
pub async fn set_notes(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
    Json(req): Json<NotesRequest>,
) -> SnapshotResult {
    let snapshot = state.editors.with(session_id, auth.user_id, |s| {
        if s.controller.set_notes(req.tooth, req.notes.as_deref()) {
            s.revision += 1;
        }
        Ok(s.snapshot())
    })?;
    Ok(Json(ApiData::new(snapshot)))
}

pub async fn chart_svg(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let svg = state
        .editors
        .with(session_id, auth.user_id, |s| Ok(s.controller.render_svg()))?;
    Ok(svg_response(svg))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveEditorRequest {
    pub note: Option<String>,
}

pub async fn save(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
    body: Option<Json<SaveEditorRequest>>,
) -> SnapshotResult {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let (patient_id, chart) = state.editors.with(session_id, auth.user_id, |s| {
        if s.controller.read_only() {
            return Err(ApiError::Forbidden(
                "READ_ONLY",
                "read-only editor sessions cannot be saved".into(),
            ));
        }
        Ok((s.patient_id, s.controller.chart().clone()))
    })?;

    let entry = state
        .charts
        .insert_entry(NewChartEntry {
            patient_id,
            chart,
            note: clean_note(req.note),
            created_by_user_id: auth.user_id,
        })
        .await?;
    editor::discard_draft(state.charts.as_ref(), state.drafts.as_ref(), patient_id).await?;
    tracing::info!(%session_id, entry_id = %entry.entry_id, %patient_id, "editor session saved");

    let snapshot = state.editors.with(session_id, auth.user_id, |s| {
        s.base_entry_id = Some(entry.entry_id);
        Ok(s.snapshot())
    })?;
    Ok(Json(ApiData::new(snapshot)))
}

pub async fn discard_editor(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(session_id): Path<Uuid>,
) -> Result<Json<OkResponse>, ApiError> {
    state.editors.remove(session_id, auth.user_id)?;
    Ok(Json(OkResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{doctor, receptionist, state};
    use crate::store::{ChartStore, memory::MemoryChartStore};

    fn query(read_only: Option<bool>, resume_draft: Option<bool>) -> Query<OpenEditorQuery> {
        Query(OpenEditorQuery {
            read_only,
            resume_draft,
        })
    }

    fn crowned(tooth: &str) -> Chart {
        let mut chart = Chart::new();
        chart
            .apply_marking(&Target::tooth(tooth.parse().unwrap()), &Marking::Crown)
            .unwrap();
        chart
    }

    #[tokio::test]
    async fn read_only_follows_role_unless_forced() {
        let patient = Uuid::new_v4();
        let state = state(Arc::new(MemoryChartStore::with_patient(patient)), None);

        let viewer = open_editor(State(state.clone()), receptionist(), Path(patient), query(None, None))
            .await
            .unwrap()
            .0
            .data;
        assert!(viewer.read_only);

        let forced = open_editor(State(state.clone()), doctor(), Path(patient), query(Some(true), None))
            .await
            .unwrap()
            .0
            .data;
        assert!(forced.read_only);

        let editing = open_editor(State(state.clone()), doctor(), Path(patient), query(None, None))
            .await
            .unwrap()
            .0
            .data;
        assert!(!editing.read_only);
    }

    #[tokio::test]
    async fn unknown_patient_is_not_found() {
        let state = state(Arc::new(MemoryChartStore::default()), None);
        let err = open_editor(State(state), doctor(), Path(Uuid::new_v4()), query(None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("NOT_FOUND", _)));
    }

    #[tokio::test]
    async fn read_only_sessions_cannot_be_saved() {
        let patient = Uuid::new_v4();
        let store = Arc::new(MemoryChartStore::with_patient(patient));
        let state = state(store.clone(), None);
        let auth = receptionist();

        let snap = open_editor(State(state.clone()), auth.clone(), Path(patient), query(None, None))
            .await
            .unwrap()
            .0
            .data;
        let err = save(State(state), auth, Path(snap.session_id), None).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden("READ_ONLY", _)));
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_stores_entry_and_drops_draft() {
        let patient = Uuid::new_v4();
        let store = Arc::new(MemoryChartStore::with_patient(patient));
        let auth = doctor();
        store.upsert_draft(patient, auth.user_id, &crowned("36")).await.unwrap();
        let state = state(store.clone(), None);

        let snap = open_editor(State(state.clone()), auth.clone(), Path(patient), query(None, None))
            .await
            .unwrap()
            .0
            .data;
        assert_eq!(snap.base_entry_id, None);

        let target = Target::tooth("16".parse().unwrap());
        select(
            State(state.clone()),
            auth.clone(),
            Path(snap.session_id),
            Json(SelectRequest::Target { target }),
        )
        .await
        .unwrap();
        choose(State(state.clone()), auth.clone(), Path(snap.session_id), Json(Marking::Crown))
            .await
            .unwrap();

        let saved = save(State(state.clone()), auth, Path(snap.session_id), None)
            .await
            .unwrap()
            .0
            .data;

        let latest = store.latest_entry(patient).await.unwrap().unwrap();
        assert_eq!(saved.base_entry_id, Some(latest.entry_id));
        assert_eq!(latest.chart, crowned("16"));
        assert_eq!(latest.note, None);
        assert!(store.get_draft(patient).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn live_saved_draft_is_gone_after_save() {
        let patient = Uuid::new_v4();
        let store = Arc::new(MemoryChartStore::with_patient(patient));
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let state = state(store.clone(), Some(tx));
        let auth = doctor();

        let snap = open_editor(State(state.clone()), auth.clone(), Path(patient), query(None, None))
            .await
            .unwrap()
            .0
            .data;
        let target = Target::tooth("21".parse().unwrap());
        select(
            State(state.clone()),
            auth.clone(),
            Path(snap.session_id),
            Json(SelectRequest::Target { target }),
        )
        .await
        .unwrap();
        choose(State(state.clone()), auth.clone(), Path(snap.session_id), Json(Marking::Implant))
            .await
            .unwrap();
        save(
            State(state.clone()),
            auth.clone(),
            Path(snap.session_id),
            Some(Json(SaveEditorRequest {
                note: Some(" implant placed ".into()),
            })),
        )
        .await
        .unwrap();
        discard_editor(State(state.clone()), auth, Path(snap.session_id))
            .await
            .unwrap();

        // Closes the channel so the writer drains and returns.
        drop(state);
        editor::run_draft_writer(store.clone(), rx).await;

        assert!(store.get_draft(patient).await.unwrap().is_none());
        let latest = store.latest_entry(patient).await.unwrap().unwrap();
        assert_eq!(latest.note.as_deref(), Some("implant placed"));
    }

    #[tokio::test]
    async fn resume_draft_prefers_the_draft() {
        let patient = Uuid::new_v4();
        let store = Arc::new(MemoryChartStore::with_patient(patient));
        let auth = doctor();
        let entry = store
            .insert_entry(NewChartEntry {
                patient_id: patient,
                chart: crowned("11"),
                note: None,
                created_by_user_id: auth.user_id,
            })
            .await
            .unwrap();
        store.upsert_draft(patient, auth.user_id, &crowned("46")).await.unwrap();
        let state = state(store, None);

        let resumed = open_editor(State(state.clone()), auth.clone(), Path(patient), query(None, Some(true)))
            .await
            .unwrap()
            .0
            .data;
        assert_eq!(resumed.chart, crowned("46"));
        assert_eq!(resumed.base_entry_id, Some(entry.entry_id));

        let fresh = open_editor(State(state.clone()), auth, Path(patient), query(Some(true), None))
            .await
            .unwrap()
            .0
            .data;
        assert_eq!(fresh.chart, crowned("11"));
    }

    #[tokio::test]
    async fn resume_without_a_draft_uses_latest_entry() {
        let patient = Uuid::new_v4();
        let store = Arc::new(MemoryChartStore::with_patient(patient));
        let auth = doctor();
        store
            .insert_entry(NewChartEntry {
                patient_id: patient,
                chart: crowned("11"),
                note: None,
                created_by_user_id: auth.user_id,
            })
            .await
            .unwrap();
        let state = state(store, None);

        let snap = open_editor(State(state), auth, Path(patient), query(None, Some(true)))
            .await
            .unwrap()
            .0
            .data;
        assert_eq!(snap.chart, crowned("11"));
    }

    #[test]
    fn select_body_accepts_target_or_point() {
        let by_target: SelectRequest = serde_json::from_value(serde_json::json!({
            "target": { "tooth": "21", "surface": "labial" }
        }))
        .unwrap();
        assert!(matches!(by_target, SelectRequest::Target { target } if target.surface.is_some()));

        let by_point: SelectRequest =
            serde_json::from_value(serde_json::json!({ "x": 12.5, "y": 40 })).unwrap();
        assert!(matches!(by_point, SelectRequest::Point { x, .. } if x == 12.5));
    }

    #[test]
    fn notes_body_validates_tooth() {
        let ok: NotesRequest =
            serde_json::from_value(serde_json::json!({ "tooth": "38", "notes": "impacted" })).unwrap();
        assert_eq!(ok.tooth.to_string(), "38");
        assert!(serde_json::from_value::<NotesRequest>(serde_json::json!({ "tooth": "39" })).is_err());
    }
}
