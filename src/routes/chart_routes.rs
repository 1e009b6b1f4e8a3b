// src/routes/chart_routes.rs

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    editor,
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiData, AppState},
    odontogram::{Chart, Marking, Target},
    store::{ChartDraft, ChartEntry, ChartEntrySummary, NewChartEntry},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/patients/{patient_id}/charts",
            get(list_charts).post(save_chart),
        )
        .route("/patients/{patient_id}/charts/latest", get(latest_chart))
        .route("/patients/{patient_id}/charts/draft", get(get_draft))
        .route("/patients/{patient_id}/charts/apply", post(apply_marking))
        .route("/charts/{entry_id}", get(get_chart_entry))
}

pub(crate) async fn ensure_patient(state: &AppState, patient_id: Uuid) -> Result<(), ApiError> {
    if state.charts.patient_exists(patient_id).await? {
        Ok(())
    } else {
        Err(ApiError::patient_not_found())
    }
}

#[derive(Debug, Serialize)]
pub struct LatestChart {
    /// None when the patient has no saved chart yet.
    pub entry_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub chart: Chart,
}

pub async fn latest_chart(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiData<LatestChart>>, ApiError> {
    ensure_patient(&state, patient_id).await?;

    let latest = match state.charts.latest_entry(patient_id).await? {
        Some(e) => LatestChart {
            entry_id: Some(e.entry_id),
            created_at: Some(e.created_at),
            chart: e.chart,
        },
        None => LatestChart {
            entry_id: None,
            created_at: None,
            chart: Chart::new(),
        },
    };
    Ok(Json(ApiData::new(latest)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>, // default 50
}

pub async fn list_charts(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiData<Vec<ChartEntrySummary>>>, ApiError> {
    ensure_patient(&state, patient_id).await?;

    let limit = q.limit.unwrap_or(50).clamp(1, 200);
    let rows = state.charts.list_entries(patient_id, limit).await?;
    Ok(Json(ApiData::new(rows)))
}

#[derive(Debug, Deserialize)]
pub struct SaveChartRequest {
    pub chart: Chart,
    pub note: Option<String>,
}

pub(crate) fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

pub async fn save_chart(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<SaveChartRequest>,
) -> Result<Json<ApiData<ChartEntry>>, ApiError> {
    auth.require_chart_editor()?;
    ensure_patient(&state, patient_id).await?;

    let chart = Chart::load(Some(req.chart))?;
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

    tracing::info!(entry_id = %entry.entry_id, %patient_id, "chart entry saved");
    Ok(Json(ApiData::new(entry)))
}

pub async fn get_draft(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiData<Option<ChartDraft>>>, ApiError> {
    ensure_patient(&state, patient_id).await?;
    let draft = state.charts.get_draft(patient_id).await?;
    Ok(Json(ApiData::new(draft)))
}

#[derive(Debug, Deserialize)]
pub struct ApplyMarkingRequest {
    /// Missing means an empty chart.
    pub chart: Option<Chart>,
    pub target: Target,
    pub marking: Marking,
}

/// Stateless: the caller keeps the chart, nothing is stored.
pub async fn apply_marking(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<ApplyMarkingRequest>,
) -> Result<Json<ApiData<Chart>>, ApiError> {
    auth.require_chart_editor()?;
    ensure_patient(&state, patient_id).await?;

    let mut chart = Chart::load(req.chart)?;
    chart.apply_marking(&req.target, &req.marking)?;
    Ok(Json(ApiData::new(chart)))
}

pub async fn get_chart_entry(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<ApiData<ChartEntry>>, ApiError> {
    let entry = state
        .charts
        .get_entry(entry_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "chart entry not found".to_string()))?;
    Ok(Json(ApiData::new(entry)))
}
