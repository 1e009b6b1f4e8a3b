use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::editor::{DraftCommand, EditorSessions};
use crate::odontogram::ChartLayout;
use crate::store::ChartStore;

#[derive(Clone)]
pub struct AppState {
    /// Session lookup for bearer tokens.
    pub db: sqlx::PgPool,
    pub charts: Arc<dyn ChartStore>,
    /// Computed once at startup; every editor shares it.
    pub layout: Arc<ChartLayout>,
    pub editors: EditorSessions,
    /// Present when live-save is enabled.
    pub drafts: Option<UnboundedSender<DraftCommand>>,
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiData<T> {
    pub data: T,
}

impl<T> ApiData<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub data: OkData,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self {
            data: OkData { ok: true },
        }
    }
}

/* -------------------------
   Helpers
--------------------------*/

/// Role mapping of dcms_user.roles:
/// 0 Patient, 1 Admin, 2 Manager, 3 Doctor, 4 Receptionist
pub fn role_to_string(role: i16) -> &'static str {
    match role {
        0 => "patient",
        1 => "admin",
        2 => "manager",
        3 => "doctor",
        4 => "receptionist",
        _ => "unknown",
    }
}

/// Everyone else gets read-only charts.
pub fn can_edit_charts(role: i16) -> bool {
    matches!(role_to_string(role), "admin" | "doctor")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admins_and_doctors_edit() {
        assert!(can_edit_charts(1));
        assert!(can_edit_charts(3));
        for role in [0, 2, 4, 9] {
            assert!(!can_edit_charts(role));
        }
    }

    #[test]
    fn envelope_shape() {
        let body = serde_json::to_value(ApiData::new(5)).unwrap();
        assert_eq!(body, serde_json::json!({ "data": 5 }));
        let ok = serde_json::to_value(OkResponse::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({ "data": { "ok": true } }));
    }
}
