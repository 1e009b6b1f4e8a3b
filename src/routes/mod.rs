use crate::models::AppState;
use axum::Router;

pub mod chart_routes;
pub mod editor_routes;
pub mod odontogram_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", odontogram_routes::router())
        .nest("/api/v1", chart_routes::router())
        .nest("/api/v1", editor_routes::router())
        .with_state(state)
}
