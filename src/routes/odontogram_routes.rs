// src/routes/odontogram_routes.rs

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiData, AppState},
    odontogram::{
        ChartLayout,
        legend::{self, LegendGroup},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/odontogram/layout", get(get_layout))
        .route("/odontogram/legend", get(get_legend))
        .route("/odontogram/legend.svg", get(get_legend_svg))
}

pub(crate) fn svg_response(svg: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()
}

pub async fn get_layout(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiData<ChartLayout>>, ApiError> {
    Ok(Json(ApiData::new(state.layout.as_ref().clone())))
}

pub async fn get_legend(_auth: AuthContext) -> Result<Json<ApiData<Vec<LegendGroup>>>, ApiError> {
    Ok(Json(ApiData::new(legend::legend())))
}

pub async fn get_legend_svg(_auth: AuthContext) -> Result<Response, ApiError> {
    Ok(svg_response(legend::render_legend_svg()))
}
