use std::sync::Arc;
use std::time::Duration;

use dcms_odontogram::{
    config::Config,
    db,
    editor::{self, EditorSessions},
    models::AppState,
    odontogram::{LayoutParams, layout},
    routes,
    store::{ChartStore, PgChartStore},
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::connect_pg(&cfg.database_url, cfg.db_max_connections).await?;

    let charts: Arc<dyn ChartStore> = Arc::new(PgChartStore::new(pool.clone()));
    let chart_layout = Arc::new(layout::generate(&LayoutParams::with_cell_size(cfg.cell_size)));
    tracing::info!(
        cell_size = chart_layout.params.cell_size,
        width = chart_layout.width,
        height = chart_layout.height,
        "odontogram layout ready"
    );

    let drafts = if cfg.live_save {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(editor::run_draft_writer(Arc::clone(&charts), rx));
        tracing::info!("live-save enabled");
        Some(tx)
    } else {
        None
    };

    let editors = EditorSessions::new(cfg.editor_idle_minutes);
    tokio::spawn(editor::run_idle_pruner(editors.clone(), Duration::from_secs(60)));

    let state = AppState {
        db: pool,
        charts,
        layout: chart_layout,
        editors,
        drafts,
    };

    // Browser/WebView clients call the API from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
