mod http;

use axum::Router;
use axum::routing::get;
use tokio_util::sync::CancellationToken;

use rutt_engine::Tracker;

#[derive(Clone)]
pub struct AppState {
    tracker: Tracker,
}

impl AppState {
    pub fn new(tracker: Tracker) -> Self {
        Self { tracker }
    }
}

/// All routes, one per tracking operation plus inspection and health.
///
/// Every route is `GET`; inputs come only from the (percent-decoded)
/// path segments.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/new/{correlationId}/{sourceId}", get(http::handle_new))
        .route("/queued/{correlationId}/{timeQueued}", get(http::handle_queued))
        .route("/update/{correlationId}/{field}/{value}", get(http::handle_update))
        .route(
            "/destinationAdded/{correlationId}/{destinationId}/{messageId}/{timeQueued}",
            get(http::handle_destination_added),
        )
        .route(
            "/destinationUpdated/{correlationId}/{destinationId}/{messageId}/{field}/{value}",
            get(http::handle_destination_updated),
        )
        .route("/records/{correlationId}", get(http::handle_get_record))
        .route("/health", get(http::handle_health))
        .with_state(state)
}

/// Correlation tracking HTTP сервер. Returns once `shutdown` is
/// cancelled and in-flight requests have completed.
pub async fn run(addr: &str, tracker: Tracker, shutdown: CancellationToken) -> Result<(), String> {
    let app = router(AppState::new(tracker));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind api {addr}: {e}"))?;
    tracing::info!(addr, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}
