use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use rutt_api::{ErrorKind, Operation, StoreError};

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  Tracking operations
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_new(
    State(state): State<AppState>,
    Path((correlation_id, source_id)): Path<(String, String)>,
) -> Response {
    execute(
        &state,
        Operation::New {
            correlation_id,
            source_id,
        },
    )
    .await
}

pub(crate) async fn handle_queued(
    State(state): State<AppState>,
    Path((correlation_id, time_queued)): Path<(String, String)>,
) -> Response {
    execute(
        &state,
        Operation::Queued {
            correlation_id,
            time_queued,
        },
    )
    .await
}

pub(crate) async fn handle_update(
    State(state): State<AppState>,
    Path((correlation_id, field, value)): Path<(String, String, String)>,
) -> Response {
    execute(
        &state,
        Operation::Update {
            correlation_id,
            field,
            value,
        },
    )
    .await
}

pub(crate) async fn handle_destination_added(
    State(state): State<AppState>,
    Path((correlation_id, destination_id, message_id, time_queued)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Response {
    execute(
        &state,
        Operation::DestinationAdded {
            correlation_id,
            destination_id,
            message_id,
            time_queued,
        },
    )
    .await
}

pub(crate) async fn handle_destination_updated(
    State(state): State<AppState>,
    Path((correlation_id, destination_id, message_id, field, value)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
) -> Response {
    execute(
        &state,
        Operation::DestinationUpdated {
            correlation_id,
            destination_id,
            message_id,
            field,
            value,
        },
    )
    .await
}

/// Success echoes the decoded inputs; the document is not read back.
async fn execute(state: &AppState, operation: Operation) -> Response {
    match state.tracker.apply(&operation).await {
        Ok(()) => axum::Json(operation.echo()).into_response(),
        Err(e) => failure(operation.name(), operation.correlation_id(), e),
    }
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /records/{correlationId}, GET /health
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_get_record(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> Response {
    match state.tracker.get(&correlation_id).await {
        Ok(Some(record)) => axum::Json(record).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            format!("error: record '{correlation_id}' not found"),
        )
            .into_response(),
        Err(e) => failure("records", &correlation_id, e),
    }
}

pub(crate) async fn handle_health() -> &'static str {
    "ok"
}

// ═══════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::DuplicateKey | ErrorKind::PathConflict => StatusCode::CONFLICT,
        ErrorKind::MalformedPath => StatusCode::BAD_REQUEST,
        ErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The single place a failed request is logged.
fn failure(operation: &'static str, correlation_id: &str, e: StoreError) -> Response {
    match e.kind() {
        ErrorKind::Unavailable => {
            tracing::error!(operation, correlation_id, error = %e, "request failed")
        }
        _ => tracing::warn!(operation, correlation_id, error = %e, "request rejected"),
    }
    (status_for(e.kind()), format!("error: {e}")).into_response()
}
