//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, PeakView, PeaksQuery, StateResponse};
use crate::peak::Clock;

/// Returns every derived value at the handler's current instant.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state<C: Clock>(State(state): State<Arc<AppState<C>>>) -> Json<StateResponse> {
    Json(StateResponse::from(&state.handler.snapshot()))
}

/// Returns loaded peaks in load order, optionally filtered by local start date.
///
/// `GET /peaks` → 200 + `Vec<PeakView>` JSON
/// `GET /peaks?from=2024-12-15&to=2024-12-16` → peaks starting in range (inclusive)
/// `GET /peaks?from=2024-12-16&to=2024-12-15` → 400 + `ErrorResponse`
pub async fn get_peaks<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<PeaksQuery>,
) -> impl IntoResponse {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("`from` ({from}) must be <= `to` ({to})"),
                }),
            ));
        }
    }

    let peaks: Vec<PeakView> = state
        .handler
        .events()
        .iter()
        .filter(|e| {
            let day = e.start_date().date_naive();
            query.from.is_none_or(|from| day >= from) && query.to.is_none_or(|to| day <= to)
        })
        .map(PeakView::from)
        .collect();

    Ok(Json(peaks))
}
