//! Event handler: run the pipeline for a delivered trigger payload.

use crate::api::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

/// POST /events - Run the pipeline once for the request body
///
/// Responds with the run result's status code and its JSON-serialized body.
pub async fn submit_event(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let result = state.pipeline.run(&body).await;

    let status =
        StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        result.body,
    )
}
