//! Request handlers.
//!
//! `post_convert` drives one conversion:
//!
//! ```text
//! GateWait ──timeout──▶ 429
//!    │  └──cancelled──▶ 408
//!    ▼
//! Parsing ──error──▶ 400 / 422
//!    ▼
//! Decoding ──error──▶ 422      (blocking thread, permit moves with it)
//!    ▼
//! Encoding ──error──▶ 500
//!    ▼
//! 200 image/jpeg, counter + 1
//! ```
//!
//! The permit is released on every path out of `GateWait`, and the body is
//! drained before the handler returns.

use std::time::Instant;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::convert::{ConversionError, ConversionResult};
use crate::http::response::ServiceError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upload::{self, ParseError};

/// GET /check
pub async fn get_check() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "Probably fine.")
}

/// GET /count
pub async fn get_count(State(state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], state.counter.read().to_string())
}

/// POST /convert
pub async fn post_convert(
    State(state): State<AppState>,
    mut multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();

    let outcome = admit_and_convert(&state, multipart.as_mut()).await;

    if let Ok(multipart) = multipart.as_mut() {
        upload::drain(multipart).await;
    }

    match outcome {
        Ok(result) => {
            tracing::info!(file_name = %result.file_name, bytes = result.bytes.len(), "Conversion complete");
            metrics::record_conversion("success", started);
            result.into_response()
        }
        Err(err) => {
            match &err {
                ServiceError::Admission(_) => metrics::record_rejection(err.kind()),
                _ => metrics::record_conversion(err.kind(), started),
            }
            err.into_response()
        }
    }
}

async fn admit_and_convert(
    state: &AppState,
    multipart: Result<&mut Multipart, &mut MultipartRejection>,
) -> Result<ConversionResult, ServiceError> {
    let cancel = state.shutdown.child_token();
    let permit = state.gate.acquire(state.admission_timeout, &cancel).await?;
    tracing::debug!(in_flight = state.gate.in_flight(), "Conversion slot acquired");

    let multipart = multipart.map_err(|rejection| ParseError::NotMultipart(rejection.body_text()))?;
    let upload = upload::read_upload(multipart, state.max_upload_bytes).await?;
    metrics::record_upload(upload.bytes.len());

    // Cancellation is no longer observed from here on: once started, the
    // conversion runs to completion and keeps its slot until it does.
    let converter = state.converter.clone();
    let converted = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        converter.convert(upload)
    })
    .await
    .map_err(ConversionError::from)??;

    state.counter.increment();
    Ok(converted)
}
