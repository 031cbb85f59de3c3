//! Response mapping.
//!
//! # Responsibilities
//! - Turn every request failure into one status and a plain-text body
//! - Write converted images with exact length and disposition headers
//!
//! # Design Decisions
//! - Failures are logged once, here, at the level their class deserves
//! - Bodies keep the phrasing clients of the form page already see

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::admission::AdmissionError;
use crate::codec::JpegTarget;
use crate::convert::{ConversionError, ConversionResult};
use crate::upload::ParseError;

/// Anything that can end a conversion request early.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    #[error(transparent)]
    Upload(#[from] ParseError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Admission(AdmissionError::TooManyRequests(_)) => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Admission(AdmissionError::Aborted) => StatusCode::REQUEST_TIMEOUT,
            ServiceError::Upload(ParseError::PayloadTooLarge { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Upload(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conversion(ConversionError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Admission(AdmissionError::TooManyRequests(_)) => "timeout",
            ServiceError::Admission(AdmissionError::Aborted) => "aborted",
            ServiceError::Upload(ParseError::PayloadTooLarge { .. }) => "too_large",
            ServiceError::Upload(_) => "bad_request",
            ServiceError::Conversion(ConversionError::Decode(_)) => "decode_error",
            ServiceError::Conversion(ConversionError::Encode(_)) => "encode_error",
            ServiceError::Conversion(ConversionError::Worker(_)) => "worker_error",
        }
    }

    fn body(&self) -> String {
        match self {
            ServiceError::Admission(AdmissionError::TooManyRequests(_)) => {
                "Too many concurrent requests, try again later".to_string()
            }
            ServiceError::Admission(e @ AdmissionError::Aborted) => format!("Request timeout: {e}"),
            ServiceError::Upload(e @ (ParseError::NotMultipart(_) | ParseError::Multipart(_))) => {
                format!("Error reading body: {e}")
            }
            ServiceError::Upload(e @ (ParseError::NameTooLong | ParseError::InvalidName(_))) => {
                format!("Error reading outname: {e}")
            }
            ServiceError::Upload(e @ ParseError::PayloadTooLarge { .. }) => {
                format!("Error reading image data: {e}")
            }
            ServiceError::Conversion(e @ ConversionError::Decode(_)) => format!("Error decoding file: {e}"),
            ServiceError::Conversion(e @ ConversionError::Encode(_)) => format!("Error encoding to jpeg: {e}"),
            ServiceError::Conversion(e @ ConversionError::Worker(_)) => {
                format!("Conversion worker failed: {e}")
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ServiceError::Admission(AdmissionError::TooManyRequests(_)) => {
                tracing::warn!("Took too long to acquire a conversion slot");
            }
            e if status.is_server_error() => tracing::error!(error = %e, status = %status, "Conversion failed"),
            e => tracing::warn!(error = %e, status = %status, "Request rejected"),
        }

        (status, [(header::CONTENT_TYPE, "text/plain")], self.body()).into_response()
    }
}

impl IntoResponse for ConversionResult {
    fn into_response(self) -> Response {
        let disposition = HeaderValue::from_str(&format!("inline; filename={}", self.file_name))
            .unwrap_or_else(|_| HeaderValue::from_static("inline"));

        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(JpegTarget::CONTENT_TYPE)),
                (header::CONTENT_DISPOSITION, disposition),
                (header::CONTENT_LENGTH, HeaderValue::from(self.bytes.len())),
            ],
            self.bytes,
        )
            .into_response()
    }
}
