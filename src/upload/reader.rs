//! Multipart form reader for conversion uploads.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};

/// Cap on the client-supplied output file name.
pub const MAX_OUTNAME_BYTES: usize = 512;

/// A parsed upload. Lives only as long as the request.
#[derive(Debug, Default)]
pub struct UploadedImage {
    /// Raw bytes of the `infile` part. Empty when the part was missing.
    pub bytes: Bytes,
    /// File name declared on the `infile` part.
    pub file_name: String,
    /// Non-empty `outname` value, if one was sent.
    pub out_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("not a multipart form: {0}")]
    NotMultipart(String),
    #[error("{0}")]
    Multipart(String),
    #[error("file exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },
    #[error("output name exceeds {MAX_OUTNAME_BYTES} bytes")]
    NameTooLong,
    #[error("output name {0}")]
    InvalidName(&'static str),
}

enum ReadError {
    LimitExceeded,
    Transport(MultipartError),
}

/// Parse the conversion form.
///
/// `infile` is read up to `max_file_bytes` inclusive. A missing `infile` is
/// not an error here; decoding the empty input fails later.
pub async fn read_upload(
    multipart: &mut Multipart,
    max_file_bytes: u64,
) -> Result<UploadedImage, ParseError> {
    let mut upload = UploadedImage::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| classify(e, max_file_bytes))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("infile") => {
                upload.file_name = field.file_name().unwrap_or_default().to_string();
                upload.bytes = read_limited(field, max_file_bytes)
                    .await
                    .map_err(|e| match e {
                        ReadError::LimitExceeded => ParseError::PayloadTooLarge {
                            limit: max_file_bytes,
                        },
                        ReadError::Transport(e) => classify(e, max_file_bytes),
                    })?;
                tracing::debug!(
                    file_name = %upload.file_name,
                    bytes = upload.bytes.len(),
                    "Read image data"
                );
            }
            Some("outname") => {
                let raw = read_limited(field, MAX_OUTNAME_BYTES as u64)
                    .await
                    .map_err(|e| match e {
                        ReadError::LimitExceeded => ParseError::NameTooLong,
                        ReadError::Transport(e) => classify(e, max_file_bytes),
                    })?;
                upload.out_name = parse_out_name(raw)?;
            }
            Some("submit") => {}
            other => {
                tracing::warn!(field = other.unwrap_or("<unnamed>"), "Unexpected form field seen");
            }
        }
    }

    Ok(upload)
}

/// Discard the rest of the body so the connection can be reused.
pub async fn drain(multipart: &mut Multipart) {
    let mut discarded = 0usize;
    while let Ok(Some(mut field)) = multipart.next_field().await {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => discarded += chunk.len(),
                Ok(None) => break,
                Err(_) => return,
            }
        }
    }
    if discarded > 0 {
        tracing::trace!(bytes = discarded, "Drained unread request body");
    }
}

async fn read_limited(mut field: Field<'_>, limit: u64) -> Result<Bytes, ReadError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(ReadError::Transport)? {
        if (buf.len() + chunk.len()) as u64 > limit {
            return Err(ReadError::LimitExceeded);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn parse_out_name(raw: Bytes) -> Result<Option<String>, ParseError> {
    let name = String::from_utf8(raw.to_vec()).map_err(|_| ParseError::InvalidName("is not UTF-8"))?;
    if name.chars().any(char::is_control) {
        return Err(ParseError::InvalidName("contains control characters"));
    }
    Ok(Some(name).filter(|n| !n.is_empty()))
}

// The route body limit surfaces as a multipart error with a 413 status.
fn classify(err: MultipartError, limit: u64) -> ParseError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ParseError::PayloadTooLarge { limit }
    } else {
        ParseError::Multipart(err.body_text())
    }
}
