//! Decode → metadata → encode.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::codec::{CodecError, JpegTarget, Metadata, SourceDecoder};
use crate::convert::naming::output_name;
use crate::upload::UploadedImage;

/// Converted image ready to be written to the response.
#[derive(Debug)]
pub struct ConversionResult {
    pub bytes: Bytes,
    pub file_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The upload is not a readable source image.
    #[error("{0}")]
    Decode(#[source] CodecError),
    /// The target encoder failed.
    #[error("{0}")]
    Encode(#[source] CodecError),
    /// The blocking task running the conversion died.
    #[error("{0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for ConversionError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            ConversionError::Worker("conversion panicked".into())
        } else {
            ConversionError::Worker(err.to_string())
        }
    }
}

/// Stateless converter shared by all requests.
pub struct Converter {
    source: Arc<dyn SourceDecoder>,
    target: JpegTarget,
}

impl Converter {
    pub fn new(source: Arc<dyn SourceDecoder>, target: JpegTarget) -> Self {
        Self { source, target }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Run the whole pipeline for one upload. CPU-bound; call it from a
    /// blocking context.
    pub fn convert(&self, upload: UploadedImage) -> Result<ConversionResult, ConversionError> {
        let started = Instant::now();

        let image = self
            .source
            .decode(&upload.bytes)
            .map_err(ConversionError::Decode)?;

        let metadata = self.metadata(&upload.bytes);
        let file_name = output_name(&upload.file_name, upload.out_name.as_deref());

        let bytes = self
            .target
            .encode(&image, metadata.as_ref())
            .map_err(ConversionError::Encode)?;

        tracing::debug!(
            source = self.source.name(),
            width = image.width(),
            height = image.height(),
            input_bytes = upload.bytes.len(),
            output_bytes = bytes.len(),
            exif = metadata.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image converted"
        );

        Ok(ConversionResult {
            bytes: bytes.into(),
            file_name,
        })
    }

    fn metadata(&self, bytes: &[u8]) -> Option<Metadata> {
        match self.source.extract_metadata(bytes) {
            Ok(Some(metadata)) if !JpegTarget::can_embed(&metadata) => {
                tracing::warn!(bytes = metadata.as_bytes().len(), "EXIF data too large for JPEG, converting without it");
                None
            }
            Ok(Some(metadata)) => Some(metadata),
            Ok(None) => {
                tracing::debug!("No EXIF data found");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable EXIF data, converting without it");
                None
            }
        }
    }
}
