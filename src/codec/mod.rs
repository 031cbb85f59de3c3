//! Image codec seam.
//!
//! # Data Flow
//! ```text
//! uploaded bytes
//!     → SourceDecoder::decode            (heif.rs, or png.rs without `heif`)
//!     → SourceDecoder::extract_metadata  (same raw bytes, best effort)
//!     → JpegTarget::encode               (jpeg.rs, EXIF injected as APP1)
//! ```
//!
//! # Design Decisions
//! - Exactly one source format per build, selected by cargo feature
//! - Metadata is carried as an opaque APP1 EXIF payload, never parsed
//! - Codecs are synchronous; callers run them off the async runtime

pub mod jpeg;
pub mod png;

#[cfg(feature = "heif")]
pub mod heif;

use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;

pub use jpeg::{ExifWriter, JpegTarget};

/// Identifier that opens an EXIF APP1 payload.
pub const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Errors raised by codec backends.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{0}")]
    Decode(String),
    #[error("malformed metadata: {0}")]
    Metadata(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An opaque EXIF block in APP1 payload form (`Exif\0\0` followed by the
/// TIFF structure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata(Bytes);

impl Metadata {
    /// Wrap a bare TIFF structure, prefixing the EXIF identifier.
    pub fn from_tiff(tiff: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(EXIF_HEADER.len() + tiff.len());
        payload.extend_from_slice(EXIF_HEADER);
        payload.extend_from_slice(tiff);
        Self(payload.into())
    }

    /// Wrap a block that already carries the EXIF identifier.
    pub fn from_payload(payload: impl Into<Bytes>) -> Result<Self, CodecError> {
        let payload = payload.into();
        if !payload.starts_with(EXIF_HEADER) {
            return Err(CodecError::Metadata("missing Exif identifier".into()));
        }
        Ok(Self(payload))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Decoder for the service's source container format.
pub trait SourceDecoder: Send + Sync {
    /// Short format name for logs.
    fn name(&self) -> &'static str;

    /// Decode the primary image.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError>;

    /// Look for an embedded EXIF block.
    ///
    /// `Ok(None)` means the container has none; `Err` means it had one we
    /// could not read.
    fn extract_metadata(&self, bytes: &[u8]) -> Result<Option<Metadata>, CodecError>;
}

/// The source decoder compiled into this build.
pub fn default_source() -> Arc<dyn SourceDecoder> {
    #[cfg(feature = "heif")]
    {
        Arc::new(heif::HeifDecoder::new())
    }
    #[cfg(not(feature = "heif"))]
    {
        Arc::new(png::PngDecoder)
    }
}
