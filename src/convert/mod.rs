//! Conversion pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! UploadedImage
//!     → decode            (fatal: 422)
//!     → extract metadata  (best effort: Option<Metadata>)
//!     → resolve name
//!     → encode + inject   (fatal: 500)
//!     → ConversionResult
//! ```
//!
//! # Design Decisions
//! - Runs synchronously; the HTTP layer moves it onto a blocking thread
//! - Never retries; every failure is terminal for the request only
//! - A missing or unreadable metadata block never fails the conversion

pub mod naming;
pub mod pipeline;

pub use naming::output_name;
pub use pipeline::{ConversionError, ConversionResult, Converter};
