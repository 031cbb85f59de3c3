//! Upload parsing subsystem.
//!
//! # Data Flow
//! ```text
//! multipart/form-data body
//!     → reader.rs (one part at a time)
//!         infile  → bounded read (max_size_mb)
//!         outname → bounded read (512 bytes)
//!         submit  → ignored
//!         other   → ignored, logged
//!     → UploadedImage (request-scoped, never persisted)
//! ```
//!
//! # Design Decisions
//! - The raw body is never buffered beyond the current part
//! - Size overruns are reported separately from transport failures
//! - Whatever is left of the body is drained before the handler returns

pub mod reader;

pub use reader::{drain, read_upload, ParseError, UploadedImage, MAX_OUTNAME_BYTES};
