//! HEIC to JPEG conversion service.
//!
//! Accepts an image upload on `POST /convert`, decodes it, carries its EXIF
//! block across and answers with a JPEG. At most `max_concurrent`
//! conversions run at once; requests that cannot get a slot within two
//! seconds are turned away with 429.
//!
//! The HEIF decoder links against libheif and comes with the default `heif`
//! feature. Without it the service accepts PNG sources.

// Core pipeline
pub mod admission;
pub mod codec;
pub mod convert;
pub mod upload;

// Serving
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
