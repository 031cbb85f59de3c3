//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, static files)
//!     → request.rs (request ID, per-request span)
//!     → handlers.rs (admission → upload → conversion)
//!     → response.rs (status + text body, or image/jpeg)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::ServiceError;
pub use server::{AppState, HttpServer};
