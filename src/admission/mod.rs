//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! POST /convert
//!     → gate.rs (race: permit | timeout | cancellation)
//!     → Permit held for parsing + conversion
//!     → Permit dropped → slot returned to the pool
//! ```
//!
//! # Design Decisions
//! - Excess requests are rejected after a short wait, never queued indefinitely
//! - Release is tied to `Drop`, so every exit path returns the slot
//! - Cancellation is only observed while waiting for a slot

pub mod gate;

pub use gate::{AdmissionError, AdmissionGate, Permit, ADMISSION_TIMEOUT};
