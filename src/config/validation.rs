//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, ports valid, quality 1-100)
//! - Check that addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::ServiceConfig;

/// Largest accepted upload ceiling. Keeps `max_size_mb << 20` well inside u64.
pub const MAX_SIZE_MB_CEILING: u64 = 1 << 20;

/// Largest accepted `max_concurrent`.
pub const MAX_CONCURRENT_CEILING: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.ip {0:?} is not an IP address")]
    InvalidIp(String),
    #[error("listener.port must not be 0")]
    ZeroPort,
    #[error("limits.max_size_mb must be between 1 and {MAX_SIZE_MB_CEILING}, got {0}")]
    MaxSize(u64),
    #[error("limits.max_concurrent must be between 1 and {MAX_CONCURRENT_CEILING}, got {0}")]
    MaxConcurrent(usize),
    #[error("static_files.serve_path must not be empty")]
    EmptyServePath,
    #[error("conversion.jpeg_quality must be between 1 and 100, got {0}")]
    JpegQuality(u8),
    #[error("timeouts.request_secs must not be 0")]
    ZeroRequestTimeout,
    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.ip.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidIp(config.listener.ip.clone()));
    }
    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if !(1..=MAX_SIZE_MB_CEILING).contains(&config.limits.max_size_mb) {
        errors.push(ValidationError::MaxSize(config.limits.max_size_mb));
    }
    if !(1..=MAX_CONCURRENT_CEILING).contains(&config.limits.max_concurrent) {
        errors.push(ValidationError::MaxConcurrent(config.limits.max_concurrent));
    }
    if config.static_files.serve_path.trim().is_empty() {
        errors.push(ValidationError::EmptyServePath);
    }
    if !(1..=100).contains(&config.conversion.jpeg_quality) {
        errors.push(ValidationError::JpegQuality(config.conversion.jpeg_quality));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServiceConfig::default();
        config.listener.ip = "localhost".into();
        config.listener.port = 0;
        config.limits.max_size_mb = 0;
        config.limits.max_concurrent = 0;
        config.conversion.jpeg_quality = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidIp("localhost".into()),
                ValidationError::ZeroPort,
                ValidationError::MaxSize(0),
                ValidationError::MaxConcurrent(0),
                ValidationError::JpegQuality(0),
            ]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MetricsAddress("nowhere".into())]
        );
    }
}
