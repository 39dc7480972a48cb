//! Export validation for [`Config`].
//!
//! Rules run in a fixed order and the first failure is returned:
//! 1. the timeout must not be negative
//! 2. at least one of `realm` and `url` must be set
//!
//! The access token is not checked; an empty one is legal here.

use crate::core::{Config, ExporterError, Result};
use chrono::Duration;

/// Check that `config` can be used to build an exporter.
pub fn validate(config: &Config) -> Result<()> {
    if config.timeout < Duration::zero() {
        return Err(ExporterError::InvalidTimeout);
    }

    if config.realm.is_empty() && config.url.is_empty() {
        return Err(ExporterError::MissingEndpoint);
    }

    Ok(())
}
