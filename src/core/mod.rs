//! Configuration, validation and error types for the SignalFx exporter.
//!
//! Nothing here touches the network; everything in this module is
//! decided before an exporter is constructed.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod validate;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, ExporterSettings, DEFAULT_TIMEOUT, TYPE_STR};
pub use error::{ErrorKind, ExporterError, Result};
