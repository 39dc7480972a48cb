//! Configuration for the SignalFx metrics exporter.
//!
//! This module provides:
//! - The [`Config`] value object and its defaults
//! - Decoding of the host's YAML configuration block
//! - A structural schema check, separate from export validation
//! - Ingest endpoint resolution from realm or explicit URL

use crate::core::{validate, ExporterError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Identifier the pipeline host uses to route configuration blocks here.
pub const TYPE_STR: &str = "signalfx";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(5);

/// Host routing information for one exporter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterSettings {
    /// Exporter type, always [`TYPE_STR`] for this crate
    pub type_val: String,
    /// Instance name, `signalfx` or `signalfx/<suffix>`
    pub name: String,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            type_val: TYPE_STR.to_string(),
            name: TYPE_STR.to_string(),
        }
    }
}

/// SignalFx exporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Routing info, taken from the host's block key rather than its body
    #[serde(skip)]
    pub settings: ExporterSettings,
    /// Credential sent with every request
    pub access_token: String,
    /// Deployment realm, e.g. `us1`
    pub realm: String,
    /// Explicit endpoint, overrides the realm-derived one
    pub url: String,
    /// Per-request timeout
    #[serde(with = "signed_duration")]
    pub timeout: Duration,
    /// Extra request headers
    pub headers: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            settings: ExporterSettings::default(),
            access_token: String::new(),
            realm: String::new(),
            url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            headers: HashMap::new(),
        }
    }
}

impl Config {
    /// Decode a configuration block from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)
            .map_err(|e| ExporterError::config(format!("Failed to parse YAML config: {}", e)))?;
        Self::from_value(value)
    }

    /// Decode an already-parsed configuration block
    pub fn from_value(value: serde_yaml::Value) -> Result<Self> {
        // An empty block (`signalfx:` with nothing under it) arrives as null.
        if value.is_null() {
            return Ok(Config::default());
        }
        serde_yaml::from_value(value)
            .map_err(|e| ExporterError::config(format!("Invalid signalfx config: {}", e)))
    }

    /// Check export validity. See [`validate::validate`].
    pub fn validate(&self) -> Result<()> {
        validate::validate(self)
    }

    /// Check structural well-formedness, independent of export validity.
    pub fn check_schema(&self) -> Result<()> {
        if self.settings.type_val != TYPE_STR {
            return Err(ExporterError::config(format!(
                "exporter type must be \"{}\", got \"{}\"",
                TYPE_STR, self.settings.type_val
            )));
        }

        let name_ok = match self.settings.name.strip_prefix(TYPE_STR) {
            Some("") => true,
            Some(rest) => rest.len() > 1 && rest.starts_with('/'),
            None => false,
        };
        if !name_ok {
            return Err(ExporterError::config(format!(
                "exporter name must be \"{0}\" or \"{0}/<name>\", got \"{1}\"",
                TYPE_STR, self.settings.name
            )));
        }

        if self.headers.keys().any(String::is_empty) {
            return Err(ExporterError::config("header names must not be empty"));
        }

        Ok(())
    }

    /// Resolve the datapoint ingest endpoint.
    ///
    /// A non-empty `url` wins; otherwise the endpoint is derived from `realm`.
    pub fn ingest_url(&self) -> Result<Url> {
        let raw = if self.url.is_empty() {
            format!("https://ingest.{}.signalfx.com/v2/datapoint", self.realm)
        } else {
            self.url.clone()
        };

        let url = Url::parse(&raw)
            .map_err(|e| ExporterError::config(format!("Invalid ingest url {:?}: {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ExporterError::config(format!(
                "Ingest url must be http or https, got scheme {:?}",
                other
            ))),
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: Config) -> Self {
        ConfigBuilder { config }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        let settings = self.config.settings.clone();
        self.config = Config::from_yaml(yaml)?;
        self.config.settings = settings;
        Ok(self)
    }

    /// Set instance name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.settings.name = name.into();
        self
    }

    /// Set access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = token.into();
        self
    }

    /// Set realm
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.config.realm = realm.into();
        self
    }

    /// Set explicit ingest url
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add or replace one request header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Finish without validating; the factory validates on construction
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Humantime encoding for a signed duration: `"5s"`, `"1m 30s"`, `"-2s"`.
mod signed_duration {
    use chrono::Duration;
    use humantime_serde::re::humantime;
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let magnitude = value
            .abs()
            .to_std()
            .map_err(|e| S::Error::custom(e.to_string()))?;
        let text = humantime::format_duration(magnitude).to_string();
        if *value < Duration::zero() {
            serializer.serialize_str(&format!("-{}", text))
        } else {
            serializer.serialize_str(&text)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        let magnitude = humantime::parse_duration(body).map_err(D::Error::custom)?;
        let magnitude = Duration::from_std(magnitude).map_err(D::Error::custom)?;
        Ok(if negative { -magnitude } else { magnitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    #[test]
    fn test_default_config_is_well_formed_but_not_exportable() {
        let config = Config::default();
        assert!(config.check_schema().is_ok());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.headers.is_empty());
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::MissingEndpoint);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
access_token: testToken
realm: us1
timeout: 2s
headers:
  added-entry: added value
  dot.test: test
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.access_token, "testToken");
        assert_eq!(config.realm, "us1");
        assert_eq!(config.timeout, Duration::seconds(2));
        assert_eq!(config.headers.get("dot.test").map(String::as_str), Some("test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_timeout_decodes() {
        let config = Config::from_yaml("realm: lab\ntimeout: -2s\n").unwrap();
        assert_eq!(config.timeout, Duration::seconds(-2));
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::InvalidTimeout);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_yaml("realm: us1\nrelam: typo\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_empty_block_is_default() {
        let config = Config::from_value(serde_yaml::Value::Null).unwrap();
        assert_eq!(config, Config::default());

        for empty in ["", "~", "null", "---\n~\n"] {
            assert_eq!(Config::from_yaml(empty).unwrap(), Config::default(), "{:?}", empty);
        }
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        assert_eq!(Config::from_yaml("just text").unwrap_err().kind(), ErrorKind::Config);
        assert_eq!(Config::from_yaml("42").unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn test_timeout_serializes_humantime() {
        let config = ConfigBuilder::new()
            .realm("us1")
            .timeout(Duration::milliseconds(-1500))
            .config;
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("-1s 500ms"), "{}", yaml);
        let back = Config::from_yaml(&yaml).unwrap();
        assert_eq!(back.timeout, Duration::milliseconds(-1500));
    }

    #[test]
    fn test_schema_check_names() {
        let mut config = Config::default();
        config.settings.name = "signalfx/prod".to_string();
        assert!(config.check_schema().is_ok());

        config.settings.name = "signalfx/".to_string();
        assert!(config.check_schema().is_err());

        config.settings.name = "otlp".to_string();
        assert!(config.check_schema().is_err());

        let mut config = Config::default();
        config.settings.type_val = "otlp".to_string();
        assert!(config.check_schema().is_err());

        let mut config = Config::default();
        config.headers.insert(String::new(), "x".to_string());
        assert!(config.check_schema().is_err());
    }

    #[test]
    fn test_ingest_url_from_realm() {
        let config = ConfigBuilder::new().realm("us1").build().unwrap();
        assert_eq!(
            config.ingest_url().unwrap().as_str(),
            "https://ingest.us1.signalfx.com/v2/datapoint"
        );
    }

    #[test]
    fn test_ingest_url_override() {
        let config = ConfigBuilder::new()
            .realm("us1")
            .url("http://localhost:9943/v2/datapoint")
            .build()
            .unwrap();
        assert_eq!(config.ingest_url().unwrap().as_str(), "http://localhost:9943/v2/datapoint");

        let config = ConfigBuilder::new().url("not a url").build().unwrap();
        assert_eq!(config.ingest_url().unwrap_err().kind(), ErrorKind::Config);

        let config = ConfigBuilder::new().url("ftp://example.com/").build().unwrap();
        assert!(config.ingest_url().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .name("signalfx/edge")
            .access_token("testToken")
            .realm("eu0")
            .timeout(Duration::seconds(10))
            .header("X-Env", "prod")
            .build()
            .unwrap();

        assert_eq!(config.settings.name, "signalfx/edge");
        assert_eq!(config.access_token, "testToken");
        assert_eq!(config.realm, "eu0");
        assert_eq!(config.timeout, Duration::seconds(10));
        assert_eq!(config.headers.len(), 1);
    }

    #[test]
    fn test_builder_from_yaml_keeps_name() {
        let config = ConfigBuilder::new()
            .name("signalfx/2")
            .from_yaml("realm: us0")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.settings.name, "signalfx/2");
        assert_eq!(config.realm, "us0");
    }
}
