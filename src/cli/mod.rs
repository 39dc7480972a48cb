//! Command-line interface: `sfx-export`.
//!
//! Validates a SignalFx exporter configuration, or pushes a handful of
//! gauges through a real exporter for smoke testing an ingest setup.

use crate::core::{Config, ConfigBuilder, ExporterError, Result};
use crate::export::translate::encode_batch;
use crate::export::{ExporterFactory, MemorySink, SignalFxFactory};
use crate::metrics::{Datapoint, MetricBatch};
use clap::Parser;
use humantime_serde::re::humantime;
use std::path::PathBuf;
use std::sync::Arc;

/// Push metrics to SignalFx, or check an exporter configuration
#[derive(Parser, Debug)]
#[command(name = "sfx-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Exporter configuration file (YAML)
    #[arg(short, long, env = "SFX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Access token, overrides the file
    #[arg(long, env = "SFX_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Realm, overrides the file
    #[arg(long, env = "SFX_REALM")]
    pub realm: Option<String>,

    /// Explicit ingest url, overrides the file
    #[arg(long)]
    pub url: Option<String>,

    /// Request timeout, e.g. `5s` or `750ms`
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<std::time::Duration>,

    /// Extra request header, `NAME=VALUE`; repeatable
    #[arg(long = "header", value_parser = parse_key_value)]
    pub headers: Vec<(String, String)>,

    /// Gauge to push, `METRIC=VALUE`; repeatable
    #[arg(long = "gauge", value_parser = parse_gauge)]
    pub gauges: Vec<(String, f64)>,

    /// Dimension attached to every gauge, `KEY=VALUE`; repeatable
    #[arg(long = "dimension", value_parser = parse_key_value)]
    pub dimensions: Vec<(String, String)>,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,

    /// Encode and print the request body instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, env = "SFX_DEBUG")]
    pub debug: bool,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

fn parse_gauge(raw: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = parse_key_value(raw)?;
    let value = value
        .parse::<f64>()
        .map_err(|e| format!("invalid value for gauge {:?}: {}", name, e))?;
    Ok((name, value))
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration: file first (or defaults), then flag overrides.
    ///
    /// The result is not validated here; the factory does that.
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::from_config(SignalFxFactory.create_default_config());

        if let Some(path) = &self.config {
            let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                ExporterError::config(format!("Failed to read config file {:?}: {}", path, e))
            })?;
            builder = builder.from_yaml(&content)?;
            tracing::info!("Loaded configuration from: {:?}", path);
        }

        Ok(self.apply_overrides(builder).into_config())
    }

    fn apply_overrides(&self, mut builder: ConfigBuilder) -> ConfigBuilder {
        if let Some(token) = &self.access_token {
            builder = builder.access_token(token.as_str());
        }
        if let Some(realm) = &self.realm {
            builder = builder.realm(realm.as_str());
        }
        if let Some(url) = &self.url {
            builder = builder.url(url.as_str());
        }
        if let Some(timeout) = self.timeout {
            // Out-of-range values saturate rather than fail.
            let timeout = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
            builder = builder.timeout(timeout);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    /// Gauges from the command line as one batch.
    pub fn batch(&self) -> MetricBatch {
        self.gauges
            .iter()
            .map(|(name, value)| {
                self.dimensions
                    .iter()
                    .fold(Datapoint::gauge(name.as_str(), *value), |point, (k, v)| {
                        point.with_dimension(k.as_str(), v.as_str())
                    })
            })
            .collect()
    }

    /// Initialize logging based on flags and environment.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level = std::env::var("SFX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .map_err(|e| ExporterError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the `sfx-export` command.
pub async fn execute(cli: Cli) -> Result<()> {
    cli.init_logging()?;
    run(&cli).await
}

/// Command body, without the process-wide logging setup.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = cli.load_config().await?;

    if cli.check_config {
        config.check_schema()?;
        config.validate()?;
        let url = config.ingest_url()?;
        println!("Configuration is valid!");
        println!("  Ingest url: {}", url);
        let timeout = config.timeout.to_std().unwrap_or_default();
        println!("  Timeout: {}", humantime::format_duration(timeout));
        println!("  Access token: {}", if config.access_token.is_empty() { "not set" } else { "set" });
        println!("  Extra headers: {}", config.headers.len());
        return Ok(());
    }

    let factory = SignalFxFactory;
    let logger = tracing::info_span!("sfx_export");
    let batch = cli.batch();

    if cli.dry_run {
        let sink = Arc::new(MemorySink::new());
        let exporter = factory.create_metrics_exporter_with_sink(&logger, &config, Arc::<MemorySink>::clone(&sink))?;
        exporter.push(&batch).await?;
        exporter.shutdown().await?;
        for sent in sink.batches() {
            println!("POST {}", exporter.ingest_url());
            println!("{}", String::from_utf8_lossy(&encode_batch(&sent)?));
        }
        return Ok(());
    }

    let exporter = factory.create_metrics_exporter(&logger, &config)?;
    let pushed = exporter.push(&batch).await;
    exporter.shutdown().await?;
    pushed?;

    let stats = exporter.stats();
    println!(
        "Sent {} datapoint(s) to {}",
        stats.datapoints_sent,
        exporter.ingest_url()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use crate::metrics::MetricValue;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sfx-export").chain(args.iter().copied())).unwrap()
    }

    fn config_file(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", yaml).unwrap();
        file
    }

    fn path_of(file: &tempfile::NamedTempFile) -> String {
        file.path().to_str().unwrap().to_string()
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("dot.test=test").unwrap(),
            ("dot.test".to_string(), "test".to_string())
        );
        assert_eq!(parse_key_value("k=a=b").unwrap().1, "a=b");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_parse_gauge() {
        assert_eq!(parse_gauge("cpu=0.5").unwrap(), ("cpu".to_string(), 0.5));
        assert!(parse_gauge("cpu=high").is_err());
    }

    #[tokio::test]
    async fn test_flags_override_defaults() {
        let cli = parse(&[
            "--realm",
            "us1",
            "--access-token",
            "testToken",
            "--timeout",
            "2s",
            "--header",
            "added-entry=added value",
        ]);

        let config = cli.load_config().await.unwrap();
        assert_eq!(config.realm, "us1");
        assert_eq!(config.access_token, "testToken");
        assert_eq!(config.timeout, chrono::Duration::seconds(2));
        assert_eq!(config.headers.get("added-entry").map(String::as_str), Some("added value"));
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_file_then_flags() {
        let file = config_file("realm: lab\ntimeout: 3s\naccess_token: fromFile");
        let cli = parse(&["--config", path_of(&file).as_str(), "--realm", "us0"]);

        // Only fields without an environment binding, or set by flag, are
        // asserted so exported SFX_* variables cannot change the outcome.
        let config = cli.load_config().await.unwrap();
        assert_eq!(config.realm, "us0");
        assert_eq!(config.timeout, chrono::Duration::seconds(3));
    }

    #[tokio::test]
    async fn test_check_config_valid() {
        let file = config_file("realm: us1\naccess_token: testToken\ntimeout: 2s");
        let cli = parse(&["--config", path_of(&file).as_str(), "--realm", "us1", "--check-config"]);
        assert!(run(&cli).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_config_missing_endpoint() {
        let file = config_file("{}");
        let cli = parse(&["--config", path_of(&file).as_str(), "--realm", "", "--check-config"]);
        let err = run(&cli).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingEndpoint);
    }

    #[tokio::test]
    async fn test_check_config_negative_timeout() {
        let file = config_file("realm: lab\ntimeout: -2s");
        let cli = parse(&["--config", path_of(&file).as_str(), "--check-config"]);
        let err = run(&cli).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTimeout);
    }

    #[tokio::test]
    async fn test_dry_run_stays_offline() {
        let file = config_file("{}");
        let cli = parse(&[
            "--config",
            path_of(&file).as_str(),
            "--dry-run",
            "--realm",
            "us1",
            "--gauge",
            "cpu=1",
        ]);
        assert!(run(&cli).await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_still_validates() {
        let file = config_file("{}");
        let cli = parse(&["--config", path_of(&file).as_str(), "--realm", "", "--dry-run"]);
        let err = run(&cli).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingEndpoint);
    }

    #[tokio::test]
    async fn test_missing_config_file() {
        let cli = parse(&["--config", "/nonexistent/sfx.yaml"]);
        let err = cli.load_config().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_batch_from_flags() {
        let cli = parse(&["--gauge", "cpu=0.5", "--gauge", "mem=42", "--dimension", "host=web-1"]);

        let batch = cli.batch();
        assert_eq!(batch.len(), 2);
        for point in &batch {
            assert_eq!(point.dimensions.get("host").map(String::as_str), Some("web-1"));
        }
        assert_eq!(batch.iter().nth(1).unwrap().value, MetricValue::Double(42.0));
    }
}
