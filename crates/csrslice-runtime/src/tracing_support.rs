//! Structured logging for csrslice hosts
//!
//! Library code only emits `tracing` events and spans. Hosts that do not
//! install their own subscriber can call [`init_tracing`] (with the
//! `subscriber` feature) to get a `tracing-subscriber` fmt layer.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (default `csrslice=info,warn`)
//! - `CSRSLICE_LOG_FORMAT`: `pretty` (default), `json` or `compact`
//!
//! # Example
//!
//! ```ignore
//! use csrslice_runtime::tracing_support::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::default())?;
//! ```

use parking_lot::Mutex;

#[cfg(feature = "subscriber")]
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

pub const ENV_LOG_FORMAT: &str = "CSRSLICE_LOG_FORMAT";

const DEFAULT_FILTER: &str = "csrslice=info,warn";

static INSTALLED: Mutex<bool> = Mutex::new(false);

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line human-readable output
    Pretty,
    /// One JSON object per event
    Json,
    /// Single line per event
    Compact,
}

impl TracingFormat {
    /// Parse from string; unknown values fall back to `Pretty`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    /// Filter directive (e.g. "csrslice=debug,info")
    pub filter: String,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_file: bool,
    pub with_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = std::env::var(ENV_LOG_FORMAT)
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(TracingFormat::Pretty);

        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

/// Fmt layer for `config.format` with the shared field settings applied
#[cfg(feature = "subscriber")]
fn format_layer(config: &TracingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let base = fmt::layer()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number);

    match config.format {
        TracingFormat::Pretty => base.pretty().with_ansi(config.with_ansi).boxed(),
        // JSON output never carries color codes
        TracingFormat::Json => base.json().boxed(),
        TracingFormat::Compact => base.compact().with_ansi(config.with_ansi).boxed(),
    }
}

/// Install a global subscriber built from `config`
///
/// Returns `Ok(true)` when this call installed it and `Ok(false)` when an
/// earlier call already did, so repeated initialisation is harmless. Fails if
/// the filter does not parse or a foreign subscriber owns the global slot.
#[cfg(feature = "subscriber")]
pub fn init_tracing(config: TracingConfig) -> anyhow::Result<bool> {
    let mut installed = INSTALLED.lock();
    if *installed {
        return Ok(false);
    }
    let filter = EnvFilter::try_new(&config.filter)?;

    tracing_subscriber::registry()
        .with(format_layer(&config).with_filter(filter))
        .try_init()?;
    *installed = true;
    Ok(true)
}

/// Stub for when the subscriber feature is disabled
#[cfg(not(feature = "subscriber"))]
pub fn init_tracing(_config: TracingConfig) -> anyhow::Result<bool> {
    let mut installed = INSTALLED.lock();
    let first = !*installed;
    *installed = true;
    Ok(first)
}
