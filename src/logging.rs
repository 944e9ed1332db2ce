//! Structured logging.
//!
//! Uses `tracing` throughout the crate. The subscriber honours `RUST_LOG`
//! and falls back to `sluice=info`; output is pretty text for terminals or
//! JSON for log shippers.

use crate::config::LogFormat;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "sluice=info";

/// Installs the global subscriber.
///
/// Calling it twice is harmless; the second installation is ignored.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    let _ = match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
}
