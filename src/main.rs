use clap::Parser;
use sluice::{Config, Proxy, logging};

use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::parse();
    logging::init(config.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.listen_addr(),
        buffer_size = config.buffer_size,
        max_events = config.max_events,
        idle_timeout_ms = config.idle_timeout_ms,
        "sluice starting"
    );

    let mut proxy = match Proxy::bind(&config) {
        Ok(proxy) => proxy,
        Err(err) => {
            tracing::error!(error = %err, "failed to start");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = proxy.run() {
        tracing::error!(error = %err, "event loop failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
