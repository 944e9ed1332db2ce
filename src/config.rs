//! Command-line and environment configuration.
//!
//! Every flag can also be set through a `SLUICE_*` environment variable.
//! Defaults reproduce the classic fixed setup: port 8081, backlog 15,
//! 8 KiB buffers and 200 events per poll.

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Output format of the log subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,

    /// One JSON object per event.
    Json,
}

/// A configuration value outside its valid range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Proxy configuration.
#[derive(Clone, Debug, Parser)]
#[command(name = "sluice", version, about = "Single-threaded forward HTTP proxy")]
pub struct Config {
    /// Address to bind the listening socket to.
    #[arg(long, env = "SLUICE_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port to listen on (0 picks a free port).
    #[arg(short, long, env = "SLUICE_PORT", default_value_t = 8081)]
    pub port: u16,

    /// Accept backlog of the listening socket.
    #[arg(long, env = "SLUICE_BACKLOG", default_value_t = 15)]
    pub backlog: i32,

    /// Size of the receive buffer, which bounds one request head and one
    /// relayed chunk.
    #[arg(long, env = "SLUICE_BUFFER_SIZE", default_value_t = 8192)]
    pub buffer_size: usize,

    /// Maximum readiness events handled per poll.
    #[arg(long, env = "SLUICE_MAX_EVENTS", default_value_t = 200)]
    pub max_events: usize,

    /// Destroy half-connections idle for this many milliseconds (0 disables).
    #[arg(long, env = "SLUICE_IDLE_TIMEOUT_MS", default_value_t = 0)]
    pub idle_timeout_ms: u64,

    /// Log output format.
    #[arg(long, env = "SLUICE_LOG_FORMAT", value_enum, default_value_t)]
    pub log_format: LogFormat,
}

impl Config {
    /// Checks values clap cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backlog <= 0 {
            return Err(ConfigError::Zero("backlog"));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Zero("buffer_size"));
        }
        if self.max_events == 0 {
            return Err(ConfigError::Zero("max_events"));
        }
        Ok(())
    }

    /// The socket address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Idle eviction delay, if enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8081,
            backlog: 15,
            buffer_size: 8192,
            max_events: 200,
            idle_timeout_ms: 0,
            log_format: LogFormat::Pretty,
        }
    }
}
