//! Error types for the proxy core.
//!
//! Syscall wrappers return plain `io::Result`; everything that crosses a
//! module boundary is folded into [`Error`].

use crate::config::ConfigError;
use crate::http::{RequestError, UrlError};
use crate::utils::Handle;

use std::io;
use thiserror::Error;

/// Errors raised while setting up the proxy or serving one connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The client request is malformed or uses an unsupported method.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The request URL does not name a usable target.
    #[error(transparent)]
    Url(#[from] UrlError),

    /// The target hostname did not resolve to an IPv4 address.
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// A registry operation would break the one-to-one pairing or the
    /// non-empty request rule.
    #[error("cannot pair target with {client}: {reason}")]
    Pairing { client: Handle, reason: &'static str },

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Socket or poller failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Returns `true` for errors that only mean "try again on next readiness".
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
