//! HTTP request handling for the proxy.
//!
//! - [`url`]: resolves an absolute-form URL into host, port and path,
//! - [`request`]: parses the request head and rewrites it to origin-form.
//!
//! Only what a single-request, close-delimited `GET` proxy needs is
//! implemented; bodies and chunked encoding are never touched.

pub mod request;
pub mod url;

pub use request::{RequestError, RequestHead};
pub use url::{DEFAULT_PORT, TargetInfo, UrlError};
