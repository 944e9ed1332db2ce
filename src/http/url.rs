use std::fmt;
use thiserror::Error;

/// Port used when the URL does not name one.
pub const DEFAULT_PORT: u16 = 80;

/// Longest hostname accepted in a request URL.
const MAX_HOST_LEN: usize = 255;

const SCHEME: &str = "http://";

/// Reasons an absolute-form URL cannot be turned into a target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    /// The URL does not start with `http://`.
    #[error("not an absolute http URL: {0:?}")]
    NotAbsolute(String),

    /// Nothing between the scheme and the port or path.
    #[error("URL has no hostname")]
    MissingHost,

    /// The hostname exceeds the supported length.
    #[error("hostname longer than 255 bytes")]
    HostTooLong,

    /// The port is not a number in `1..=65535`.
    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// Where a client request should be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetInfo {
    /// Origin hostname or IPv4 literal.
    pub host: String,

    /// Origin TCP port.
    pub port: u16,

    /// Origin-relative path, always starting with `/`.
    pub path: String,
}

impl TargetInfo {
    /// Parses an absolute-form URL of the shape `http://host[:port][/path]`.
    ///
    /// The port defaults to 80 and the path to `/`. A query without a path
    /// (`http://host?q`) is given a leading `/`.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let rest = url
            .get(..SCHEME.len())
            .filter(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
            .map(|_| &url[SCHEME.len()..])
            .ok_or_else(|| UrlError::NotAbsolute(url.to_owned()))?;

        let host_end = rest.find([':', '/', '?']).unwrap_or(rest.len());
        let (host, rest) = rest.split_at(host_end);

        if host.is_empty() {
            return Err(UrlError::MissingHost);
        }
        if host.len() > MAX_HOST_LEN {
            return Err(UrlError::HostTooLong);
        }

        let (port, rest) = match rest.strip_prefix(':') {
            Some(after) => {
                let port_end = after.find(['/', '?']).unwrap_or(after.len());
                let (digits, rest) = after.split_at(port_end);
                (parse_port(digits)?, rest)
            }
            None => (DEFAULT_PORT, rest),
        };

        let path = match rest {
            "" => "/".to_owned(),
            query if query.starts_with('?') => format!("/{query}"),
            path => path.to_owned(),
        };

        Ok(Self {
            host: host.to_owned(),
            port,
            path,
        })
    }
}

fn parse_port(digits: &str) -> Result<u16, UrlError> {
    match digits.parse::<u16>() {
        Ok(port) if port != 0 && digits.bytes().all(|b| b.is_ascii_digit()) => Ok(port),
        _ => Err(UrlError::InvalidPort(digits.to_owned())),
    }
}

impl fmt::Display for TargetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str, port: u16, path: &str) -> TargetInfo {
        TargetInfo {
            host: host.to_owned(),
            port,
            path: path.to_owned(),
        }
    }

    #[test]
    fn bare_host_gets_default_port_and_root_path() {
        assert_eq!(
            TargetInfo::parse("http://example.com").unwrap(),
            target("example.com", 80, "/")
        );
    }

    #[test]
    fn explicit_port_and_path() {
        assert_eq!(
            TargetInfo::parse("http://localhost:9000/a/b?x=1").unwrap(),
            target("localhost", 9000, "/a/b?x=1")
        );
        assert_eq!(
            TargetInfo::parse("http://localhost:9000").unwrap(),
            target("localhost", 9000, "/")
        );
    }

    #[test]
    fn path_without_port() {
        assert_eq!(
            TargetInfo::parse("http://example.com/index.html").unwrap(),
            target("example.com", 80, "/index.html")
        );
        assert_eq!(
            TargetInfo::parse("HTTP://example.com?q").unwrap(),
            target("example.com", 80, "/?q")
        );
    }

    #[test]
    fn rejects_non_absolute_urls() {
        assert!(matches!(
            TargetInfo::parse("/relative"),
            Err(UrlError::NotAbsolute(_))
        ));
        assert!(matches!(
            TargetInfo::parse("https://example.com/"),
            Err(UrlError::NotAbsolute(_))
        ));
    }

    #[test]
    fn rejects_missing_host_and_bad_port() {
        assert_eq!(TargetInfo::parse("http:///path"), Err(UrlError::MissingHost));
        assert_eq!(TargetInfo::parse("http://:80/"), Err(UrlError::MissingHost));
        assert_eq!(
            TargetInfo::parse("http://host:http/"),
            Err(UrlError::InvalidPort("http".to_owned()))
        );
        assert_eq!(
            TargetInfo::parse("http://host:0/"),
            Err(UrlError::InvalidPort("0".to_owned()))
        );
        assert_eq!(
            TargetInfo::parse("http://host:+80/"),
            Err(UrlError::InvalidPort("+80".to_owned()))
        );
    }

    #[test]
    fn rejects_oversized_host() {
        let url = format!("http://{}/", "a".repeat(256));
        assert_eq!(TargetInfo::parse(&url), Err(UrlError::HostTooLong));
    }
}
