use thiserror::Error;

/// Upper bound on header lines accepted in one request head.
const MAX_HEADERS: usize = 64;

/// Reasons a client request cannot be forwarded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The blank line ending the header block was not received.
    #[error("request head is incomplete")]
    Incomplete,

    /// The request line or a header is not valid HTTP/1.x.
    #[error("malformed request: {0}")]
    Malformed(#[from] httparse::Error),

    /// Only `GET` is proxied.
    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),
}

/// The parsed head of a client request.
///
/// Borrows the raw bytes it was parsed from, so the header block can be
/// forwarded byte-for-byte.
#[derive(Debug)]
pub struct RequestHead<'a> {
    raw: &'a [u8],

    /// Request method as sent by the client.
    pub method: &'a str,

    /// Request target, absolute-form for proxied requests.
    pub target: &'a str,

    /// Minor HTTP version (`1` for `HTTP/1.1`).
    pub version: u8,

    /// Offset just past the request line's terminator.
    line_len: usize,

    /// Length of the whole head including the terminating blank line.
    head_len: usize,
}

impl<'a> RequestHead<'a> {
    /// Locates the request line and header block in `raw`.
    ///
    /// Fails with [`RequestError::Incomplete`] when the header terminator has
    /// not been received yet.
    pub fn parse(raw: &'a [u8]) -> Result<Self, RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut request = httparse::Request::new(&mut headers);

        let head_len = match request.parse(raw)? {
            httparse::Status::Complete(len) => len,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let (Some(method), Some(target), Some(version)) =
            (request.method, request.path, request.version)
        else {
            return Err(RequestError::Incomplete);
        };

        // Blank lines before the request line are tolerated by the parser.
        let line_start = raw
            .iter()
            .position(|&b| b != b'\r' && b != b'\n')
            .ok_or(RequestError::Incomplete)?;
        let line_len = raw[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| line_start + i + 1)
            .ok_or(RequestError::Incomplete)?;

        Ok(Self {
            raw,
            method,
            target,
            version,
            line_len,
            head_len,
        })
    }

    /// Returns `true` for `GET`, compared case-insensitively.
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// The header lines and terminating blank line, exactly as received.
    pub fn header_block(&self) -> &'a [u8] {
        &self.raw[self.line_len..self.head_len]
    }

    /// Builds the origin-form request sent to the target.
    ///
    /// The request line becomes `METHOD <path> HTTP/1.x` and the header block
    /// follows unchanged. Anything after the head is dropped.
    pub fn rewrite(&self, path: &str) -> Result<Vec<u8>, RequestError> {
        if !self.is_get() {
            return Err(RequestError::UnsupportedMethod(self.method.to_owned()));
        }

        let line = format!("{} {} HTTP/1.{}\r\n", self.method, path, self.version);
        let headers = self.header_block();

        let mut request = Vec::with_capacity(line.len() + headers.len());
        request.extend_from_slice(line.as_bytes());
        request.extend_from_slice(headers);

        Ok(request)
    }
}
