use crate::http::headers::HttpHeaders;
use crate::http::{HttpMethod, HttpVersion};

/// Request line and headers of one logical request, as delivered by the
/// framing layer.
///
/// `decode_ok` is false when the framing layer could not make sense of the
/// head. The head is still delivered so that the assembler can answer with
/// a `400 Bad Request` instead of dropping the connection.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: HttpMethod,
    pub uri: String,
    pub version: HttpVersion,
    pub headers: HttpHeaders,
    pub decode_ok: bool,
}

impl RequestHead {
    pub fn new(method: HttpMethod, uri: &str, version: HttpVersion) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            version,
            headers: HttpHeaders::new(),
            decode_ok: true,
        }
    }

    /// Head standing in for a request line that failed to decode.
    pub fn malformed() -> Self {
        Self {
            method: HttpMethod::Unknown,
            uri: "/".to_string(),
            version: HttpVersion::V1_0,
            headers: HttpHeaders::new(),
            decode_ok: false,
        }
    }

    /// Persistent connection negotiation: HTTP/1.1 keeps the connection
    /// unless `Connection: close` is sent, HTTP/1.0 closes it unless
    /// `Connection: keep-alive` is sent.
    pub fn is_keep_alive(&self) -> bool {
        if self.headers.has_token("Connection", "close") {
            return false;
        }
        match self.version {
            HttpVersion::V1_1 => true,
            HttpVersion::V1_0 => self.headers.has_token("Connection", "keep-alive"),
        }
    }

    /// Body length announced by `Content-Length`. Any transfer coding
    /// takes precedence, in which case no length is declared.
    pub fn declared_length(&self) -> Option<usize> {
        if self.headers.get("Transfer-Encoding").is_some() {
            return None;
        }
        self.headers
            .get("Content-Length")
            .and_then(|value| value.trim().parse::<usize>().ok())
    }

    /// `Expect: 100-continue` only has meaning for HTTP/1.1 clients.
    pub fn expects_continue(&self) -> bool {
        self.version == HttpVersion::V1_1 && self.headers.has_token("Expect", "100-continue")
    }
}

/// A discrete unit of delivery from the framing layer.
///
/// Per logical request the order is fixed: one `Head`, zero or more `Body`,
/// exactly one `End`.
#[derive(Debug, Clone)]
pub enum Event {
    Head(RequestHead),
    Body(Vec<u8>),
    End { decode_ok: bool },
}
