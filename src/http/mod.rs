pub mod headers;
pub mod request;
pub mod response;
pub mod status;

/// HTTP versions a request head can carry.
/// Only HTTP/1.x framing reaches the assembler; the minor version decides
/// the default keep-alive behaviour (see [`RequestHead::is_keep_alive`](request::RequestHead::is_keep_alive)).
#[derive(PartialEq, PartialOrd, Debug, Clone, Copy)]
pub enum HttpVersion {
    V1_0,
    V1_1,
}

impl HttpVersion {
    /// Maps the minor version reported by the head parser.
    pub fn from_minor(minor: u8) -> Option<HttpVersion> {
        match minor {
            0 => Some(HttpVersion::V1_0),
            1 => Some(HttpVersion::V1_1),
            _ => None,
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    Unknown,
}

pub fn http_method_from_str(method: &str) -> HttpMethod {
    match method {
        "GET" => HttpMethod::Get,
        "HEAD" => HttpMethod::Head,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        "TRACE" => HttpMethod::Trace,
        "OPTIONS" => HttpMethod::Options,
        "CONNECT" => HttpMethod::Connect,
        "PATCH" => HttpMethod::Patch,
        _ => HttpMethod::Unknown,
    }
}
