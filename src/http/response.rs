use std::time::SystemTime;

use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

pub enum ResponseHeader {
    ContentLength,
    ContentType,
    Connection,
    Server,
    Date,
    WwwAuthenticate,
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: HttpStatus,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            body: Vec::new(),
        }
    }

    /// A JSON response whose `Content-Length` matches the byte length of `body`.
    pub fn json(status: HttpStatus, body: String) -> Self {
        let mut res = Self::new(status);
        res.body = body.into_bytes();
        res.set_header(ResponseHeader::ContentType, JSON_CONTENT_TYPE);
        res.set_header(ResponseHeader::ContentLength, &res.body.len().to_string());
        res
    }

    /// `401 Unauthorized` carrying a Basic challenge for `realm` and no body.
    pub fn unauthorized(realm: &str) -> Self {
        let mut res = Self::new(HttpStatus::UNAUTHORIZED);
        res.set_header(
            ResponseHeader::WwwAuthenticate,
            &format!("Basic realm=\"{}\"", realm),
        );
        res.set_header(ResponseHeader::ContentLength, "0");
        res
    }

    /// Interim `100 Continue`; it has neither headers nor body.
    pub fn interim_continue() -> Self {
        Self::new(HttpStatus::CONTINUE)
    }

    pub fn set_header(&mut self, h: ResponseHeader, value: &str) {
        let name = match h {
            ResponseHeader::ContentType => "Content-Type",
            ResponseHeader::ContentLength => "Content-Length",
            ResponseHeader::Connection => "Connection",
            ResponseHeader::Server => "Server",
            ResponseHeader::Date => "Date",
            ResponseHeader::WwwAuthenticate => "WWW-Authenticate",
        };

        self.headers.set_raw(name, value);
    }

    /// Adds the `Server` and `Date` headers every final response carries.
    pub fn stamp(&mut self, server_name: &str) {
        self.set_header(ResponseHeader::Server, server_name);
        self.set_header(
            ResponseHeader::Date,
            &httpdate::fmt_http_date(SystemTime::now()),
        );
    }

    pub fn build_headers(&self) -> String {
        // HTTP/1.1 <status> <reason>\r\n
        // <header_name>: <header_value>\r\n
        // ...
        // \r\n
        format!(
            "HTTP/1.1 {} {}\r\n{}\r\n",
            self.status.as_u16(),
            self.status.reason(),
            self.headers.stringify(),
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.build_headers().into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}
