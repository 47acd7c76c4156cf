//! Per-connection request state.
//!
//! A [`Session`] lives as long as its connection and holds the one logical
//! request currently being assembled. It is reset, not rebuilt, once the
//! response of that request has been written.

use crate::handler::params::{self, MultiParams};
use crate::http::HttpMethod;
use crate::http::headers::HttpHeaders;
use crate::http::request::RequestHead;
use crate::http::status::HttpStatus;
use crate::net::error::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    HeadReceived,
    BodyAccumulating,
}

/// Failure decided before the terminal event. Once recorded it is what
/// gets written back, whatever the later stages would have produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: HttpStatus,
    pub message: String,
}

impl Rejection {
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            message: status.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    state: State,
    max_body_size: usize,

    keep_alive: bool,
    method: HttpMethod,
    target: String,
    params: MultiParams,
    headers: HttpHeaders,
    body: Vec<u8>,

    pending: Option<Rejection>,
}

impl Session {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            state: State::Idle,
            max_body_size,
            keep_alive: false,
            method: HttpMethod::Unknown,
            target: String::new(),
            params: MultiParams::new(),
            headers: HttpHeaders::new(),
            body: Vec::new(),
            pending: None,
        }
    }

    /// `Idle -> HeadReceived`: captures everything the head carries.
    pub fn begin(&mut self, head: RequestHead) -> Result<(), ConnectionError> {
        if self.state != State::Idle {
            return Err(ConnectionError::UnexpectedEvent {
                event: "head",
                state: self.state,
            });
        }

        self.keep_alive = head.is_keep_alive();
        self.method = head.method;
        self.params = params::from_uri(&head.uri);
        let declared = head.declared_length();
        self.target = head.uri;

        self.headers = head.headers;
        self.state = State::HeadReceived;

        if !head.decode_ok {
            self.fail_framing();
            return Ok(());
        }

        match declared {
            Some(len) if len > self.max_body_size => {
                self.reject_oversized();
            }
            Some(len) => self.body = Vec::with_capacity(len),
            None => {}
        }
        Ok(())
    }

    /// Appends a body chunk; bytes past the size limit are not kept.
    pub fn push_body(&mut self, chunk: &[u8]) -> Result<(), ConnectionError> {
        if self.state == State::Idle {
            return Err(ConnectionError::UnexpectedEvent {
                event: "body",
                state: self.state,
            });
        }
        self.state = State::BodyAccumulating;

        if chunk.is_empty() || self.pending.is_some() {
            return Ok(());
        }
        if self.body.len() + chunk.len() > self.max_body_size {
            self.reject_oversized();
            return Ok(());
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    /// Handles the terminal event's framing outcome.
    pub fn finish(&mut self, decode_ok: bool) -> Result<(), ConnectionError> {
        if self.state == State::Idle {
            return Err(ConnectionError::UnexpectedEvent {
                event: "end",
                state: self.state,
            });
        }
        if !decode_ok {
            self.fail_framing();
        }
        Ok(())
    }

    /// Records an early answer. The first one recorded is kept.
    pub fn reject(&mut self, rejection: Rejection) {
        if self.pending.is_none() {
            self.pending = Some(rejection);
        }
    }

    /// Framing is lost after a decode failure, so the connection cannot be
    /// reused for another request.
    fn fail_framing(&mut self) {
        self.keep_alive = false;
        self.reject(Rejection::new(HttpStatus::BAD_REQUEST));
    }

    fn reject_oversized(&mut self) {
        self.keep_alive = false;
        self.body = Vec::new();
        self.reject(Rejection::new(HttpStatus::PAYLOAD_TOO_LARGE));
    }

    /// Returns the session to `Idle`, dropping every per-request field.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.keep_alive = false;
        self.method = HttpMethod::Unknown;
        self.target = String::new();
        self.params = MultiParams::new();
        self.headers = HttpHeaders::new();
        self.body = Vec::new();
        self.pending = None;
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn params(&self) -> &MultiParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut MultiParams {
        &mut self.params
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn pending(&self) -> Option<&Rejection> {
        self.pending.as_ref()
    }

    pub fn take_pending(&mut self) -> Option<Rejection> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpVersion;

    fn head(uri: &str) -> RequestHead {
        RequestHead::new(HttpMethod::Post, uri, HttpVersion::V1_1)
    }

    #[test]
    fn begin_collects_query_params() {
        let mut session = Session::new(1024);
        session.begin(head("/accounts?page=2&page=3")).unwrap();

        assert_eq!(session.state(), State::HeadReceived);
        assert!(session.keep_alive());
        assert_eq!(session.params()["page"], vec!["2", "3"]);
    }

    #[test]
    fn body_chunks_accumulate() {
        let mut session = Session::new(1024);
        session.begin(head("/")).unwrap();
        session.push_body(b"a=1").unwrap();
        session.push_body(b"").unwrap();
        session.push_body(b"&b=2").unwrap();

        assert_eq!(session.state(), State::BodyAccumulating);
        assert_eq!(session.body(), b"a=1&b=2");
    }

    #[test]
    fn oversized_body_is_rejected_not_buffered() {
        let mut session = Session::new(4);
        session.begin(head("/")).unwrap();
        session.push_body(b"abc").unwrap();
        session.push_body(b"de").unwrap();
        session.push_body(b"f").unwrap();

        assert!(session.body().is_empty());
        assert!(!session.keep_alive());
        assert_eq!(
            session.pending().map(|r| r.status),
            Some(HttpStatus::PAYLOAD_TOO_LARGE)
        );
    }

    #[test]
    fn body_at_exact_limit_is_kept() {
        let mut session = Session::new(4);
        session.begin(head("/")).unwrap();
        session.push_body(b"abcd").unwrap();

        assert_eq!(session.body(), b"abcd");
        assert!(session.pending().is_none());
    }

    #[test]
    fn declared_length_over_limit_is_rejected_at_head() {
        let mut h = head("/");
        h.headers.set_raw("Content-Length", "5");
        let mut session = Session::new(4);
        session.begin(h).unwrap();

        assert_eq!(
            session.pending().map(|r| r.status),
            Some(HttpStatus::PAYLOAD_TOO_LARGE)
        );
    }

    #[test]
    fn chunked_request_ignores_content_length() {
        let mut h = head("/");
        h.headers.set_raw("Transfer-Encoding", "chunked");
        h.headers.set_raw("Content-Length", "100000");
        let mut session = Session::new(4);
        session.begin(h).unwrap();
        session.push_body(b"a=1").unwrap();

        assert!(session.pending().is_none());
        assert_eq!(session.body(), b"a=1");
    }

    #[test]
    fn first_rejection_wins() {
        let mut session = Session::new(4);
        session.begin(RequestHead::malformed()).unwrap();
        session.push_body(b"too long").unwrap();
        session.finish(false).unwrap();

        let pending = session.pending().unwrap();
        assert_eq!(pending.status, HttpStatus::BAD_REQUEST);
        assert_eq!(pending.message, "400 Bad Request");
    }

    #[test]
    fn failed_terminal_decode_disables_keep_alive() {
        let mut session = Session::new(1024);
        session.begin(head("/")).unwrap();
        session.finish(false).unwrap();

        assert!(!session.keep_alive());
        assert_eq!(session.pending().map(|r| r.status), Some(HttpStatus::BAD_REQUEST));
    }

    #[test]
    fn out_of_order_events_are_faults() {
        let mut session = Session::new(1024);
        assert!(session.push_body(b"x").is_err());
        assert!(session.finish(true).is_err());

        session.begin(head("/")).unwrap();
        assert!(matches!(
            session.begin(head("/")),
            Err(ConnectionError::UnexpectedEvent { event: "head", .. })
        ));
    }

    #[test]
    fn reset_clears_every_request_field() {
        let mut session = Session::new(1024);
        session.begin(head("/a?x=1")).unwrap();
        session.push_body(b"data").unwrap();
        session.reject(Rejection::new(HttpStatus::BAD_REQUEST));

        session.reset();

        assert_eq!(session.state(), State::Idle);
        assert!(session.params().is_empty());
        assert!(session.body().is_empty());
        assert!(session.headers().is_empty());
        assert!(session.pending().is_none());
        assert_eq!(session.target(), "");
    }
}
