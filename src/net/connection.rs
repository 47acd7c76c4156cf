//! Request assembly and dispatch for one connection.
//!
//! A [`Connection`] receives the framing events of its socket in order and
//! drives its [`Session`] through them. Nothing happens on a body event but
//! buffering; the terminal event runs the pipeline
//!
//! 1. answer with a recorded [`Rejection`] if there is one,
//! 2. strip the query from the target path,
//! 3. merge form parameters from the body,
//! 4. check Basic credentials,
//! 5. collapse parameters to one value per key,
//! 6. call the [`ApiHandler`],
//!
//! and writes exactly one response. Every stage either hands its output to
//! the next one or ends the pipeline with a [`Reply`].

use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;

use async_std::io::{Write, WriteExt};
use log::{debug, error};
use serde::Serialize;

use crate::config::ServerConfig;
use crate::handler::auth::{self, Credentials};
use crate::handler::params::{self, Params};
use crate::handler::{ApiHandler, ApiResponse, INTERNAL_ERROR_BODY};
use crate::http::request::Event;
use crate::http::response::{HttpResponse, ResponseHeader};
use crate::http::status::HttpStatus;
use crate::net::error::ConnectionError;
use crate::net::session::{Rejection, Session};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What the connection does after an event has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A response was flushed and the writer closed.
    Close,
}

/// Final response descriptor of one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Json { status: HttpStatus, body: String },
    Unauthorized,
}

impl Reply {
    /// Serializes an envelope. A serialization failure turns into a `500`
    /// with a fixed body, whatever status the envelope carried.
    pub fn envelope<T: Serialize>(response: &ApiResponse<T>) -> Reply {
        match response.serialize() {
            Ok(body) => Reply::Json {
                status: response.status,
                body,
            },
            Err(err) => {
                error!("failed to serialize response: {}", err);
                Reply::Json {
                    status: HttpStatus::INTERNAL_SERVER_ERROR,
                    body: INTERNAL_ERROR_BODY.to_string(),
                }
            }
        }
    }

    fn into_response(self, realm: &str) -> HttpResponse {
        match self {
            Reply::Json { status, body } => HttpResponse::json(status, body),
            Reply::Unauthorized => HttpResponse::unauthorized(realm),
        }
    }
}

impl From<Rejection> for Reply {
    fn from(rejection: Rejection) -> Self {
        Reply::envelope(&ApiResponse::<()>::failure(
            rejection.status,
            rejection.message,
        ))
    }
}

/// A request that passed every check and is ready for the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub path: String,
    pub params: Params,
}

/// Runs stages 1 to 5 of the pipeline over a session that has seen its
/// terminal event.
pub fn assemble(session: &mut Session, config: &ServerConfig) -> Result<Assembled, Reply> {
    if let Some(rejection) = session.take_pending() {
        return Err(rejection.into());
    }

    let path = params::split_target(session.target()).0.to_string();

    if is_form(session) && !session.body().is_empty() {
        let form = params::decode(session.body());
        params::extend(session.params_mut(), form);
    }

    let credentials = Credentials {
        username: &config.api_username,
        password: &config.api_password,
    };
    if !auth::check_basic_auth(session.headers().get("Authorization"), &credentials) {
        return Err(Reply::Unauthorized);
    }

    let params = params::collapse(std::mem::take(session.params_mut()));
    Ok(Assembled { path, params })
}

fn is_form(session: &Session) -> bool {
    session
        .headers()
        .get("Content-Type")
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

pub struct Connection<H, W> {
    session: Session,
    config: Arc<ServerConfig>,
    handler: Arc<H>,
    writer: W,
}

impl<H, W> Connection<H, W>
where
    H: ApiHandler,
    W: Write + Unpin,
{
    pub fn new(config: Arc<ServerConfig>, handler: Arc<H>, writer: W) -> Self {
        Self {
            session: Session::new(config.max_body_size),
            config,
            handler,
            writer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub async fn on_event(&mut self, event: Event) -> Result<Flow, ConnectionError> {
        match event {
            Event::Head(head) => {
                let expects_continue = head.expects_continue();
                self.session.begin(head)?;
                // a rejected request must not be invited to send its body
                if expects_continue && self.session.pending().is_none() {
                    self.writer
                        .write_all(&HttpResponse::interim_continue().to_bytes())
                        .await?;
                    self.writer.flush().await?;
                }
                Ok(Flow::Continue)
            }
            Event::Body(chunk) => {
                self.session.push_body(&chunk)?;
                Ok(Flow::Continue)
            }
            Event::End { decode_ok } => {
                self.session.finish(decode_ok)?;
                let reply = match assemble(&mut self.session, &self.config) {
                    Ok(request) => self.dispatch(request).await,
                    Err(reply) => reply,
                };
                self.respond(reply).await
            }
        }
    }

    async fn dispatch(&self, request: Assembled) -> Reply {
        let outcome = self
            .handler
            .service(&request.path, &request.params, self.session.headers())
            .await;

        let response = outcome.unwrap_or_else(ApiResponse::from);
        Reply::envelope(&response)
    }

    async fn respond(&mut self, reply: Reply) -> Result<Flow, ConnectionError> {
        let keep_alive = self.session.keep_alive();

        let mut response = reply.into_response(&self.config.auth_realm);
        if keep_alive {
            response.set_header(ResponseHeader::Connection, "keep-alive");
        }
        response.stamp(&self.config.server_name);

        debug!(
            "{:?} {} -> {}",
            self.session.method(),
            self.session.target(),
            response.status
        );

        self.writer.write_all(&response.to_bytes()).await?;
        self.session.reset();
        self.writer.flush().await?;

        if keep_alive {
            return Ok(Flow::Continue);
        }
        poll_fn(|cx| Pin::new(&mut self.writer).poll_close(cx)).await?;
        Ok(Flow::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RequestHead;
    use crate::http::{HttpMethod, HttpVersion};
    use base64::{Engine as _, engine::general_purpose};

    fn config() -> ServerConfig {
        ServerConfig {
            api_username: "user".to_string(),
            api_password: "pass".to_string(),
            ..ServerConfig::default()
        }
    }

    fn session_for(uri: &str, headers: &[(&str, &str)], body: &[u8]) -> Session {
        let mut head = RequestHead::new(HttpMethod::Post, uri, HttpVersion::V1_1);
        head.headers.set_raw(
            "Authorization",
            &format!("Basic {}", general_purpose::STANDARD.encode("user:pass")),
        );
        for (name, value) in headers {
            head.headers.set_raw(name, value);
        }
        let mut session = Session::new(1024);
        session.begin(head).unwrap();
        session.push_body(body).unwrap();
        session.finish(true).unwrap();
        session
    }

    #[test]
    fn assemble_strips_query_and_collapses() {
        let mut session = session_for("/accounts?page=2", &[], b"");
        let request = assemble(&mut session, &config()).unwrap();

        assert_eq!(request.path, "/accounts");
        assert_eq!(request.params.len(), 1);
        assert_eq!(request.params["page"], "2");
    }

    #[test]
    fn form_body_merges_after_query() {
        let mut session = session_for(
            "/transfer?a=1",
            &[("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")],
            b"a=2&to=bob",
        );
        let request = assemble(&mut session, &config()).unwrap();

        assert_eq!(request.params["a"], "1");
        assert_eq!(request.params["to"], "bob");
    }

    #[test]
    fn non_form_body_is_not_decoded() {
        let mut session = session_for(
            "/transfer",
            &[("Content-Type", "application/json")],
            b"a=2",
        );
        let request = assemble(&mut session, &config()).unwrap();

        assert!(request.params.is_empty());
    }

    #[test]
    fn bad_credentials_stop_the_pipeline() {
        let mut session = session_for("/accounts", &[("Authorization", "Basic dXNlcjpwYXNz")], b"");
        let mut config = config();
        config.api_password = "other".to_string();

        assert_eq!(assemble(&mut session, &config), Err(Reply::Unauthorized));
    }

    #[test]
    fn pending_rejection_skips_authentication() {
        let mut session = session_for("/accounts", &[("Authorization", "Bearer x")], b"");
        session.reject(Rejection::new(HttpStatus::BAD_REQUEST));

        match assemble(&mut session, &config()) {
            Err(Reply::Json { status, body }) => {
                assert_eq!(status, HttpStatus::BAD_REQUEST);
                assert_eq!(body, r#"{"success":false,"message":"400 Bad Request"}"#);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn serialization_failure_overrides_status() {
        let mut response = ApiResponse::ok(Unserializable);
        response.status = HttpStatus::from_u16(202).unwrap();

        assert_eq!(
            Reply::envelope(&response),
            Reply::Json {
                status: HttpStatus::INTERNAL_SERVER_ERROR,
                body: INTERNAL_ERROR_BODY.to_string(),
            }
        );
    }
}
