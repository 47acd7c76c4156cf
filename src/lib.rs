//! Per-connection request assembly and dispatch in front of a JSON API.
//!
//! Bytes read from a socket are framed into [`Event`](http::request::Event)s
//! by [`net::codec`], assembled into one logical request per
//! [`Session`](net::session::Session), authenticated with HTTP Basic auth,
//! and handed to an [`ApiHandler`](handler::ApiHandler) whose result is
//! written back as JSON.

pub mod config;
pub mod handler;
pub mod http;
pub mod net;
