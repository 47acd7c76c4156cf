use thiserror::Error;

use crate::net::session::State;

/// Faults that end a connection without a response.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("i/o error on connection: {0}")]
    Io(#[from] std::io::Error),

    /// The framing layer broke the head, body*, end ordering.
    #[error("unexpected {event} event in state {state:?}")]
    UnexpectedEvent { event: &'static str, state: State },
}

/// Reasons the framing decoder gives up on a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed request head: {0}")]
    Head(String),
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("unsupported HTTP version 1.{0}")]
    Version(u8),
    #[error("invalid content-length '{0}'")]
    ContentLength(String),
    #[error("unsupported transfer-encoding '{0}'")]
    TransferEncoding(String),
    #[error("malformed chunked body")]
    Chunk,
}
