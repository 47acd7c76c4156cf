//! Framing of a raw byte stream into request [`Event`]s.
//!
//! Request heads are parsed by `httparse`; this module only keeps the
//! buffering state between reads and frames bodies by `Content-Length` or
//! chunked transfer coding. Chunk extensions and trailers are discarded.
//!
//! Decode failures are not returned as errors: they are reported in-band
//! through the `decode_ok` flag of the head or terminal event, so that the
//! connection can still answer `400 Bad Request`. After a failure the
//! decoder drops everything it is fed.

use log::debug;

use crate::http::headers::HttpHeaders;
use crate::http::request::{Event, RequestHead};
use crate::http::{HttpVersion, http_method_from_str};
use crate::net::error::DecodeError;

const MAX_HEADERS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Head,
    Fixed(usize),
    ChunkSize,
    ChunkData(usize),
    ChunkDataEnd,
    Trailers,
    End(bool),
    Failed,
}

pub struct Decoder {
    buf: Vec<u8>,
    state: Framing,
    max_header_size: usize,
}

impl Decoder {
    pub fn new(max_header_size: usize) -> Self {
        Self {
            buf: Vec::new(),
            state: Framing::Head,
            max_header_size,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        if self.state != Framing::Failed {
            self.buf.extend_from_slice(bytes);
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == Framing::Failed
    }

    /// Next complete event, or `None` when more input is needed.
    pub fn next_event(&mut self) -> Option<Event> {
        match self.state {
            Framing::Head => match self.parse_head() {
                Ok(Some(head)) => Some(Event::Head(head)),
                Ok(None) => None,
                Err(err) => {
                    debug!("{}", err);
                    self.state = Framing::End(false);
                    Some(Event::Head(RequestHead::malformed()))
                }
            },
            Framing::Fixed(remaining) => {
                if self.buf.is_empty() {
                    return None;
                }
                let n = remaining.min(self.buf.len());
                let chunk: Vec<u8> = self.buf.drain(..n).collect();
                self.state = match remaining - n {
                    0 => Framing::End(true),
                    left => Framing::Fixed(left),
                };
                Some(Event::Body(chunk))
            }
            Framing::ChunkSize
            | Framing::ChunkData(_)
            | Framing::ChunkDataEnd
            | Framing::Trailers => match self.parse_chunked() {
                Ok(event) => event,
                Err(err) => {
                    debug!("{}", err);
                    self.state = Framing::End(false);
                    self.next_event()
                }
            },
            Framing::End(decode_ok) => {
                self.state = if decode_ok {
                    Framing::Head
                } else {
                    self.buf = Vec::new();
                    Framing::Failed
                };
                Some(Event::End { decode_ok })
            }
            Framing::Failed => None,
        }
    }

    fn parse_head(&mut self) -> Result<Option<RequestHead>, DecodeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        let len = match req.parse(&self.buf) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => {
                if self.buf.len() > self.max_header_size {
                    return Err(DecodeError::HeadTooLarge(self.max_header_size));
                }
                return Ok(None);
            }
            Err(err) => return Err(DecodeError::Head(err.to_string())),
        };
        if len > self.max_header_size {
            return Err(DecodeError::HeadTooLarge(self.max_header_size));
        }

        let minor = req.version.unwrap_or(1);
        let version = HttpVersion::from_minor(minor).ok_or(DecodeError::Version(minor))?;
        let mut head = RequestHead::new(
            http_method_from_str(req.method.unwrap_or_default()),
            req.path.unwrap_or("/"),
            version,
        );

        let mut collected = HttpHeaders::new();
        for header in req.headers.iter() {
            let value = String::from_utf8_lossy(header.value);
            collected.append(header.name, value.trim());
        }
        head.headers = collected;

        let framing = body_framing(&head.headers);
        self.buf.drain(..len);

        match framing {
            Ok(framing) => self.state = framing,
            Err(err) => {
                debug!("{}", err);
                head.decode_ok = false;
                self.state = Framing::End(false);
            }
        }
        Ok(Some(head))
    }

    fn parse_chunked(&mut self) -> Result<Option<Event>, DecodeError> {
        loop {
            match self.state {
                Framing::ChunkSize => match httparse::parse_chunk_size(&self.buf) {
                    Ok(httparse::Status::Complete((consumed, size))) => {
                        self.buf.drain(..consumed);
                        self.state = match size {
                            0 => Framing::Trailers,
                            size => Framing::ChunkData(
                                usize::try_from(size).map_err(|_| DecodeError::Chunk)?,
                            ),
                        };
                    }
                    Ok(httparse::Status::Partial) => return self.need_more(),
                    Err(_) => return Err(DecodeError::Chunk),
                },
                Framing::ChunkData(remaining) => {
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                    let n = remaining.min(self.buf.len());
                    let chunk: Vec<u8> = self.buf.drain(..n).collect();
                    self.state = match remaining - n {
                        0 => Framing::ChunkDataEnd,
                        left => Framing::ChunkData(left),
                    };
                    return Ok(Some(Event::Body(chunk)));
                }
                Framing::ChunkDataEnd => {
                    if self.buf.len() < 2 {
                        return Ok(None);
                    }
                    if &self.buf[..2] != b"\r\n" {
                        return Err(DecodeError::Chunk);
                    }
                    self.buf.drain(..2);
                    self.state = Framing::ChunkSize;
                }
                Framing::Trailers => {
                    let Some(end) = self.buf.windows(2).position(|w| w == b"\r\n") else {
                        return self.need_more();
                    };
                    self.buf.drain(..end + 2);
                    if end == 0 {
                        self.state = Framing::End(true);
                        return Ok(self.next_event());
                    }
                }
                _ => return Ok(None),
            }
        }
    }

    /// A chunk size or trailer line is incomplete; it must still fit in
    /// the head size budget.
    fn need_more(&self) -> Result<Option<Event>, DecodeError> {
        if self.buf.len() > self.max_header_size {
            return Err(DecodeError::Chunk);
        }
        Ok(None)
    }
}

fn body_framing(headers: &HttpHeaders) -> Result<Framing, DecodeError> {
    if let Some(coding) = headers.get("Transfer-Encoding") {
        if headers.has_token("Transfer-Encoding", "chunked") {
            return Ok(Framing::ChunkSize);
        }
        return Err(DecodeError::TransferEncoding(coding.to_string()));
    }
    match headers.get("Content-Length") {
        None => Ok(Framing::End(true)),
        Some(value) => match value.trim().parse::<usize>() {
            Ok(0) => Ok(Framing::End(true)),
            Ok(len) => Ok(Framing::Fixed(len)),
            Err(_) => Err(DecodeError::ContentLength(value.to_string())),
        },
    }
}
