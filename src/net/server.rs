//! Core HTTP server implementation.
//!
//! This module is responsible only for networking concerns:
//! - accepting TCP connections,
//! - reading raw bytes from the network,
//! - feeding them to a [`Decoder`] and handing the resulting events to the
//!   connection's [`Connection`].
//!
//! Request assembly, authentication and dispatch are delegated to
//! [`net::connection`](crate::net::connection).
//!
//! ## Connection lifecycle
//!
//! 1. Accept a TCP connection and spawn one task for it
//! 2. Read raw data from the stream, bounded by the configured read timeout
//! 3. Decode the data into framing events
//! 4. Process the events in order; each terminal event writes one response
//! 5. Stop when the client goes away, a non keep-alive response has been
//!    flushed, or an unexpected fault occurs (the socket is dropped without
//!    a response)

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use async_std::io::{self, ReadExt};
use async_std::net::{TcpListener, TcpStream};
use async_std::task;
use log::{debug, error};

use crate::config::ServerConfig;
use crate::handler::ApiHandler;
use crate::net::codec::Decoder;
use crate::net::connection::{Connection, Flow};

pub struct Server<H> {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    handler: Arc<H>,
}

impl<H: ApiHandler> Server<H> {
    /// Binds to the configured address and port.
    pub async fn bind(config: ServerConfig, handler: H) -> std::io::Result<Self> {
        let listener = TcpListener::bind((config.address, config.port)).await?;
        Ok(Self {
            listener,
            config: Arc::new(config),
            handler: Arc::new(handler),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the listener fails, spawning one task per
    /// client.
    pub async fn run(&self) -> std::io::Result<()> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    error!("failed to accept connection: {}", err);
                    return Err(err);
                }
            };
            debug!("accepted connection from {}", addr);

            let config = Arc::clone(&self.config);
            let handler = Arc::clone(&self.handler);
            task::spawn(async move {
                handle_client(stream, config, handler).await;
                debug!("connection from {} closed", addr);
            });
        }
    }
}

/// Drives one client connection until it closes.
async fn handle_client<H: ApiHandler>(stream: TcpStream, config: Arc<ServerConfig>, handler: Arc<H>) {
    let mut reader = stream.clone();
    let mut decoder = Decoder::new(config.max_header_size);
    let mut buffer = vec![0; config.buffer_size];
    let read_timeout = config.read_timeout;
    let mut connection = Connection::new(config, handler, stream);

    loop {
        while let Some(event) = decoder.next_event() {
            match connection.on_event(event).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Close) => return,
                Err(err) => {
                    debug!("exception in API connection: {}", err);
                    return;
                }
            }
        }

        let n = match io::timeout(read_timeout, reader.read(&mut buffer)).await {
            Ok(0) => return,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!("read failed: {}", err);
                return;
            }
        };
        decoder.feed(&buffer[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::echo::EchoHandler;
    use async_std::io::WriteExt;
    use base64::{Engine as _, engine::general_purpose};
    use std::net::{IpAddr, Ipv4Addr};

    async fn spawn_server() -> SocketAddr {
        let config = ServerConfig {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            api_username: "user".to_string(),
            api_password: "pass".to_string(),
            ..ServerConfig::default()
        };
        let server = Server::bind(config, EchoHandler).await.unwrap();
        let addr = server.local_addr().unwrap();
        task::spawn(async move { server.run().await });
        addr
    }

    #[async_std::test]
    async fn serves_a_request_and_closes_without_keep_alive() {
        let addr = spawn_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let auth = general_purpose::STANDARD.encode("user:pass");
        let request = format!(
            "GET /accounts?page=2 HTTP/1.1\r\nHost: x\r\nConnection: close\r\nAuthorization: Basic {}\r\n\r\n",
            auth
        );
        client.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(!response.contains("Connection: keep-alive"));
        assert!(response.ends_with(
            r#"{"success":true,"result":{"path":"/accounts","params":{"page":"2"}}}"#
        ));
    }

    #[async_std::test]
    async fn malformed_request_gets_bad_request_then_eof() {
        let addr = spawn_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"BROKEN\x01 / HTTP/1.1\r\n\r\n").await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.ends_with(r#"{"success":false,"message":"400 Bad Request"}"#));
    }
}
