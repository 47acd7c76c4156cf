pub mod codec;
pub mod connection;
pub mod error;
pub mod server;
pub mod session;
