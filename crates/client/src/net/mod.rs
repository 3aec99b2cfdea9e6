mod config;
mod socket;

pub use config::ClientConfig;
pub use socket::{Connection, SocketEvent, WsTransport, connect};
