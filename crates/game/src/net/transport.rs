use std::collections::VecDeque;

use super::protocol::{ClientMessage, ProtocolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound half of an ordered, at-most-once text channel to the server.
///
/// Inbound frames are not pulled through this trait; whoever owns the
/// socket feeds them to the session one at a time.
pub trait Transport {
    fn send(&mut self, text: &str) -> Result<(), TransportError>;

    fn close(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, text: &str) -> Result<(), TransportError> {
        (**self).send(text)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Records every frame instead of sending it.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: VecDeque<String>,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> impl Iterator<Item = &str> {
        self.sent.iter().map(String::as_str)
    }

    pub fn take_sent(&mut self) -> Vec<String> {
        self.sent.drain(..).collect()
    }

    /// Drains and decodes everything sent so far.
    pub fn take_decoded(&mut self) -> Result<Vec<ClientMessage>, ProtocolError> {
        self.sent
            .drain(..)
            .map(|text| ClientMessage::decode(&text))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, text: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.sent.push_back(text.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_transport_records_until_closed() {
        let mut transport = MemoryTransport::new();
        transport
            .send(&ClientMessage::Resign.encode().unwrap())
            .unwrap();
        assert_eq!(transport.sent().count(), 1);

        transport.close();
        assert_eq!(transport.send("{}"), Err(TransportError::Closed));

        let decoded = transport.take_decoded().unwrap();
        assert_eq!(decoded, vec![ClientMessage::Resign]);
        assert!(transport.take_sent().is_empty());
    }
}
