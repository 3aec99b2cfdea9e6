use std::time::Duration;

use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use gambit::{Transport, TransportError};

/// What the socket task reports back to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Message(String),
    Closed,
    Error(String),
}

/// Sending half handed to the session. Frames are queued to the socket task;
/// dropping or closing it shuts the socket down.
pub struct WsTransport {
    outbound: Option<UnboundedSender<String>>,
}

impl Transport for WsTransport {
    fn send(&mut self, text: &str) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound
            .send(text.to_string())
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        self.outbound = None;
    }
}

pub struct Connection {
    pub transport: WsTransport,
    pub events: UnboundedReceiver<SocketEvent>,
}

/// Spawns the socket task on `runtime` and returns immediately. Progress
/// arrives as [`SocketEvent`]s.
pub fn connect(runtime: &Handle, url: &str, timeout: Duration) -> Connection {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    runtime.spawn(run_socket(url.to_string(), timeout, out_rx, event_tx));

    Connection {
        transport: WsTransport {
            outbound: Some(out_tx),
        },
        events: event_rx,
    }
}

async fn run_socket(
    url: String,
    timeout: Duration,
    mut outbound: UnboundedReceiver<String>,
    events: UnboundedSender<SocketEvent>,
) {
    log::info!("Connecting to {}", url);

    let stream = match tokio::time::timeout(timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            log::warn!("Connection to {} failed: {}", url, e);
            let _ = events.send(SocketEvent::Error(e.to_string()));
            let _ = events.send(SocketEvent::Closed);
            return;
        }
        Err(_) => {
            log::warn!("Connection timeout");
            let _ = events.send(SocketEvent::Error("connection timed out".to_string()));
            let _ = events.send(SocketEvent::Closed);
            return;
        }
    };

    let _ = events.send(SocketEvent::Opened);
    let (mut ws_tx, mut ws_rx) = stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    log::debug!("Transport dropped, closing socket");
                    let _ = ws_tx.close().await;
                    break;
                }
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if events.send(SocketEvent::Message(text)).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        if events.send(SocketEvent::Message(text)).is_err() {
                            break;
                        }
                    }
                    Err(_) => log::warn!("Dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    log::info!("Server closed connection: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(SocketEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }

    let _ = events.send(SocketEvent::Closed);
}
