pub mod protocol;
pub mod transport;

pub use protocol::{
    ClientMessage, ClockUpdate, DEFAULT_SERVER_URL, EndReason, GameAssignment, GameResult,
    ProtocolError, ServerMessage, SyncState, TIME_CONTROLS, Winner,
};
pub use transport::{ConnectionStatus, MemoryTransport, Transport, TransportError};
