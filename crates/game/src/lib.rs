pub mod interaction;
pub mod net;
pub mod rules;
pub mod session;
pub mod view;

pub use interaction::{Gesture, Interaction, InteractionState};
pub use net::{
    ClientMessage, ClockUpdate, ConnectionStatus, DEFAULT_SERVER_URL, EndReason, GameAssignment,
    GameResult, MemoryTransport, ProtocolError, ServerMessage, SyncState, TIME_CONTROLS,
    Transport, TransportError, Winner,
};
pub use rules::{AppliedMove, MoveSpec, Piece, PieceKind, Position, RulesError, Side, Square};
pub use session::{
    ClockState, DrawOffer, Game, MoveRecord, Notice, ReconciliationError, RequestKind, Session,
    SessionConfig, SessionError, SessionEvent, SessionPhase, ValidationError,
};
pub use view::GameView;
