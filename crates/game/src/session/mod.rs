mod clock;
mod config;
mod controller;
mod error;
mod events;
mod game;
mod username;

pub use clock::ClockState;
pub use config::SessionConfig;
pub use controller::{Notice, RequestKind, Session, SessionPhase};
pub use error::{
    ReconciliationError, SessionError, USERNAME_MAX_LEN, USERNAME_MIN_LEN, ValidationError,
};
pub use events::{EventQueue, SessionEvent};
pub use game::{DrawOffer, Game, MoveRecord};
pub use username::validate_username;
