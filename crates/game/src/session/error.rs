use crate::net::ProtocolError;
use crate::rules::{MoveSpec, RulesError};

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 20;

/// A local action was refused before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Username must be at least 2 characters")]
    UsernameTooShort,
    #[error("Username must be at most 20 characters")]
    UsernameTooLong,
    #[error("Username can only contain letters, numbers, and underscores")]
    UsernameCharset,
    #[error("Username contains inappropriate content")]
    UsernameDenied,
    #[error("choose a username first")]
    NotRegistered,
    #[error("a game is already in progress")]
    GameInProgress,
    #[error("time control must be positive")]
    InvalidTimeControl,
    #[error("not connected to the server")]
    NotConnected,
}

/// A server-confirmed move could not be applied to the local snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconciliationError {
    #[error("server move {mv} at ply {ply} rejected: {source}")]
    MoveRejected {
        ply: usize,
        mv: MoveSpec,
        #[source]
        source: RulesError,
    },
    #[error("move received with no active game")]
    NoActiveGame,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),
}
