//! Chess rules, consumed from the `chess` crate through a value-type
//! [`Position`].

mod piece;
mod position;
mod san;
mod square;

pub use piece::{MoveSpec, Piece, PieceKind, Side};
pub use position::{AppliedMove, Position, RulesError};
pub use square::{Square, SquareParseError};
