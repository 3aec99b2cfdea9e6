use std::collections::BTreeSet;
use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, MoveGen};

use super::san;
use super::{MoveSpec, Piece, PieceKind, Side, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("no piece on {0}")]
    NoPiece(Square),
    #[error("piece on {square} belongs to {owner}, but {to_move} is to move")]
    WrongSide {
        square: Square,
        owner: Side,
        to_move: Side,
    },
    #[error("move {0} needs a promotion piece")]
    MissingPromotion(MoveSpec),
    #[error("move {0} cannot promote")]
    UnexpectedPromotion(MoveSpec),
    #[error("cannot promote to {0:?}")]
    InvalidPromotion(PieceKind),
    #[error("illegal move {0}")]
    IllegalMove(MoveSpec),
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

/// One legally applied move and everything the engine reports about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub position: Position,
    pub spec: MoveSpec,
    pub san: String,
    pub mover: Side,
    pub captured: Option<PieceKind>,
    pub castle: bool,
    pub check: bool,
    pub checkmate: bool,
}

/// An immutable chess position backed by the `chess` crate.
///
/// Applying a move never mutates `self`; it returns the next position inside
/// [`AppliedMove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: Board,
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl Position {
    pub fn start() -> Self {
        Self {
            board: Board::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        Board::from_str(fen)
            .map(|board| Self { board })
            .map_err(|_| RulesError::InvalidFen(fen.to_string()))
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn side_to_move(&self) -> Side {
        self.board.side_to_move().into()
    }

    pub fn in_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let engine_square = square.to_engine();
        let kind = self.board.piece_on(engine_square)?;
        let side = self.board.color_on(engine_square)?;
        Some(Piece::new(kind.into(), side.into()))
    }

    pub fn king_square(&self, side: Side) -> Square {
        Square::from_engine(self.board.king_square(side.into()))
    }

    /// Number of `kind` pieces `side` has on the board.
    pub fn count(&self, side: Side, kind: PieceKind) -> u32 {
        let pieces = *self.board.pieces(kind.into()) & *self.board.color_combined(side.into());
        pieces.popcnt()
    }

    pub fn legal_moves(&self) -> Vec<MoveSpec> {
        MoveGen::new_legal(&self.board)
            .map(|m| MoveSpec {
                from: Square::from_engine(m.get_source()),
                to: Square::from_engine(m.get_dest()),
                promotion: m.get_promotion().map(Into::into),
            })
            .collect()
    }

    /// Destinations the piece on `from` may legally reach. Empty when the
    /// square is empty or holds a piece of the side not to move.
    pub fn legal_targets(&self, from: Square) -> BTreeSet<Square> {
        let source = from.to_engine();
        MoveGen::new_legal(&self.board)
            .filter(|m| m.get_source() == source)
            .map(|m| Square::from_engine(m.get_dest()))
            .collect()
    }

    /// A pawn moving onto the last rank for its color.
    pub fn is_promotion_move(&self, from: Square, to: Square) -> bool {
        match self.piece_at(from) {
            Some(Piece {
                kind: PieceKind::Pawn,
                side,
            }) => to.rank() == side.promotion_rank(),
            _ => false,
        }
    }

    pub fn is_legal(&self, spec: MoveSpec) -> bool {
        self.check(spec).is_ok()
    }

    pub fn apply(&self, spec: MoveSpec) -> Result<AppliedMove, RulesError> {
        let (piece, engine_move) = self.check(spec)?;

        let captured = match self.piece_at(spec.to) {
            Some(target) => Some(target.kind),
            // en passant lands on an empty square
            None if piece.kind == PieceKind::Pawn && spec.from.file() != spec.to.file() => {
                Some(PieceKind::Pawn)
            }
            None => None,
        };
        let castle =
            piece.kind == PieceKind::King && spec.from.file().abs_diff(spec.to.file()) == 2;

        let san = san::render(&self.board, engine_move);
        let position = Position {
            board: self.board.make_move_new(engine_move),
        };

        Ok(AppliedMove {
            check: position.in_check(),
            checkmate: position.is_checkmate(),
            position,
            spec,
            san,
            mover: piece.side,
            captured,
            castle,
        })
    }

    fn check(&self, spec: MoveSpec) -> Result<(Piece, ChessMove), RulesError> {
        let piece = self
            .piece_at(spec.from)
            .ok_or(RulesError::NoPiece(spec.from))?;

        let to_move = self.side_to_move();
        if piece.side != to_move {
            return Err(RulesError::WrongSide {
                square: spec.from,
                owner: piece.side,
                to_move,
            });
        }

        match (self.is_promotion_move(spec.from, spec.to), spec.promotion) {
            (true, None) => return Err(RulesError::MissingPromotion(spec)),
            (false, Some(_)) => return Err(RulesError::UnexpectedPromotion(spec)),
            (true, Some(kind)) if !kind.is_promotion_choice() => {
                return Err(RulesError::InvalidPromotion(kind));
            }
            _ => {}
        }

        let engine_move = ChessMove::new(
            spec.from.to_engine(),
            spec.to.to_engine(),
            spec.promotion.map(Into::into),
        );
        if !self.board.legal(engine_move) {
            return Err(RulesError::IllegalMove(spec));
        }

        Ok((piece, engine_move))
    }
}
