//! Presentation facts derived from a game snapshot. Nothing here is cached;
//! every value is recomputed from the current position and records.

mod board;
mod history;
mod material;
mod status;

pub use board::{
    SquareView, board_squares, check_square, file_order, last_move, rank_order, square_at,
};
pub use history::{MoveRow, format_clock, move_rows};
pub use material::{
    CapturedPieces, captured_pieces, material_balance, material_label, material_value,
};
pub use status::{Outcome, outcome, result_message, status_line, turn_line};

use crate::interaction::Interaction;
use crate::rules::{Side, Square};
use crate::session::Game;

/// Everything a board screen needs for one frame.
#[derive(Debug, Clone)]
pub struct GameView {
    pub perspective: Side,
    pub squares: Vec<Vec<SquareView>>,
    pub captured: CapturedPieces,
    pub balance: i32,
    pub check_square: Option<Square>,
    pub last_move: Option<(Square, Square)>,
    pub rows: Vec<MoveRow>,
    pub outcome: Option<Outcome>,
}

impl GameView {
    pub fn compute(game: &Game, interaction: &Interaction) -> Self {
        let position = game.position();
        let perspective = game.color();
        let captured = captured_pieces(position);

        Self {
            perspective,
            squares: board_squares(position, game.records(), interaction, perspective),
            balance: material_balance(&captured),
            captured,
            check_square: check_square(position),
            last_move: last_move(game.records()),
            rows: move_rows(game.records()),
            outcome: game.result().map(|r| outcome(r, perspective)),
        }
    }

    pub fn material_label(&self, side: Side) -> Option<String> {
        material_label(self.balance, side)
    }
}
