use crate::interaction::Interaction;
use crate::rules::{Piece, Position, Side, Square};
use crate::session::MoveRecord;

/// King of the side to move, only while it is in check.
pub fn check_square(position: &Position) -> Option<Square> {
    position
        .in_check()
        .then(|| position.king_square(position.side_to_move()))
}

pub fn last_move(records: &[MoveRecord]) -> Option<(Square, Square)> {
    records.last().map(|r| (r.from_square(), r.to_square()))
}

/// Ranks from the top of the screen down, as seen by `perspective`.
pub fn rank_order(perspective: Side) -> [u8; 8] {
    match perspective {
        Side::White => [7, 6, 5, 4, 3, 2, 1, 0],
        Side::Black => [0, 1, 2, 3, 4, 5, 6, 7],
    }
}

/// Files from left to right, as seen by `perspective`.
pub fn file_order(perspective: Side) -> [u8; 8] {
    match perspective {
        Side::White => [0, 1, 2, 3, 4, 5, 6, 7],
        Side::Black => [7, 6, 5, 4, 3, 2, 1, 0],
    }
}

/// Square under a screen cell; `row` and `col` count from the top left.
pub fn square_at(perspective: Side, row: usize, col: usize) -> Option<Square> {
    let rank = *rank_order(perspective).get(row)?;
    let file = *file_order(perspective).get(col)?;
    Square::new(file, rank)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareView {
    pub square: Square,
    pub piece: Option<Piece>,
    pub light: bool,
    pub selected: bool,
    pub target: bool,
    pub last_move: bool,
    pub check: bool,
}

/// The 8x8 grid in screen order with every highlight resolved.
pub fn board_squares(
    position: &Position,
    records: &[MoveRecord],
    interaction: &Interaction,
    perspective: Side,
) -> Vec<Vec<SquareView>> {
    let check = check_square(position);
    let last = last_move(records);
    let selected = interaction.selected();

    rank_order(perspective)
        .iter()
        .map(|&rank| {
            file_order(perspective)
                .iter()
                .filter_map(|&file| Square::new(file, rank))
                .map(|square| SquareView {
                    square,
                    piece: position.piece_at(square),
                    light: (square.file() + square.rank()) % 2 == 1,
                    selected: selected == Some(square),
                    target: interaction.is_target(square),
                    last_move: last.is_some_and(|(from, to)| square == from || square == to),
                    check: check == Some(square),
                })
                .collect()
        })
        .collect()
}
