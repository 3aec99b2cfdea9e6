//! Two-click move building: select a piece, pick a target, and pick a
//! promotion piece when the move needs one.
//!
//! The machine only ever *produces* a [`MoveSpec`]; it never touches the
//! position it reads.

use std::collections::BTreeSet;

use crate::rules::{MoveSpec, PieceKind, Position, Side, Square};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Selected {
        square: Square,
        targets: BTreeSet<Square>,
    },
    PromotionPending {
        from: Square,
        to: Square,
    },
}

/// What a single gesture did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Ignored,
    Selected(Square),
    Deselected,
    PromotionRequired { from: Square, to: Square },
    Completed(MoveSpec),
}

#[derive(Debug, Clone, Default)]
pub struct Interaction {
    state: InteractionState,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selected(&self) -> Option<Square> {
        match &self.state {
            InteractionState::Selected { square, .. } => Some(*square),
            InteractionState::PromotionPending { from, .. } => Some(*from),
            InteractionState::Idle => None,
        }
    }

    pub fn targets(&self) -> Option<&BTreeSet<Square>> {
        match &self.state {
            InteractionState::Selected { targets, .. } => Some(targets),
            _ => None,
        }
    }

    pub fn is_target(&self, square: Square) -> bool {
        self.targets().is_some_and(|t| t.contains(&square))
    }

    pub fn pending_promotion(&self) -> Option<(Square, Square)> {
        match self.state {
            InteractionState::PromotionPending { from, to } => Some((from, to)),
            _ => None,
        }
    }

    /// Feeds one square click. `side` is the local player's color; nothing
    /// is selectable unless it is that side's turn in `position`.
    pub fn click(&mut self, square: Square, position: &Position, side: Side) -> Gesture {
        match std::mem::take(&mut self.state) {
            pending @ InteractionState::PromotionPending { .. } => {
                self.state = pending;
                Gesture::Ignored
            }
            InteractionState::Idle => self.select(square, position, side),
            InteractionState::Selected { square: from, targets } => {
                if square == from {
                    return Gesture::Deselected;
                }

                if targets.contains(&square) {
                    if position.is_promotion_move(from, square) {
                        self.state = InteractionState::PromotionPending { from, to: square };
                        return Gesture::PromotionRequired { from, to: square };
                    }
                    return Gesture::Completed(MoveSpec::new(from, square));
                }

                if owns(position, square, side) {
                    return self.select(square, position, side);
                }

                Gesture::Deselected
            }
        }
    }

    /// Resolves a pending promotion. Anything but a promotion choice, or a
    /// call with nothing pending, is ignored.
    pub fn choose_promotion(&mut self, kind: PieceKind) -> Gesture {
        match self.state {
            InteractionState::PromotionPending { from, to } if kind.is_promotion_choice() => {
                self.state = InteractionState::Idle;
                Gesture::Completed(MoveSpec::new(from, to).with_promotion(kind))
            }
            _ => Gesture::Ignored,
        }
    }

    pub fn cancel(&mut self) -> Gesture {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => Gesture::Ignored,
            _ => Gesture::Deselected,
        }
    }

    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    fn select(&mut self, square: Square, position: &Position, side: Side) -> Gesture {
        if !owns(position, square, side) {
            self.state = InteractionState::Idle;
            return Gesture::Ignored;
        }

        let targets = position.legal_targets(square);
        log::debug!("selected {square}, {} legal targets", targets.len());
        self.state = InteractionState::Selected { square, targets };
        Gesture::Selected(square)
    }
}

fn owns(position: &Position, square: Square, side: Side) -> bool {
    position.side_to_move() == side
        && position
            .piece_at(square)
            .is_some_and(|piece| piece.side == side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn select_then_move() {
        let position = Position::start();
        let mut interaction = Interaction::new();

        assert_eq!(
            interaction.click(sq("e2"), &position, Side::White),
            Gesture::Selected(sq("e2"))
        );
        assert!(interaction.is_target(sq("e4")));
        assert_eq!(
            interaction.click(sq("e4"), &position, Side::White),
            Gesture::Completed(MoveSpec::new(sq("e2"), sq("e4")))
        );
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn reclick_and_empty_square_deselect() {
        let position = Position::start();
        let mut interaction = Interaction::new();

        interaction.click(sq("g1"), &position, Side::White);
        assert_eq!(
            interaction.click(sq("g1"), &position, Side::White),
            Gesture::Deselected
        );

        interaction.click(sq("g1"), &position, Side::White);
        assert_eq!(
            interaction.click(sq("d5"), &position, Side::White),
            Gesture::Deselected
        );
        assert_eq!(interaction.selected(), None);
    }

    #[test]
    fn own_piece_reselects_and_opponent_piece_deselects() {
        let position = Position::start();
        let mut interaction = Interaction::new();

        interaction.click(sq("e2"), &position, Side::White);
        assert_eq!(
            interaction.click(sq("d2"), &position, Side::White),
            Gesture::Selected(sq("d2"))
        );
        assert_eq!(
            interaction.click(sq("d7"), &position, Side::White),
            Gesture::Deselected
        );
    }

    #[test]
    fn cannot_select_out_of_turn() {
        let position = Position::start();
        let mut interaction = Interaction::new();

        assert_eq!(
            interaction.click(sq("e7"), &position, Side::Black),
            Gesture::Ignored
        );
        assert_eq!(
            interaction.click(sq("e7"), &position, Side::White),
            Gesture::Ignored
        );
        assert_eq!(
            interaction.click(sq("e4"), &position, Side::White),
            Gesture::Ignored
        );
    }

    #[test]
    fn promotion_blocks_clicks_until_chosen() {
        let position = Position::from_fen("8/P7/8/8/8/8/7k/4K3 w - - 0 1").unwrap();
        let mut interaction = Interaction::new();

        interaction.click(sq("a7"), &position, Side::White);
        assert_eq!(
            interaction.click(sq("a8"), &position, Side::White),
            Gesture::PromotionRequired {
                from: sq("a7"),
                to: sq("a8")
            }
        );

        assert_eq!(
            interaction.click(sq("e1"), &position, Side::White),
            Gesture::Ignored
        );
        assert_eq!(interaction.pending_promotion(), Some((sq("a7"), sq("a8"))));
        assert_eq!(
            interaction.choose_promotion(PieceKind::King),
            Gesture::Ignored
        );

        assert_eq!(
            interaction.choose_promotion(PieceKind::Knight),
            Gesture::Completed(
                MoveSpec::new(sq("a7"), sq("a8")).with_promotion(PieceKind::Knight)
            )
        );
        assert_eq!(interaction.state(), &InteractionState::Idle);
    }

    #[test]
    fn cancel_clears_pending_promotion() {
        let position = Position::from_fen("8/P7/8/8/8/8/7k/4K3 w - - 0 1").unwrap();
        let mut interaction = Interaction::new();

        interaction.click(sq("a7"), &position, Side::White);
        interaction.click(sq("a8"), &position, Side::White);
        assert_eq!(interaction.cancel(), Gesture::Deselected);
        assert_eq!(interaction.pending_promotion(), None);
        assert_eq!(interaction.cancel(), Gesture::Ignored);
    }
}
