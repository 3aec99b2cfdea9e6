use crate::rules::{PieceKind, Position, Side};

/// Pieces each side has taken, one entry per missing enemy unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPieces {
    pub by_white: Vec<PieceKind>,
    pub by_black: Vec<PieceKind>,
}

impl CapturedPieces {
    pub fn by(&self, side: Side) -> &[PieceKind] {
        match side {
            Side::White => &self.by_white,
            Side::Black => &self.by_black,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_white.is_empty() && self.by_black.is_empty()
    }
}

/// Start counts minus what is still on the board. A promoted pawn stays
/// "captured" and an extra queen never goes negative.
pub fn captured_pieces(position: &Position) -> CapturedPieces {
    CapturedPieces {
        by_white: missing(position, Side::Black),
        by_black: missing(position, Side::White),
    }
}

fn missing(position: &Position, side: Side) -> Vec<PieceKind> {
    PieceKind::ALL
        .iter()
        .flat_map(|&kind| {
            let gone = kind
                .start_count()
                .saturating_sub(position.count(side, kind));
            std::iter::repeat_n(kind, gone as usize)
        })
        .collect()
}

pub fn material_value(pieces: &[PieceKind]) -> i32 {
    pieces.iter().map(|kind| kind.value()).sum()
}

/// Positive when white is ahead.
pub fn material_balance(captured: &CapturedPieces) -> i32 {
    material_value(&captured.by_white) - material_value(&captured.by_black)
}

/// `+N` when `perspective` is ahead, nothing otherwise.
pub fn material_label(balance: i32, perspective: Side) -> Option<String> {
    let relative = match perspective {
        Side::White => balance,
        Side::Black => -balance,
    };
    (relative > 0).then(|| format!("+{relative}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_has_no_captures() {
        let captured = captured_pieces(&Position::start());
        assert!(captured.is_empty());
        assert_eq!(material_balance(&captured), 0);
    }

    #[test]
    fn missing_white_knight_and_pawn() {
        // white lacks the g1 knight and the e2 pawn
        let position = Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPP1PPP/RNBQKB1R w KQkq - 0 1",
        )
        .unwrap();
        let captured = captured_pieces(&position);

        assert_eq!(captured.by_black, vec![PieceKind::Pawn, PieceKind::Knight]);
        assert!(captured.by_white.is_empty());
        assert_eq!(material_balance(&captured), -4);
        assert_eq!(material_label(-4, Side::Black), Some("+4".to_string()));
        assert_eq!(material_label(-4, Side::White), None);
    }

    #[test]
    fn promotion_does_not_go_negative() {
        let position = Position::from_fen("Q7/8/8/7k/8/8/8/Q3K3 w - - 0 1").unwrap();
        let captured = captured_pieces(&position);
        assert!(!captured.by_black.contains(&PieceKind::Queen));
        assert_eq!(
            captured.by_black.iter().filter(|&&k| k == PieceKind::Pawn).count(),
            8
        );
    }
}
