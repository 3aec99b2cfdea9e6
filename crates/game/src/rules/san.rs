use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece};

use super::{PieceKind, Square};

/// Standard algebraic notation for a move already known to be legal on `board`.
pub(crate) fn render(board: &Board, mv: ChessMove) -> String {
    let source = mv.get_source();
    let dest = mv.get_dest();
    let Some(piece) = board.piece_on(source) else {
        return format!("{}{}", Square::from_engine(source), Square::from_engine(dest));
    };

    let from = Square::from_engine(source);
    let to = Square::from_engine(dest);

    let mut san = String::with_capacity(8);
    if piece == Piece::King && from.file().abs_diff(to.file()) == 2 {
        san.push_str(if to.file() > from.file() { "O-O" } else { "O-O-O" });
    } else {
        let capture = board.piece_on(dest).is_some()
            || (piece == Piece::Pawn && from.file() != to.file());

        if piece == Piece::Pawn {
            if capture {
                san.push(from.file_char());
            }
        } else {
            san.push(letter(piece.into()));
            san.push_str(&disambiguation(board, mv, piece));
        }

        if capture {
            san.push('x');
        }
        san.push_str(&to.to_string());

        if let Some(promotion) = mv.get_promotion() {
            san.push('=');
            san.push(letter(promotion.into()));
        }
    }

    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if after.checkers().popcnt() > 0 {
        san.push('+');
    }

    san
}

fn letter(kind: PieceKind) -> char {
    kind.symbol().to_ascii_uppercase()
}

fn disambiguation(board: &Board, mv: ChessMove, piece: Piece) -> String {
    let from = Square::from_engine(mv.get_source());
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == mv.get_dest()
                && other.get_source() != mv.get_source()
                && board.piece_on(other.get_source()) == Some(piece)
        })
        .map(|other| Square::from_engine(other.get_source()))
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|r| r.file() != from.file()) {
        from.file_char().to_string()
    } else if rivals.iter().all(|r| r.rank() != from.rank()) {
        from.rank_char().to_string()
    } else {
        from.to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::{MoveSpec, Position};

    fn san_of(fen: &str, from: &str, to: &str) -> String {
        let position = Position::from_fen(fen).unwrap();
        let spec = MoveSpec::new(from.parse().unwrap(), to.parse().unwrap());
        position.apply(spec).unwrap().san
    }

    #[test]
    fn piece_moves_and_captures() {
        let start = chess::Board::default().to_string();
        assert_eq!(san_of(&start, "g1", "f3"), "Nf3");
        assert_eq!(
            san_of(
                "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
                "e4",
                "d5"
            ),
            "exd5"
        );
    }

    #[test]
    fn disambiguates_by_file_then_rank() {
        // knights on b1 and f1 can both reach d2
        assert_eq!(san_of("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1", "b1", "d2"), "Nbd2");
        // rooks on a1 and a5 share a file
        assert_eq!(san_of("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1", "a1", "a3"), "R1a3");
    }

    #[test]
    fn marks_check() {
        assert_eq!(san_of("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", "a1", "a8"), "Ra8+");
    }
}
