use std::time::Instant;

use crate::net::{ConnectionStatus, EndReason, GameResult, Transport, Winner};
use crate::rules::Side;
use crate::session::{Game, Session, SessionPhase};

/// Text for the game-over overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub headline: &'static str,
    pub message: String,
}

pub fn outcome(result: &GameResult, perspective: Side) -> Outcome {
    let headline = match result.winner.side() {
        None => "Draw",
        Some(side) if side == perspective => "Victory",
        Some(_) => "Defeat",
    };
    Outcome {
        headline,
        message: result_message(result),
    }
}

pub fn result_message(result: &GameResult) -> String {
    let winner = match result.winner {
        Winner::White => Side::White.title(),
        Winner::Black => Side::Black.title(),
        Winner::Draw => {
            return match result.reason {
                EndReason::Agreement => "Game drawn by agreement!".to_string(),
                EndReason::Other(ref reason) => format!("Game drawn ({reason})"),
                _ => "Game drawn!".to_string(),
            };
        }
    };

    match &result.reason {
        EndReason::Checkmate => format!("Checkmate! {winner} wins!"),
        EndReason::Resignation => format!("{winner} wins by resignation!"),
        EndReason::Timeout => format!("{winner} wins on time!"),
        EndReason::Agreement => format!("{winner} wins by agreement!"),
        EndReason::Forfeit => "Opponent disconnected. You win!".to_string(),
        EndReason::Other(reason) => format!("{winner} wins ({reason})"),
    }
}

/// Display name for whoever is to move, falling back to the color.
fn mover_name(game: &Game) -> &str {
    let side = game.side_to_move();
    match game.player(side) {
        "" => side.title(),
        name => name,
    }
}

pub fn turn_line(game: &Game) -> String {
    if game.in_check() {
        format!("CHECK! {}'s turn", mover_name(game))
    } else {
        format!("{}'s turn", mover_name(game))
    }
}

/// The one-line status shown under the board.
pub fn status_line<T: Transport>(session: &Session<T>, now: Instant) -> String {
    match session.status() {
        ConnectionStatus::Connecting => return "Connecting to server...".to_string(),
        ConnectionStatus::Disconnected => return "Disconnected from server".to_string(),
        ConnectionStatus::Connected => {}
    }

    if let Some(notice) = session.notice().filter(|n| n.expires_at > now) {
        return notice.text.clone();
    }

    match session.phase() {
        SessionPhase::Unregistered => "Choose a username".to_string(),
        SessionPhase::Lobby => "Pick a time control to find an opponent".to_string(),
        SessionPhase::Searching => "Waiting for opponent...".to_string(),
        SessionPhase::InGame => match session.game() {
            None => "Waiting for opponent...".to_string(),
            Some(game) => game_line(game),
        },
    }
}

fn game_line(game: &Game) -> String {
    if let Some(result) = game.result() {
        return result_message(result);
    }
    if game.is_stale() {
        return "Out of sync with server. Resynchronizing...".to_string();
    }

    let draw = game.draw_offer();
    if draw.pending {
        "Your opponent offers a draw!".to_string()
    } else if draw.sent {
        "Draw offer sent. Waiting for response...".to_string()
    } else {
        turn_line(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_follows_perspective() {
        let result = GameResult {
            winner: Winner::Black,
            reason: EndReason::Resignation,
        };
        assert_eq!(outcome(&result, Side::Black).headline, "Victory");
        assert_eq!(outcome(&result, Side::White).headline, "Defeat");
        assert_eq!(
            outcome(&result, Side::White).message,
            "Black wins by resignation!"
        );

        let draw = GameResult {
            winner: Winner::Draw,
            reason: EndReason::Agreement,
        };
        assert_eq!(outcome(&draw, Side::White).headline, "Draw");
        assert_eq!(result_message(&draw), "Game drawn by agreement!");
    }

    #[test]
    fn result_messages() {
        let message = |winner, reason| result_message(&GameResult { winner, reason });
        assert_eq!(
            message(Winner::White, EndReason::Checkmate),
            "Checkmate! White wins!"
        );
        assert_eq!(message(Winner::Black, EndReason::Timeout), "Black wins on time!");
        assert_eq!(
            message(Winner::White, EndReason::Forfeit),
            "Opponent disconnected. You win!"
        );
    }
}
