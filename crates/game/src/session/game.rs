use std::time::Instant;

use crate::net::{GameAssignment, GameResult};
use crate::rules::{AppliedMove, MoveSpec, PieceKind, Position, Side, Square};

use super::clock::ClockState;
use super::error::ReconciliationError;

/// One server-confirmed move. Records are append-only for a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub spec: MoveSpec,
    pub san: String,
    pub mover: Side,
    pub captured: Option<PieceKind>,
    pub castle: bool,
    pub check: bool,
    pub checkmate: bool,
}

impl MoveRecord {
    pub fn from_square(&self) -> Square {
        self.spec.from
    }

    pub fn to_square(&self) -> Square {
        self.spec.to
    }

    pub fn promotion(&self) -> Option<PieceKind> {
        self.spec.promotion
    }
}

impl From<AppliedMove> for MoveRecord {
    fn from(applied: AppliedMove) -> Self {
        Self {
            spec: applied.spec,
            san: applied.san,
            mover: applied.mover,
            captured: applied.captured,
            castle: applied.castle,
            check: applied.check,
            checkmate: applied.checkmate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawOffer {
    /// The opponent offered and we have not answered.
    pub pending: bool,
    /// We offered and the opponent has not answered.
    pub sent: bool,
}

/// A game assigned by the server, from `init_game` until the next one.
#[derive(Debug, Clone)]
pub struct Game {
    id: Option<String>,
    color: Side,
    white_player: String,
    black_player: String,
    time_control: Option<u32>,
    position: Position,
    records: Vec<MoveRecord>,
    stale: bool,
    clock: ClockState,
    draw: DrawOffer,
    result: Option<GameResult>,
}

impl Game {
    pub fn new(assignment: GameAssignment, requested_time: Option<u32>, now: Instant) -> Self {
        let time_control = assignment.time_control.or(requested_time);
        let mut clock = ClockState::new(time_control.unwrap_or(0) as f64);
        clock.set_running(Some(Side::White), now);

        Self {
            id: assignment.game_id,
            color: assignment.color,
            white_player: assignment.white_player,
            black_player: assignment.black_player,
            time_control,
            position: Position::start(),
            records: Vec::new(),
            stale: false,
            clock,
            draw: DrawOffer::default(),
            result: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn color(&self) -> Side {
        self.color
    }

    pub fn player(&self, side: Side) -> &str {
        match side {
            Side::White => &self.white_player,
            Side::Black => &self.black_player,
        }
    }

    pub fn opponent(&self) -> &str {
        self.player(self.color.opposite())
    }

    pub fn time_control(&self) -> Option<u32> {
        self.time_control
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn side_to_move(&self) -> Side {
        self.position.side_to_move()
    }

    pub fn in_check(&self) -> bool {
        self.position.in_check()
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn ply(&self) -> usize {
        self.records.len()
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn clock(&self) -> &ClockState {
        &self.clock
    }

    pub fn draw_offer(&self) -> DrawOffer {
        self.draw
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Active, not over, and the snapshot can be trusted.
    pub fn is_live(&self) -> bool {
        !self.is_over() && !self.stale
    }

    pub fn is_my_turn(&self) -> bool {
        self.is_live() && self.side_to_move() == self.color
    }

    /// Applies exactly one server-confirmed move. On failure nothing changes.
    pub(crate) fn apply_confirmed(
        &mut self,
        mv: MoveSpec,
        now: Instant,
    ) -> Result<&MoveRecord, ReconciliationError> {
        let applied = self
            .position
            .apply(mv)
            .map_err(|source| ReconciliationError::MoveRejected {
                ply: self.records.len(),
                mv,
                source,
            })?;

        self.position = applied.position;
        self.records.push(applied.into());
        self.clock
            .set_running(Some(self.position.side_to_move()), now);

        Ok(&self.records[self.records.len() - 1])
    }

    /// Replays a full move list from the start position. The game is only
    /// replaced when every move applies.
    pub(crate) fn rebuild(&mut self, moves: &[MoveSpec], now: Instant) -> Result<(), ReconciliationError> {
        let mut position = Position::start();
        let mut records = Vec::with_capacity(moves.len());
        for (ply, &mv) in moves.iter().enumerate() {
            let applied = position
                .apply(mv)
                .map_err(|source| ReconciliationError::MoveRejected { ply, mv, source })?;
            position = applied.position;
            records.push(MoveRecord::from(applied));
        }

        self.position = position;
        self.records = records;
        self.stale = false;
        if self.result.is_none() {
            self.clock.set_running(Some(position.side_to_move()), now);
        }
        Ok(())
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    pub(crate) fn clock_mut(&mut self) -> &mut ClockState {
        &mut self.clock
    }

    pub(crate) fn draw_mut(&mut self) -> &mut DrawOffer {
        &mut self.draw
    }

    /// Records the result. A finished game keeps its first result; returns
    /// false when this one was dropped.
    pub(crate) fn finish(&mut self, result: GameResult, now: Instant) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(result);
        self.draw = DrawOffer::default();
        self.clock.set_running(None, now);
        true
    }
}
