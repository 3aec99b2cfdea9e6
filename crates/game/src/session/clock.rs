use std::time::Instant;

use crate::rules::Side;

/// Last clock broadcast from the server. The server owns the time; this is
/// only a projection of what it said.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockState {
    white: f64,
    black: f64,
    running: Option<Side>,
    updated_at: Option<Instant>,
}

impl ClockState {
    pub fn new(seconds: f64) -> Self {
        Self {
            white: seconds,
            black: seconds,
            running: None,
            updated_at: None,
        }
    }

    pub fn update(&mut self, white: f64, black: f64, now: Instant) {
        self.white = white.max(0.0);
        self.black = black.max(0.0);
        self.updated_at = Some(now);
    }

    pub fn set_running(&mut self, running: Option<Side>, now: Instant) {
        if self.running != running {
            self.running = running;
            self.updated_at = Some(now);
        }
    }

    pub fn running(&self) -> Option<Side> {
        self.running
    }

    pub fn remaining(&self, side: Side) -> f64 {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    /// Remaining time for display. With `interpolate`, the running side is
    /// counted down locally from the last broadcast.
    pub fn display_remaining(&self, side: Side, now: Instant, interpolate: bool) -> f64 {
        let base = self.remaining(side);
        if !interpolate || self.running != Some(side) {
            return base;
        }
        match self.updated_at {
            Some(at) => (base - now.saturating_duration_since(at).as_secs_f64()).max(0.0),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn projection_without_interpolation() {
        let start = Instant::now();
        let mut clock = ClockState::new(300.0);
        clock.set_running(Some(Side::White), start);

        let later = start + Duration::from_secs(5);
        assert_eq!(clock.display_remaining(Side::White, later, false), 300.0);

        clock.update(290.5, 300.0, later);
        assert_eq!(clock.remaining(Side::White), 290.5);
    }

    #[test]
    fn interpolates_running_side_only() {
        let start = Instant::now();
        let mut clock = ClockState::new(60.0);
        clock.set_running(Some(Side::Black), start);

        let later = start + Duration::from_secs(3);
        assert_eq!(clock.display_remaining(Side::Black, later, true), 57.0);
        assert_eq!(clock.display_remaining(Side::White, later, true), 60.0);

        let much_later = start + Duration::from_secs(120);
        assert_eq!(clock.display_remaining(Side::Black, much_later, true), 0.0);
    }

    #[test]
    fn switching_sides_keeps_broadcast_values() {
        let start = Instant::now();
        let mut clock = ClockState::new(300.0);
        clock.update(300.0, 300.0, start);
        clock.set_running(Some(Side::White), start);

        let later = start + Duration::from_secs(7);
        clock.set_running(Some(Side::Black), later);
        assert_eq!(clock.remaining(Side::White), 300.0);
        assert_eq!(clock.display_remaining(Side::White, later, false), 300.0);

        clock.set_running(None, later + Duration::from_secs(4));
        assert_eq!(clock.remaining(Side::Black), 300.0);
    }
}
