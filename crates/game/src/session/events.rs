use std::collections::VecDeque;

use crate::net::GameResult;
use crate::rules::{MoveSpec, Side};

/// Things the presentation layer may want to react to (sounds, flashes).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Registered {
        username: String,
    },
    Searching,
    GameStarted {
        color: Side,
        opponent: String,
    },
    MoveApplied {
        mv: MoveSpec,
        san: String,
        capture: bool,
        castle: bool,
        promotion: bool,
        check: bool,
    },
    DrawOffered,
    DrawDeclined,
    GameOver(GameResult),
    Notice(String),
    Desynchronized,
    Resynchronized {
        ply: usize,
    },
    RequestExpired(&'static str),
    ConnectionLost,
}

/// Bounded FIFO; the oldest event is dropped when full.
#[derive(Debug)]
pub struct EventQueue {
    pending: VecDeque<SessionEvent>,
    max_pending: usize,
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending.min(64)),
            max_pending: max_pending.max(1),
        }
    }

    pub fn push(&mut self, event: SessionEvent) {
        if self.pending.len() >= self.max_pending {
            if let Some(dropped) = self.pending.pop_front() {
                log::debug!("event queue full, dropping {dropped:?}");
            }
        }
        self.pending.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
