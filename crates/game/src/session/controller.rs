use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::interaction::{Gesture, Interaction};
use crate::net::{
    ClientMessage, ConnectionStatus, EndReason, GameAssignment, GameResult, ServerMessage,
    SyncState, Transport,
};
use crate::rules::{MoveSpec, PieceKind, Square};

use super::config::SessionConfig;
use super::error::{ReconciliationError, SessionError, ValidationError};
use super::events::{EventQueue, SessionEvent};
use super::game::Game;
use super::username::validate_username;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unregistered,
    Lobby,
    Searching,
    InGame,
}

/// One-shot requests that wait for a server answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestKind {
    Move,
    Resign,
    DrawOffer,
    DrawResponse,
    Resync,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Move => "move",
            RequestKind::Resign => "resign",
            RequestKind::DrawOffer => "draw offer",
            RequestKind::DrawResponse => "draw response",
            RequestKind::Resync => "resync",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub expires_at: Instant,
}

/// Client side of one connection to the game server.
///
/// Owns the transport, the current game snapshot and the move-building
/// gesture. Every mutation comes from exactly one inbound message, one user
/// action, or one [`Session::tick`].
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    status: ConnectionStatus,
    username: Option<String>,
    phase: SessionPhase,
    requested_time_control: Option<u32>,
    game: Option<Game>,
    interaction: Interaction,
    outstanding: BTreeMap<RequestKind, Instant>,
    notice: Option<Notice>,
    events: EventQueue,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let events = EventQueue::new(config.max_events);
        Self {
            transport,
            config,
            status: ConnectionStatus::Connecting,
            username: None,
            phase: SessionPhase::Unregistered,
            requested_time_control: None,
            game: None,
            interaction: Interaction::new(),
            outstanding: BTreeMap::new(),
            notice: None,
            events,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn requested_time_control(&self) -> Option<u32> {
        self.requested_time_control
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_outstanding(&self, kind: RequestKind) -> bool {
        self.outstanding.contains_key(&kind)
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain()
    }

    fn live_game(&self) -> Option<&Game> {
        self.game.as_ref().filter(|g| g.is_live())
    }

    fn game_in_progress(&self) -> bool {
        self.phase == SessionPhase::Searching || self.game.as_ref().is_some_and(|g| !g.is_over())
    }

    // ---- transport lifecycle ----

    /// The channel is up. A session that was already registered (or mid-game)
    /// announces itself again so the server can resume it.
    pub fn on_open(&mut self) {
        self.status = ConnectionStatus::Connected;
        log::info!("Connected to server");

        if let Some(username) = self.username.clone() {
            self.send(ClientMessage::SetUsername { username });
        }

        match self.phase {
            SessionPhase::Searching => {
                if let Some(seconds) = self.requested_time_control {
                    self.send(ClientMessage::TimeControl { seconds });
                    self.send(ClientMessage::InitGame);
                }
            }
            SessionPhase::InGame => {
                let resume = self
                    .game
                    .as_ref()
                    .filter(|g| !g.is_over())
                    .and_then(|g| g.id().map(|id| (id.to_string(), g.ply())));
                if let Some((game_id, ply)) = resume {
                    log::info!("Resuming game {} at ply {}", game_id, ply);
                    if self.send(ClientMessage::Resume { game_id, ply }) {
                        self.outstanding.insert(RequestKind::Resync, Instant::now());
                    }
                }
            }
            SessionPhase::Unregistered | SessionPhase::Lobby => {}
        }
    }

    pub fn on_close(&mut self) {
        if self.status == ConnectionStatus::Disconnected {
            return;
        }
        log::warn!("Server connection lost");
        self.status = ConnectionStatus::Disconnected;
        self.outstanding.clear();
        self.interaction.reset();
        if let Some(game) = self.game.as_mut() {
            game.draw_mut().sent = false;
        }
        self.events.push(SessionEvent::ConnectionLost);
    }

    pub fn on_error(&mut self, error: &str) {
        log::error!("Transport error: {}", error);
        self.post_notice(format!("Connection error: {error}"), self.config.error_notice());
    }

    /// Swaps in a fresh transport after a disconnect. The session resumes
    /// once the new channel reports [`Session::on_open`].
    pub fn reattach(&mut self, transport: T) -> T {
        self.status = ConnectionStatus::Connecting;
        self.outstanding.clear();
        std::mem::replace(&mut self.transport, transport)
    }

    // ---- local actions ----

    pub fn submit_username(&mut self, name: &str) -> Result<(), ValidationError> {
        if !self.status.is_connected() {
            return Err(ValidationError::NotConnected);
        }
        if self.game_in_progress() {
            return Err(ValidationError::GameInProgress);
        }

        let username = validate_username(name, &self.config.username_denylist)?;
        log::info!("Registering as {}", username);
        self.send(ClientMessage::SetUsername {
            username: username.clone(),
        });

        self.username = Some(username.clone());
        if self.phase == SessionPhase::Unregistered {
            self.phase = SessionPhase::Lobby;
        }
        self.events.push(SessionEvent::Registered { username });
        Ok(())
    }

    pub fn request_game(&mut self, seconds: u32) -> Result<(), ValidationError> {
        if !self.status.is_connected() {
            return Err(ValidationError::NotConnected);
        }
        if self.username.is_none() {
            return Err(ValidationError::NotRegistered);
        }
        if self.game_in_progress() {
            return Err(ValidationError::GameInProgress);
        }
        if seconds == 0 {
            return Err(ValidationError::InvalidTimeControl);
        }

        self.send(ClientMessage::TimeControl { seconds });
        self.send(ClientMessage::InitGame);

        log::info!("Looking for opponent ({}s)", seconds);
        self.requested_time_control = Some(seconds);
        self.phase = SessionPhase::Searching;
        self.game = None;
        self.interaction.reset();
        self.outstanding.clear();
        self.notice = None;
        self.events.push(SessionEvent::Searching);
        Ok(())
    }

    /// Sends a move request. Returns `false` when the move was not sent:
    /// not our turn, not legal on the cached snapshot, or a move is already
    /// in flight.
    pub fn attempt_move(&mut self, mv: MoveSpec) -> bool {
        if !self.status.is_connected() || self.is_outstanding(RequestKind::Move) {
            return false;
        }
        let Some(game) = self.game.as_ref() else {
            return false;
        };
        if !game.is_my_turn() {
            return false;
        }
        if !game.position().is_legal(mv) {
            log::debug!("Refusing illegal move {}", mv);
            return false;
        }

        log::debug!("Sending move {}", mv);
        self.send_request(RequestKind::Move, ClientMessage::Move(mv))
    }

    pub fn resign(&mut self) -> bool {
        if self.live_game().is_none() {
            return false;
        }
        self.send_request(RequestKind::Resign, ClientMessage::Resign)
    }

    pub fn offer_draw(&mut self) -> bool {
        match self.live_game() {
            Some(game) if !game.draw_offer().sent => {}
            _ => return false,
        }
        if !self.send_request(RequestKind::DrawOffer, ClientMessage::DrawOffer) {
            return false;
        }
        if let Some(game) = self.game.as_mut() {
            game.draw_mut().sent = true;
        }
        true
    }

    pub fn respond_to_draw(&mut self, accepted: bool) -> bool {
        match self.live_game() {
            Some(game) if game.draw_offer().pending => {}
            _ => return false,
        }

        let message = ClientMessage::DrawResponse { accepted };
        let sent = if accepted {
            // accepted offers are answered by game_over
            self.send_request(RequestKind::DrawResponse, message)
        } else {
            self.status.is_connected() && self.send(message)
        };
        if !sent {
            return false;
        }

        if let Some(game) = self.game.as_mut() {
            game.draw_mut().pending = false;
        }
        true
    }

    /// Asks the server for the full move list of the current game.
    pub fn request_resync(&mut self) -> bool {
        let Some(game) = self.game.as_ref().filter(|g| !g.is_over()) else {
            return false;
        };
        let game_id = game.id().map(str::to_string);
        self.send_request(RequestKind::Resync, ClientMessage::SyncRequest { game_id })
    }

    // ---- gestures ----

    pub fn click_square(&mut self, square: Square) -> Gesture {
        let Some(game) = self.live_game() else {
            return Gesture::Ignored;
        };
        let (position, color) = (*game.position(), game.color());

        let gesture = self.interaction.click(square, &position, color);
        if let Gesture::Completed(mv) = gesture {
            self.attempt_move(mv);
        }
        gesture
    }

    pub fn choose_promotion(&mut self, kind: PieceKind) -> Gesture {
        if self.live_game().is_none() {
            return Gesture::Ignored;
        }
        let gesture = self.interaction.choose_promotion(kind);
        if let Gesture::Completed(mv) = gesture {
            self.attempt_move(mv);
        }
        gesture
    }

    pub fn cancel_selection(&mut self) -> Gesture {
        self.interaction.cancel()
    }

    // ---- timers ----

    /// Expires notices and requests the server never answered.
    pub fn tick(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.notice = None;
        }

        let Some(timeout) = self.config.request_timeout() else {
            return;
        };
        let expired: Vec<RequestKind> = self
            .outstanding
            .iter()
            .filter(|(_, sent_at)| now.saturating_duration_since(**sent_at) >= timeout)
            .map(|(kind, _)| *kind)
            .collect();

        for kind in expired {
            self.outstanding.remove(&kind);
            log::warn!("No answer to {} request", kind.as_str());
            if kind == RequestKind::DrawOffer {
                if let Some(game) = self.game.as_mut() {
                    game.draw_mut().sent = false;
                }
            }
            self.post_notice_at(
                format!("No response to {} request", kind.as_str()),
                now + self.config.error_notice(),
            );
            self.events.push(SessionEvent::RequestExpired(kind.as_str()));
        }
    }

    // ---- inbound ----

    /// Decodes and applies one frame. Errors are already logged; callers may
    /// ignore them.
    pub fn handle_text(&mut self, text: &str) -> Result<(), SessionError> {
        let message = ServerMessage::decode(text).inspect_err(|e| {
            log::warn!("Dropping server message: {}", e);
        })?;
        self.handle_message(message)
    }

    pub fn handle_message(&mut self, message: ServerMessage) -> Result<(), SessionError> {
        log::debug!("Server message: {}", message.kind());
        let now = Instant::now();

        match message {
            ServerMessage::Waiting => {
                if self.game.as_ref().is_some_and(|g| !g.is_over()) {
                    log::warn!("Ignoring waiting during a live game");
                } else {
                    self.phase = SessionPhase::Searching;
                }
            }
            ServerMessage::InitGame(assignment) => self.start_game(assignment, now),
            ServerMessage::Move(mv) => self.apply_server_move(mv, now)?,
            ServerMessage::TimeUpdate(update) => {
                if let Some(game) = self.game.as_mut() {
                    game.clock_mut()
                        .update(update.white_time, update.black_time, now);
                }
            }
            ServerMessage::GameOver(result) => self.finish_game(result, now),
            ServerMessage::DrawOffer => {
                if let Some(game) = self.game.as_mut().filter(|g| g.is_live()) {
                    game.draw_mut().pending = true;
                    log::info!("Draw offer received");
                    self.events.push(SessionEvent::DrawOffered);
                }
            }
            ServerMessage::DrawDeclined => {
                self.outstanding.remove(&RequestKind::DrawOffer);
                if let Some(game) = self.game.as_mut() {
                    game.draw_mut().sent = false;
                }
                self.post_notice(
                    "Draw offer declined. Continue playing!".to_string(),
                    self.config.draw_declined_notice(),
                );
                self.events.push(SessionEvent::DrawDeclined);
            }
            ServerMessage::DrawAccepted => {
                log::info!("Draw accepted, waiting for result");
                self.outstanding.remove(&RequestKind::DrawOffer);
            }
            ServerMessage::OpponentDisconnected => {
                let color = match self.game.as_ref().filter(|g| !g.is_over()) {
                    Some(game) => game.color(),
                    None => return Ok(()),
                };
                log::info!("Opponent disconnected");
                self.finish_game(
                    GameResult {
                        winner: color.into(),
                        reason: EndReason::Forfeit,
                    },
                    now,
                );
            }
            ServerMessage::Error { message } => {
                log::warn!("Server error: {}", message);
                self.outstanding.remove(&RequestKind::Move);
                self.post_notice(message.clone(), self.config.error_notice());
                self.events.push(SessionEvent::Notice(message));
            }
            ServerMessage::Sync(state) => self.resync(state, now)?,
        }

        Ok(())
    }

    fn start_game(&mut self, assignment: GameAssignment, now: Instant) {
        let game = Game::new(assignment, self.requested_time_control, now);
        log::info!(
            "Game started as {} against {}",
            game.color(),
            game.opponent()
        );

        self.events.push(SessionEvent::GameStarted {
            color: game.color(),
            opponent: game.opponent().to_string(),
        });
        self.game = Some(game);
        self.phase = SessionPhase::InGame;
        self.interaction.reset();
        self.outstanding.clear();
        self.notice = None;
    }

    fn apply_server_move(&mut self, mv: MoveSpec, now: Instant) -> Result<(), SessionError> {
        let Some(game) = self.game.as_mut() else {
            log::warn!("Move {} received with no game", mv);
            return Err(ReconciliationError::NoActiveGame.into());
        };
        if game.is_stale() {
            log::debug!("Ignoring move {} while waiting for resync", mv);
            return Ok(());
        }

        match game.apply_confirmed(mv, now) {
            Ok(record) => {
                let event = SessionEvent::MoveApplied {
                    mv,
                    san: record.san.clone(),
                    capture: record.captured.is_some(),
                    castle: record.castle,
                    promotion: record.promotion().is_some(),
                    check: record.check,
                };
                self.interaction.reset();
                self.outstanding.remove(&RequestKind::Move);
                self.events.push(event);
                Ok(())
            }
            Err(err) => {
                log::error!("Desynchronized: {}", err);
                game.mark_stale();
                let game_id = game.id().map(str::to_string);

                self.interaction.reset();
                self.outstanding.clear();
                self.events.push(SessionEvent::Desynchronized);
                self.send_request(RequestKind::Resync, ClientMessage::SyncRequest { game_id });
                Err(err.into())
            }
        }
    }

    fn finish_game(&mut self, result: GameResult, now: Instant) {
        let Some(game) = self.game.as_mut() else {
            log::warn!("Game over received with no game");
            return;
        };
        if !game.finish(result.clone(), now) {
            log::warn!("Ignoring repeated game over: {:?}", result);
            return;
        }
        log::info!("Game over: {:?} by {:?}", result.winner, result.reason);
        self.interaction.reset();
        self.outstanding.clear();
        self.events.push(SessionEvent::GameOver(result));
    }

    fn resync(&mut self, state: SyncState, now: Instant) -> Result<(), SessionError> {
        let Some(game) = self.game.as_mut() else {
            log::warn!("Sync received with no game");
            return Ok(());
        };
        if let (Some(ours), Some(theirs)) = (game.id(), state.game_id.as_deref()) {
            if ours != theirs {
                log::warn!("Ignoring sync for game {}", theirs);
                return Ok(());
            }
        }

        if let Err(err) = game.rebuild(&state.moves, now) {
            log::error!("Resync failed: {}", err);
            game.mark_stale();
            self.outstanding.remove(&RequestKind::Resync);
            return Err(err.into());
        }

        if let Some(id) = state.game_id {
            game.set_id(id);
        }
        if let (Some(white), Some(black)) = (state.white_time, state.black_time) {
            game.clock_mut().update(white, black, now);
        }
        let ply = game.ply();

        log::info!("Resynchronized at ply {}", ply);
        self.interaction.reset();
        self.outstanding.remove(&RequestKind::Resync);
        self.outstanding.remove(&RequestKind::Move);
        self.events.push(SessionEvent::Resynchronized { ply });
        Ok(())
    }

    // ---- outbound ----

    fn send_request(&mut self, kind: RequestKind, message: ClientMessage) -> bool {
        if !self.status.is_connected() || self.outstanding.contains_key(&kind) {
            return false;
        }
        if !self.send(message) {
            return false;
        }
        self.outstanding.insert(kind, Instant::now());
        true
    }

    fn send(&mut self, message: ClientMessage) -> bool {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to encode {}: {}", message.kind(), e);
                return false;
            }
        };
        match self.transport.send(&text) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to send {}: {}", message.kind(), e);
                false
            }
        }
    }

    fn post_notice(&mut self, text: String, ttl: Duration) {
        self.post_notice_at(text, Instant::now() + ttl);
    }

    fn post_notice_at(&mut self, text: String, expires_at: Instant) {
        self.notice = Some(Notice { text, expires_at });
    }
}
