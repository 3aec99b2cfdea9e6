mod screens;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

use gambit::{PieceKind, Session, SessionEvent, SessionPhase, TIME_CONTROLS, Transport, view};

use crate::net::{self, ClientConfig, SocketEvent, WsTransport};

pub use screens::Screen;

const CUE_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Resign,
    OfferDraw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    SubmitUsername,
    RequestGame(u32),
    Click,
    Promote(PieceKind),
    Cancel,
    Ask(Confirm),
    Confirmed,
    Dismiss,
    RespondDraw(bool),
    Resync,
    Reconnect,
}

/// Options that act once, as soon as the session allows them.
#[derive(Debug, Clone, Default)]
pub struct Autostart {
    pub username: Option<String>,
    pub time_control: Option<u32>,
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    runtime: Handle,
    config: ClientConfig,
    session: Session<WsTransport>,
    socket_events: UnboundedReceiver<SocketEvent>,
    autostart: Autostart,
    username_input: String,
    username_error: Option<String>,
    selected_index: usize,
    cursor: (usize, usize),
    confirm: Option<Confirm>,
    cue: Option<(String, Instant)>,
    should_quit: bool,
}

impl Tui {
    pub fn new(runtime: Handle, config: ClientConfig, autostart: Autostart) -> io::Result<Self> {
        let connection = net::connect(&runtime, &config.server_url, config.connect_timeout());
        let session = Session::new(connection.transport, config.session.clone());

        let selected_index = TIME_CONTROLS
            .iter()
            .position(|&t| t == config.default_time_control)
            .unwrap_or(0);

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            runtime,
            config,
            session,
            socket_events: connection.events,
            username_input: autostart.username.clone().unwrap_or_default(),
            autostart,
            username_error: None,
            selected_index,
            cursor: (6, 4),
            confirm: None,
            cue: None,
            should_quit: false,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        while !self.should_quit {
            self.pump_socket();
            let now = Instant::now();
            self.session.tick(now);
            self.drain_session_events(now);
            self.autostart();

            self.draw()?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = self.handle_key(key.code, key.modifiers);
                        self.process_action(action);
                    }
                }
            }
        }

        self.session.transport_mut().close();
        Ok(())
    }

    fn pump_socket(&mut self) {
        loop {
            match self.socket_events.try_recv() {
                Ok(SocketEvent::Opened) => self.session.on_open(),
                Ok(SocketEvent::Message(text)) => {
                    // failures are logged by the session
                    let _ = self.session.handle_text(&text);
                }
                Ok(SocketEvent::Error(e)) => self.session.on_error(&e),
                Ok(SocketEvent::Closed) => self.session.on_close(),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.session.on_close();
                    break;
                }
            }
        }
    }

    fn drain_session_events(&mut self, now: Instant) {
        for event in self.session.drain_events() {
            log::debug!("Session event: {:?}", event);
            let cue = match event {
                SessionEvent::GameStarted { .. } => {
                    self.confirm = None;
                    self.cursor = (6, 4);
                    "Game started"
                }
                SessionEvent::MoveApplied { check: true, .. } => "Check!",
                SessionEvent::MoveApplied { capture: true, .. } => "Capture",
                SessionEvent::MoveApplied { castle: true, .. } => "Castle",
                SessionEvent::MoveApplied {
                    promotion: true, ..
                } => "Promotion",
                SessionEvent::MoveApplied { .. } => "Move",
                SessionEvent::GameOver(_) => {
                    self.confirm = None;
                    "Game over"
                }
                SessionEvent::DrawOffered => "Draw offered",
                SessionEvent::Desynchronized => "Resynchronizing",
                SessionEvent::ConnectionLost => "Connection lost",
                _ => continue,
            };
            self.cue = Some((cue.to_string(), now + CUE_DURATION));
        }

        if self.cue.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.cue = None;
        }
    }

    fn autostart(&mut self) {
        if !self.session.status().is_connected() {
            return;
        }
        match self.session.phase() {
            SessionPhase::Unregistered => {
                if let Some(name) = self.autostart.username.take() {
                    self.submit_username(&name);
                }
            }
            SessionPhase::Lobby => {
                if let Some(seconds) = self.autostart.time_control.take() {
                    self.request_game(seconds);
                }
            }
            SessionPhase::Searching | SessionPhase::InGame => {}
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let state = screens::RenderState {
            session: &self.session,
            username_input: &self.username_input,
            username_error: self.username_error.as_deref(),
            selected: self.selected_index,
            cursor: self.cursor,
            confirm: self.confirm,
            cue: self.cue.as_ref().map(|(text, _)| text.as_str()),
            now: Instant::now(),
        };

        self.terminal.draw(|frame| screens::render(frame, &state))?;
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match Screen::of(&self.session) {
            Screen::Connecting => self.handle_connecting_key(code),
            Screen::Disconnected => self.handle_disconnected_key(code),
            Screen::Username => self.handle_username_key(code),
            Screen::Lobby => self.handle_lobby_key(code),
            Screen::Game => self.handle_game_key(code),
        }
    }

    fn handle_connecting_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        }
    }

    fn handle_disconnected_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('c') | KeyCode::Enter => Action::Reconnect,
            KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        }
    }

    fn handle_username_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Enter => Action::SubmitUsername,
            KeyCode::Backspace => {
                self.username_input.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                if self.username_input.chars().count() < 32 {
                    self.username_input.push(c);
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_lobby_key(&mut self, code: KeyCode) -> Action {
        if self.session.phase() == SessionPhase::Searching {
            return match code {
                KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            };
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_index = (self.selected_index + 1).min(TIME_CONTROLS.len() - 1);
                Action::None
            }
            KeyCode::Enter => TIME_CONTROLS
                .get(self.selected_index)
                .map_or(Action::None, |&seconds| Action::RequestGame(seconds)),
            KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        }
    }

    fn handle_game_key(&mut self, code: KeyCode) -> Action {
        if self.confirm.is_some() {
            return match code {
                KeyCode::Char('y') | KeyCode::Enter => Action::Confirmed,
                KeyCode::Char('n') | KeyCode::Esc => Action::Dismiss,
                _ => Action::None,
            };
        }

        if !self.session.status().is_connected() && code == KeyCode::Char('c') {
            return Action::Reconnect;
        }

        let Some(game) = self.session.game() else {
            return Action::None;
        };

        if game.is_over() {
            return match code {
                KeyCode::Char('n') | KeyCode::Enter => Action::RequestGame(
                    game.time_control()
                        .unwrap_or(self.config.default_time_control),
                ),
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
                _ => Action::None,
            };
        }

        if self.session.interaction().pending_promotion().is_some() {
            return match code {
                KeyCode::Char(c) => PieceKind::from_symbol(c)
                    .filter(|kind| kind.is_promotion_choice())
                    .map_or(Action::None, Action::Promote),
                KeyCode::Esc => Action::Cancel,
                _ => Action::None,
            };
        }

        let draw_pending = game.draw_offer().pending;
        match code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.cursor.1 = self.cursor.1.saturating_sub(1);
                Action::None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor.1 = (self.cursor.1 + 1).min(7);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor.0 = self.cursor.0.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor.0 = (self.cursor.0 + 1).min(7);
                Action::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => Action::Click,
            KeyCode::Esc => Action::Cancel,
            KeyCode::Char('R') => Action::Ask(Confirm::Resign),
            KeyCode::Char('d') => Action::Ask(Confirm::OfferDraw),
            KeyCode::Char('a') if draw_pending => Action::RespondDraw(true),
            KeyCode::Char('x') if draw_pending => Action::RespondDraw(false),
            KeyCode::Char('s') => Action::Resync,
            KeyCode::Char('Q') => Action::Quit,
            _ => Action::None,
        }
    }

    fn process_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => {
                self.should_quit = true;
            }
            Action::SubmitUsername => {
                let name = self.username_input.clone();
                self.submit_username(&name);
            }
            Action::RequestGame(seconds) => self.request_game(seconds),
            Action::Click => {
                let Some(color) = self.session.game().map(|g| g.color()) else {
                    return;
                };
                if let Some(square) = view::square_at(color, self.cursor.0, self.cursor.1) {
                    self.session.click_square(square);
                }
            }
            Action::Promote(kind) => {
                self.session.choose_promotion(kind);
            }
            Action::Cancel => {
                self.session.cancel_selection();
            }
            Action::Ask(confirm) => {
                self.confirm = Some(confirm);
            }
            Action::Confirmed => {
                match self.confirm.take() {
                    Some(Confirm::Resign) => {
                        self.session.resign();
                    }
                    Some(Confirm::OfferDraw) => {
                        self.session.offer_draw();
                    }
                    None => {}
                }
            }
            Action::Dismiss => {
                self.confirm = None;
            }
            Action::RespondDraw(accepted) => {
                self.session.respond_to_draw(accepted);
            }
            Action::Resync => {
                self.session.request_resync();
            }
            Action::Reconnect => self.reconnect(),
        }
    }

    fn submit_username(&mut self, name: &str) {
        match self.session.submit_username(name) {
            Ok(()) => self.username_error = None,
            Err(e) => self.username_error = Some(e.to_string()),
        }
    }

    fn request_game(&mut self, seconds: u32) {
        if let Err(e) = self.session.request_game(seconds) {
            log::warn!("Cannot start game: {}", e);
        }
    }

    fn reconnect(&mut self) {
        let connection = net::connect(
            &self.runtime,
            &self.config.server_url,
            self.config.connect_timeout(),
        );
        let mut old = self.session.reattach(connection.transport);
        old.close();
        self.socket_events = connection.events;
    }

    pub fn restore_terminal(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

pub fn run(runtime: Handle, config: ClientConfig, autostart: Autostart) -> io::Result<()> {
    let mut tui = Tui::new(runtime, config, autostart)?;
    let result = tui.run();
    tui.restore_terminal()?;
    result
}
