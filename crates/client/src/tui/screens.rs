use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use gambit::view::{self, GameView, SquareView};
use gambit::{ConnectionStatus, Game, PieceKind, Session, SessionPhase, Side, TIME_CONTROLS};

use super::Confirm;
use crate::net::WsTransport;

const LIGHT_SQUARE: Color = Color::Rgb(240, 217, 181);
const DARK_SQUARE: Color = Color::Rgb(181, 136, 99);
const LAST_MOVE: Color = Color::Rgb(205, 210, 106);
const SELECTED: Color = Color::Rgb(246, 246, 105);
const TARGET: Color = Color::Rgb(130, 170, 110);
const CHECK: Color = Color::Rgb(220, 70, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Connecting,
    Disconnected,
    Username,
    Lobby,
    Game,
}

impl Screen {
    pub fn of(session: &Session<WsTransport>) -> Self {
        if session.game().is_some() && session.phase() == SessionPhase::InGame {
            return Screen::Game;
        }
        match (session.status(), session.phase()) {
            (ConnectionStatus::Connecting, _) => Screen::Connecting,
            (ConnectionStatus::Disconnected, _) => Screen::Disconnected,
            (ConnectionStatus::Connected, SessionPhase::Unregistered) => Screen::Username,
            (ConnectionStatus::Connected, _) => Screen::Lobby,
        }
    }
}

pub struct RenderState<'a> {
    pub session: &'a Session<WsTransport>,
    pub username_input: &'a str,
    pub username_error: Option<&'a str>,
    pub selected: usize,
    pub cursor: (usize, usize),
    pub confirm: Option<Confirm>,
    pub cue: Option<&'a str>,
    pub now: Instant,
}

pub fn render(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();

    let title = match state.session.username() {
        Some(name) => format!(" Gambit · {} ", name),
        None => " Gambit ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(0)])
        .split(area)[0];

    match Screen::of(state.session) {
        Screen::Connecting => render_connecting(frame, inner),
        Screen::Disconnected => render_disconnected(frame, inner),
        Screen::Username => render_username(frame, inner, state),
        Screen::Lobby => render_lobby(frame, inner, state),
        Screen::Game => {
            if let Some(game) = state.session.game() {
                render_game(frame, inner, state, game);
            }
        }
    }
}

fn render_connecting(frame: &mut Frame, area: Rect) {
    let dialog_area = centered_rect(40, 7, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Connecting ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(dialog_area);

    let status = Paragraph::new("Connecting to server...\n\nPlease wait...")
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    frame.render_widget(status, inner[0]);

    let help = Paragraph::new("Esc Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[1]);
}

fn render_disconnected(frame: &mut Frame, area: Rect) {
    let dialog_area = centered_rect(44, 7, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Disconnected ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(dialog_area);

    let status = Paragraph::new("Disconnected from server")
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center);
    frame.render_widget(status, inner[0]);

    let help = Paragraph::new("C Reconnect  Q Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[1]);
}

fn render_username(frame: &mut Frame, area: Rect, state: &RenderState) {
    let dialog_area = centered_rect(50, 10, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Choose a Username ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(dialog_area);

    let label = Paragraph::new("Username:").style(Style::default().fg(Color::White));
    frame.render_widget(label, inner[0]);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let input = Paragraph::new(format!("{}_", state.username_input))
        .style(Style::default().fg(Color::White))
        .block(input_block);
    frame.render_widget(input, inner[1]);

    if let Some(error) = state.username_error {
        let error = Paragraph::new(error).style(Style::default().fg(Color::Red));
        frame.render_widget(error, inner[2]);
    }

    let help = Paragraph::new("Enter Continue  Esc Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[3]);
}

fn time_control_label(seconds: u32) -> String {
    format!("{} min", seconds / 60)
}

fn render_lobby(frame: &mut Frame, area: Rect, state: &RenderState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    let status = Paragraph::new(view::status_line(state.session, state.now))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    frame.render_widget(status, chunks[0]);

    let searching = state.session.phase() == SessionPhase::Searching;
    let requested = state.session.requested_time_control();

    let items: Vec<ListItem> = TIME_CONTROLS
        .iter()
        .enumerate()
        .map(|(i, &seconds)| {
            let marker = if searching && requested == Some(seconds) {
                "» "
            } else {
                "  "
            };
            let item = ListItem::new(format!("{}{}", marker, time_control_label(seconds)));
            if i == state.selected && !searching {
                item.style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                item.style(Style::default().fg(Color::White))
            }
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Time Control ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, centered_rect(30, TIME_CONTROLS.len() as u16 + 2, chunks[1]));

    let help = if searching {
        "Q Quit"
    } else {
        "↑↓ Navigate  Enter Find Game  Q Quit"
    };
    let help = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

fn render_game(frame: &mut Frame, area: Rect, state: &RenderState, game: &Game) {
    let game_view = GameView::compute(game, state.session.interaction());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(30)])
        .split(area);

    render_board(frame, columns[0], &game_view, state.cursor);
    render_side_panel(frame, columns[1], state, game, &game_view);

    if state.session.interaction().pending_promotion().is_some() {
        render_promotion(frame, area, game.color());
    } else if let Some(confirm) = state.confirm {
        render_confirm(frame, area, confirm);
    } else if let Some(outcome) = &game_view.outcome {
        render_game_over(frame, area, outcome);
    }
}

fn square_style(square: &SquareView, under_cursor: bool) -> Style {
    let background = if square.check {
        CHECK
    } else if square.selected {
        SELECTED
    } else if square.target {
        TARGET
    } else if square.last_move {
        LAST_MOVE
    } else if square.light {
        LIGHT_SQUARE
    } else {
        DARK_SQUARE
    };

    let style = Style::default().bg(background).fg(Color::Black);
    if under_cursor {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

fn render_board(frame: &mut Frame, area: Rect, game_view: &GameView, cursor: (usize, usize)) {
    let ranks = view::rank_order(game_view.perspective);
    let files = view::file_order(game_view.perspective);

    let mut lines = Vec::with_capacity(10);
    for (row, squares) in game_view.squares.iter().enumerate() {
        let mut spans = vec![Span::styled(
            format!("{} ", ranks[row] + 1),
            Style::default().fg(Color::DarkGray),
        )];
        for (col, square) in squares.iter().enumerate() {
            let text = match square.piece {
                Some(piece) => format!(" {} ", piece.glyph()),
                None if square.target => " · ".to_string(),
                None => "   ".to_string(),
            };
            spans.push(Span::styled(
                text,
                square_style(square, cursor == (row, col)),
            ));
        }
        lines.push(Line::from(spans));
    }

    let file_labels: String = files
        .iter()
        .map(|&f| format!(" {} ", (b'a' + f) as char))
        .collect();
    lines.push(Line::from(Span::styled(
        format!("  {}", file_labels),
        Style::default().fg(Color::DarkGray),
    )));

    let board = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(board, area);
}

fn player_line(
    game: &Game,
    game_view: &GameView,
    side: Side,
    state: &RenderState,
) -> Line<'static> {
    let clock = game.clock();
    let seconds = clock.display_remaining(
        side,
        state.now,
        state.session.config().interpolate_clock,
    );

    let mut name_style = Style::default().fg(Color::White);
    if game.is_live() && game.side_to_move() == side {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }
    let clock_style = if seconds < 30.0 {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let captured: String = game_view
        .captured
        .by(side)
        .iter()
        .map(|&kind| gambit::Piece::new(kind, side.opposite()).glyph())
        .collect();

    let mut spans = vec![
        Span::styled(format!("{:>6} ", view::format_clock(seconds)), clock_style),
        Span::styled(game.player(side).to_string(), name_style),
        Span::raw(" "),
        Span::styled(captured, Style::default().fg(Color::Gray)),
    ];
    if let Some(label) = game_view.material_label(side) {
        spans.push(Span::styled(
            format!(" {}", label),
            Style::default().fg(Color::Green),
        ));
    }
    Line::from(spans)
}

fn render_side_panel(
    frame: &mut Frame,
    area: Rect,
    state: &RenderState,
    game: &Game,
    game_view: &GameView,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(2),
        ])
        .split(area);

    let top = game.color().opposite();
    let bottom = game.color();
    frame.render_widget(
        Paragraph::new(player_line(game, game_view, top, state)),
        chunks[0],
    );

    let visible = chunks[1].height.saturating_sub(2) as usize;
    let skip = game_view.rows.len().saturating_sub(visible);
    let items: Vec<ListItem> = game_view
        .rows
        .iter()
        .skip(skip)
        .map(|row| {
            ListItem::new(format!(
                "{:>3}. {:<8} {}",
                row.number,
                row.white.as_deref().unwrap_or(""),
                row.black.as_deref().unwrap_or("")
            ))
        })
        .collect();
    let moves = List::new(items)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(" Moves ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(moves, chunks[1]);

    frame.render_widget(
        Paragraph::new(player_line(game, game_view, bottom, state)),
        chunks[2],
    );

    let mut status = vec![Line::from(Span::styled(
        view::status_line(state.session, state.now),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(cue) = state.cue {
        status.push(Line::from(Span::styled(
            cue.to_string(),
            Style::default().fg(Color::Magenta),
        )));
    }
    frame.render_widget(Paragraph::new(status), chunks[3]);

    let help = if !state.session.status().is_connected() {
        "C Reconnect  Shift+Q Quit"
    } else if game.draw_offer().pending {
        "A Accept draw  X Decline  ←↑↓→ Move  Enter Select"
    } else {
        "←↑↓→ Move  Enter Select  Esc Cancel\nShift+R Resign  D Draw  S Resync  Shift+Q Quit"
    };
    let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[4]);
}

fn render_promotion(frame: &mut Frame, area: Rect, side: Side) {
    let dialog_area = centered_rect(36, 6, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Promote ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(dialog_area);

    let choices: Vec<Span> = PieceKind::PROMOTIONS
        .iter()
        .map(|&kind| {
            Span::styled(
                format!(" {} {} ", gambit::Piece::new(kind, side).glyph(), kind.symbol().to_ascii_uppercase()),
                Style::default().fg(Color::White),
            )
        })
        .collect();
    let choices = Paragraph::new(Line::from(choices)).alignment(Alignment::Center);
    frame.render_widget(choices, inner[0]);

    let help = Paragraph::new("Q R B N Choose  Esc Cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[1]);
}

fn render_confirm(frame: &mut Frame, area: Rect, confirm: Confirm) {
    let dialog_area = centered_rect(36, 5, area);
    frame.render_widget(Clear, dialog_area);

    let question = match confirm {
        Confirm::Resign => "Resign this game?",
        Confirm::OfferDraw => "Offer a draw?",
    };

    let dialog = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(dialog_area);

    let text = Paragraph::new(question)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    frame.render_widget(text, inner[0]);

    let help = Paragraph::new("Y Yes  N No")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[1]);
}

fn render_game_over(frame: &mut Frame, area: Rect, outcome: &view::Outcome) {
    let dialog_area = centered_rect(44, 8, area);
    frame.render_widget(Clear, dialog_area);

    let color = match outcome.headline {
        "Victory" => Color::Green,
        "Defeat" => Color::Red,
        _ => Color::Yellow,
    };

    let dialog = Block::default()
        .title(" Game Over ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(dialog_area);

    let headline = Paragraph::new(outcome.headline)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(headline, inner[0]);

    let message = Paragraph::new(outcome.message.clone())
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    frame.render_widget(message, inner[1]);

    let help = Paragraph::new("N New Game  Q Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[3]);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
