use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rules::{MoveSpec, Side};

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8080";

/// Time-control presets offered before matchmaking, in seconds.
pub const TIME_CONTROLS: [u32; 5] = [60, 180, 300, 600, 900];

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unparseable message: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("unknown message type {0:?}")]
    UnknownType(String),
    #[error("malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding {kind} failed: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Messages the client sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    SetUsername { username: String },
    TimeControl { seconds: u32 },
    InitGame,
    Move(MoveSpec),
    Resign,
    DrawOffer,
    DrawResponse { accepted: bool },
    SyncRequest { game_id: Option<String> },
    Resume { game_id: String, ply: usize },
}

/// Messages the server pushes.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Waiting,
    InitGame(GameAssignment),
    Move(MoveSpec),
    TimeUpdate(ClockUpdate),
    GameOver(GameResult),
    DrawOffer,
    DrawDeclined,
    DrawAccepted,
    OpponentDisconnected,
    Error { message: String },
    Sync(SyncState),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAssignment {
    pub color: Side,
    pub white_player: String,
    pub black_player: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_control: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

/// Remaining time per side, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockUpdate {
    pub white_time: f64,
    pub black_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    pub fn side(self) -> Option<Side> {
        match self {
            Winner::White => Some(Side::White),
            Winner::Black => Some(Side::Black),
            Winner::Draw => None,
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Winner::White,
            Side::Black => Winner::Black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EndReason {
    Checkmate,
    Resignation,
    Timeout,
    Agreement,
    /// The opponent left the game.
    Forfeit,
    Other(String),
}

impl From<String> for EndReason {
    fn from(reason: String) -> Self {
        match reason.as_str() {
            "checkmate" => EndReason::Checkmate,
            "resignation" => EndReason::Resignation,
            "timeout" => EndReason::Timeout,
            "agreement" => EndReason::Agreement,
            "forfeit" => EndReason::Forfeit,
            _ => EndReason::Other(reason),
        }
    }
}

impl From<EndReason> for String {
    fn from(reason: EndReason) -> Self {
        match reason {
            EndReason::Checkmate => "checkmate".to_string(),
            EndReason::Resignation => "resignation".to_string(),
            EndReason::Timeout => "timeout".to_string(),
            EndReason::Agreement => "agreement".to_string(),
            EndReason::Forfeit => "forfeit".to_string(),
            EndReason::Other(other) => other,
        }
    }
}

/// Terminal outcome of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Winner,
    pub reason: EndReason,
}

/// Full authoritative move list, sent in answer to a resync or resume.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default)]
    pub moves: Vec<MoveSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_time: Option<f64>,
}

#[derive(Serialize, Deserialize)]
struct UsernamePayload {
    username: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeControlPayload {
    time_control: u32,
}

#[derive(Serialize, Deserialize)]
struct MovePayload {
    #[serde(rename = "move")]
    mv: MoveSpec,
}

#[derive(Serialize, Deserialize)]
struct DrawResponsePayload {
    accepted: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequestPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    game_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResumePayload {
    game_id: String,
    ply: usize,
}

#[derive(Serialize, Deserialize)]
struct ErrorPayload {
    message: String,
}

fn empty() -> Value {
    Value::Object(Map::new())
}

fn to_payload<T: Serialize>(kind: &'static str, value: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(value).map_err(|source| ProtocolError::Encode { kind, source })
}

fn from_payload<T: DeserializeOwned>(kind: &str, payload: Value) -> Result<T, ProtocolError> {
    let payload = if payload.is_null() { empty() } else { payload };
    serde_json::from_value(payload).map_err(|source| ProtocolError::MalformedPayload {
        kind: kind.to_string(),
        source,
    })
}

fn encode_envelope(kind: &'static str, payload: Value) -> Result<String, ProtocolError> {
    let envelope = Envelope {
        kind: kind.to_string(),
        payload,
    };
    serde_json::to_string(&envelope).map_err(|source| ProtocolError::Encode { kind, source })
}

fn decode_envelope(text: &str) -> Result<Envelope, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Parse)
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::SetUsername { .. } => "set_username",
            ClientMessage::TimeControl { .. } => "time_control",
            ClientMessage::InitGame => "init_game",
            ClientMessage::Move(_) => "move",
            ClientMessage::Resign => "resign",
            ClientMessage::DrawOffer => "draw_offer",
            ClientMessage::DrawResponse { .. } => "draw_response",
            ClientMessage::SyncRequest { .. } => "sync_request",
            ClientMessage::Resume { .. } => "resume",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let kind = self.kind();
        let payload = match self {
            ClientMessage::SetUsername { username } => to_payload(
                kind,
                &UsernamePayload {
                    username: username.clone(),
                },
            )?,
            ClientMessage::TimeControl { seconds } => to_payload(
                kind,
                &TimeControlPayload {
                    time_control: *seconds,
                },
            )?,
            ClientMessage::Move(mv) => to_payload(kind, mv)?,
            ClientMessage::DrawResponse { accepted } => to_payload(
                kind,
                &DrawResponsePayload {
                    accepted: *accepted,
                },
            )?,
            ClientMessage::SyncRequest { game_id } => to_payload(
                kind,
                &SyncRequestPayload {
                    game_id: game_id.clone(),
                },
            )?,
            ClientMessage::Resume { game_id, ply } => to_payload(
                kind,
                &ResumePayload {
                    game_id: game_id.clone(),
                    ply: *ply,
                },
            )?,
            ClientMessage::InitGame | ClientMessage::Resign | ClientMessage::DrawOffer => empty(),
        };
        encode_envelope(kind, payload)
    }

    /// Parses an outbound frame; used by tests and scripted peers.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { kind, payload } = decode_envelope(text)?;
        let message = match kind.as_str() {
            "set_username" => {
                let p: UsernamePayload = from_payload(&kind, payload)?;
                ClientMessage::SetUsername {
                    username: p.username,
                }
            }
            "time_control" => {
                let p: TimeControlPayload = from_payload(&kind, payload)?;
                ClientMessage::TimeControl {
                    seconds: p.time_control,
                }
            }
            "init_game" => ClientMessage::InitGame,
            "move" => ClientMessage::Move(from_payload(&kind, payload)?),
            "resign" => ClientMessage::Resign,
            "draw_offer" => ClientMessage::DrawOffer,
            "draw_response" => {
                let p: DrawResponsePayload = from_payload(&kind, payload)?;
                ClientMessage::DrawResponse {
                    accepted: p.accepted,
                }
            }
            "sync_request" => {
                let p: SyncRequestPayload = from_payload(&kind, payload)?;
                ClientMessage::SyncRequest { game_id: p.game_id }
            }
            "resume" => {
                let p: ResumePayload = from_payload(&kind, payload)?;
                ClientMessage::Resume {
                    game_id: p.game_id,
                    ply: p.ply,
                }
            }
            _ => return Err(ProtocolError::UnknownType(kind)),
        };
        Ok(message)
    }
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Waiting => "waiting",
            ServerMessage::InitGame(_) => "init_game",
            ServerMessage::Move(_) => "move",
            ServerMessage::TimeUpdate(_) => "time_update",
            ServerMessage::GameOver(_) => "game_over",
            ServerMessage::DrawOffer => "draw_offer",
            ServerMessage::DrawDeclined => "draw_declined",
            ServerMessage::DrawAccepted => "draw_response",
            ServerMessage::OpponentDisconnected => "opponent_disconnected",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Sync(_) => "sync",
        }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { kind, payload } = decode_envelope(text)?;
        let message = match kind.as_str() {
            "waiting" => ServerMessage::Waiting,
            "init_game" => ServerMessage::InitGame(from_payload(&kind, payload)?),
            "move" => {
                let p: MovePayload = from_payload(&kind, payload)?;
                ServerMessage::Move(p.mv)
            }
            "time_update" => ServerMessage::TimeUpdate(from_payload(&kind, payload)?),
            "game_over" => ServerMessage::GameOver(from_payload(&kind, payload)?),
            "draw_offer" => ServerMessage::DrawOffer,
            "draw_declined" => ServerMessage::DrawDeclined,
            "draw_response" => {
                let p: DrawResponsePayload = from_payload(&kind, payload)?;
                if p.accepted {
                    ServerMessage::DrawAccepted
                } else {
                    ServerMessage::DrawDeclined
                }
            }
            "opponent_disconnected" => ServerMessage::OpponentDisconnected,
            "error" => {
                let p: ErrorPayload = from_payload(&kind, payload)?;
                ServerMessage::Error { message: p.message }
            }
            "sync" => ServerMessage::Sync(from_payload(&kind, payload)?),
            _ => return Err(ProtocolError::UnknownType(kind)),
        };
        Ok(message)
    }

    /// Renders a server frame; used by tests and scripted peers.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let kind = self.kind();
        let payload = match self {
            ServerMessage::InitGame(assignment) => to_payload(kind, assignment)?,
            ServerMessage::Move(mv) => to_payload(kind, &MovePayload { mv: *mv })?,
            ServerMessage::TimeUpdate(update) => to_payload(kind, update)?,
            ServerMessage::GameOver(result) => to_payload(kind, result)?,
            ServerMessage::DrawAccepted => {
                to_payload(kind, &DrawResponsePayload { accepted: true })?
            }
            ServerMessage::Error { message } => to_payload(
                kind,
                &ErrorPayload {
                    message: message.clone(),
                },
            )?,
            ServerMessage::Sync(state) => to_payload(kind, state)?,
            ServerMessage::Waiting
            | ServerMessage::DrawOffer
            | ServerMessage::DrawDeclined
            | ServerMessage::OpponentDisconnected => empty(),
        };
        encode_envelope(kind, payload)
    }
}
