//! Event envelope received from the server-push stream
//!
//! Every frame on `/events` decodes to an [`EventEnvelope`]. The payload is
//! untrusted: only `type` and `data` are required, everything else degrades
//! to `None` when absent or of the wrong shape.

use std::collections::HashMap;
use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::DecodeError;
use crate::numeric::format_number;

/// Per-player metadata attached to an envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMeta {
    /// Empire tag, e.g. `solarian`
    pub empire: Option<String>,
    /// Short faction tag shown as a badge
    pub faction_tag: Option<String>,
}

impl PlayerMeta {
    fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_object()?;
        let field = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            empire: field("empire"),
            faction_tag: field("faction_tag"),
        })
    }
}

/// Username → metadata map carried by `player_info`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerInfo(HashMap<String, PlayerMeta>);

impl PlayerInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw JSON value, keeping only well-formed entries.
    pub fn from_value(value: &Value) -> Self {
        let entries = value
            .as_object()
            .map(|record| {
                record
                    .iter()
                    .filter_map(|(name, meta)| {
                        PlayerMeta::from_value(meta).map(|meta| (name.clone(), meta))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self(entries)
    }

    pub fn insert(&mut self, username: impl Into<String>, meta: PlayerMeta) {
        self.0.insert(username.into(), meta);
    }

    pub fn get(&self, username: &str) -> Option<&PlayerMeta> {
        self.0.get(username)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Raw record received from the push stream, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_info: Option<PlayerInfo>,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            timestamp: None,
            player_info: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_player_info(mut self, player_info: PlayerInfo) -> Self {
        self.player_info = Some(player_info);
        self
    }

    /// Decode one frame payload.
    ///
    /// Fails when the frame is not JSON, not an object, or lacks a string
    /// `type` or an object `data`.
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| DecodeError::Json(e.to_string()))?;
        let Value::Object(mut record) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let event_type = match record.remove("type") {
            Some(Value::String(tag)) if !tag.is_empty() => tag,
            _ => return Err(DecodeError::MissingField("type")),
        };
        let data = match record.remove("data") {
            Some(Value::Object(data)) => data,
            _ => return Err(DecodeError::MissingField("data")),
        };
        let timestamp = match record.remove("timestamp") {
            Some(Value::String(ts)) => Some(ts),
            _ => None,
        };
        let player_info = record
            .get("player_info")
            .map(PlayerInfo::from_value)
            .filter(|info| !info.is_empty());

        Ok(Self {
            event_type,
            data,
            timestamp,
            player_info,
        })
    }

    /// Milliseconds since the epoch at which the event occurred.
    ///
    /// Uses the envelope timestamp when it parses as RFC 3339, otherwise the
    /// supplied arrival time.
    pub fn occurred_at(&self, arrived_at_ms: i64) -> i64 {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(arrived_at_ms)
    }

    /// Metadata for a username, if the envelope carries any.
    pub fn player_meta(&self, username: &str) -> Option<&PlayerMeta> {
        self.player_info.as_ref().and_then(|info| info.get(username))
    }
}

/// A scalar payload value.
///
/// Typed event decoders read every field as `Option<Scalar>`; anything that
/// is not a string, number or bool fails decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(Number),
    Flag(bool),
}

impl Scalar {
    /// Whether this value is the boolean `true` (or the string "true").
    pub fn is_true(&self) -> bool {
        match self {
            Scalar::Flag(flag) => *flag,
            Scalar::Text(text) => text.eq_ignore_ascii_case("true"),
            Scalar::Number(_) => false,
        }
    }

    /// Whether the value renders to nothing.
    pub fn is_blank(&self) -> bool {
        matches!(self, Scalar::Text(text) if text.trim().is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Number(number) => f.write_str(&format_number(number)),
            Scalar::Flag(flag) => write!(f, "{}", flag),
        }
    }
}
