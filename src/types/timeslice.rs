//! Result of parsing one timeslice

use std::collections::BTreeMap;

use serde::Serialize;

/// Kind of a parsed log stream message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Usable frame
    Timeslice,
    /// Timestamp not resolvable yet, the caller should skip it
    Incomplete,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageType::Timeslice => "TIMESLICE",
            MessageType::Incomplete => "INCOMPLETE",
        };
        write!(f, "{}", name)
    }
}

/// Normalized snapshot of a timeslice, generic over the decoded stream type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParsedTimeslice<S> {
    Timeslice {
        timestamp: f64,
        streams: BTreeMap<String, S>,
    },
    Incomplete,
}

impl<S> ParsedTimeslice<S> {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Timeslice { .. } => MessageType::Timeslice,
            Self::Incomplete => MessageType::Incomplete,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete)
    }

    pub fn timestamp(&self) -> Option<f64> {
        match self {
            Self::Timeslice { timestamp, .. } => Some(*timestamp),
            Self::Incomplete => None,
        }
    }

    pub fn streams(&self) -> Option<&BTreeMap<String, S>> {
        match self {
            Self::Timeslice { streams, .. } => Some(streams),
            Self::Incomplete => None,
        }
    }

    pub fn stream(&self, name: &str) -> Option<&S> {
        self.streams().and_then(|streams| streams.get(name))
    }
}
