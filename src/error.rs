//! Error types

use thiserror::Error;

use crate::types::StreamCategory;

pub type TimesliceResult<T> = Result<T, TimesliceError>;

/// Fatal timeslice parse failures
#[derive(Debug, Error)]
pub enum TimesliceError {
    #[error("only XVIZ update_type of \"snapshot\" is supported, got \"{0}\"")]
    UnsupportedUpdateType(String),

    #[error("only a single \"snapshot\" update is supported, message has {0} updates")]
    UnsupportedUpdateCount(usize),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Failures raised by stream decoders
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Payload does not have the shape its category requires
    #[error("malformed {category} payload{}: {message}", stream_suffix(.stream))]
    MalformedPayload {
        category: StreamCategory,
        stream: Option<String>,
        message: String,
    },

    #[error("stream {stream}: unknown primitive type \"{primitive_type}\"")]
    UnknownPrimitiveType { stream: String, primitive_type: String },

    #[error("stream {stream}: {primitive_type} primitive is not an object")]
    MalformedPrimitive { stream: String, primitive_type: String },

    #[error("time series stream {stream}: no value at index {index}")]
    MissingTimeSeriesValue { stream: String, index: usize },

    #[error("stream {stream}: {timestamps} future timestamps but {primitives} primitive sets")]
    FutureLengthMismatch {
        stream: String,
        timestamps: usize,
        primitives: usize,
    },

    #[error("stream {stream}: {message}")]
    Other { stream: String, message: String },
}

impl DecodeError {
    pub fn other(stream: impl Into<String>, message: impl Into<String>) -> Self {
        DecodeError::Other {
            stream: stream.into(),
            message: message.into(),
        }
    }
}

fn stream_suffix(stream: &Option<String>) -> String {
    match stream {
        Some(stream) => format!(" for stream {}", stream),
        None => String::new(),
    }
}

/// Configuration load and install failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parser config already installed")]
    AlreadyInstalled,
}
