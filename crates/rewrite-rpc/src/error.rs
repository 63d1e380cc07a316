//! Error types for the differential sync protocol and its transport

use rewrite_core::RewriteError;
use thiserror::Error;

use crate::data::State;

#[derive(Debug, Error)]
pub enum RpcError {
    /// A record named a value type no codec handles
    #[error("Unknown value type '{value_type}'")]
    UnknownValueType { value_type: String },

    /// The record stream does not have the shape the receiver expects;
    /// the session cannot continue after this
    #[error("Protocol desync: expected {expected}, found {found}")]
    ProtocolDesync { expected: String, found: String },

    /// A ref-only record pointed at a ref this session never received
    #[error("Unknown reference {reference}")]
    UnknownRef { reference: u32 },

    /// A record lacked a part it must carry, or a required field was deleted
    #[error("Missing {what}")]
    MissingValue { what: String },

    #[error("Object '{id}' not found")]
    ObjectNotFound { id: String },

    #[error("Method '{method}' not found")]
    MethodNotFound { method: String },

    #[error("Invalid params for '{method}': {message}")]
    InvalidParams { method: String, message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The peer answered a request with a JSON-RPC error
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] RewriteError),
}

impl RpcError {
    pub fn desync(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ProtocolDesync {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Desync where `found` is the state of the offending record
    pub fn unexpected_state(expected: impl Into<String>, found: State) -> Self {
        Self::desync(expected, found.as_str())
    }

    pub fn unknown_value_type(value_type: impl Into<String>) -> Self {
        Self::UnknownValueType {
            value_type: value_type.into(),
        }
    }

    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingValue { what: what.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Errors after which the record streams of this session are no longer aligned
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RpcError::UnknownValueType { .. }
                | RpcError::ProtocolDesync { .. }
                | RpcError::UnknownRef { .. }
                | RpcError::MissingValue { .. }
                | RpcError::Transport { .. }
                | RpcError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
