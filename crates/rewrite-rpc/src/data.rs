//! The wire record
//!
//! Every value crossing the boundary is a sequence of these:
//!
//! ```json
//! {"state": "CHANGE", "valueType": "Json.Member"}
//! {"state": "NO_CHANGE"}
//! {"state": "ADD", "valueType": "SearchResult", "value": {...}, "ref": 1}
//! {"state": "ADD", "ref": 1}
//! {"state": "END_OF_OBJECT"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    NoChange,
    Add,
    Delete,
    Change,
    EndOfObject,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::NoChange => "NO_CHANGE",
            State::Add => "ADD",
            State::Delete => "DELETE",
            State::Change => "CHANGE",
            State::EndOfObject => "END_OF_OBJECT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcObjectData {
    pub state: State,
    /// Codec tag of a composite `ADD` or `CHANGE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Inline payload of a plain value, a shared value's first send, or list positions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<u32>,
}

impl RpcObjectData {
    pub fn new(state: State) -> Self {
        Self {
            state,
            value_type: None,
            value: None,
            reference: None,
        }
    }

    pub fn no_change() -> Self {
        Self::new(State::NoChange)
    }

    pub fn delete() -> Self {
        Self::new(State::Delete)
    }

    pub fn end_of_object() -> Self {
        Self::new(State::EndOfObject)
    }

    pub fn with_value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_ref(mut self, reference: u32) -> Self {
        self.reference = Some(reference);
        self
    }
}
