//! JSON lossless tree
//!
//! ```text
//! Document
//! └── value: Object
//!     └── members: [RightPadded<Member>]
//!         ├── key: RightPadded<Literal | Identifier>
//!         └── value: Object | Array | Literal
//! ```
//!
//! Empty objects and arrays hold a single [`Empty`] element whose prefix is
//! the whitespace between the brackets.

use std::sync::Arc;

use crate::tree::{Markers, RightPadded, Space, TreeId};
use crate::{identical_fields, tree_enum};

tree_enum! {
    pub enum Json {
        Document(Document),
        Object(JsonObject),
        Member(Member),
        Array(JsonArray),
        Literal(Literal),
        Identifier(Identifier),
        Empty(Empty),
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub source_path: String,
    pub value: Json,
    /// Trailing whitespace and comments before end of file
    pub eof: Space,
}

#[derive(Debug, Clone)]
pub struct JsonObject {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub members: Vec<RightPadded<Json>>,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    /// `Literal` (quoted) or `Identifier` (unquoted) key; `after` is the space before `:`
    pub key: RightPadded<Json>,
    pub value: Json,
}

#[derive(Debug, Clone)]
pub struct JsonArray {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub values: Vec<RightPadded<Json>>,
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    /// Exact source text, including quotes and escapes
    pub source: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Empty {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
}

identical_fields!(Document {
    id,
    prefix,
    markers,
    source_path,
    value,
    eof
});
identical_fields!(JsonObject {
    id,
    prefix,
    markers,
    members
});
identical_fields!(Member {
    id,
    prefix,
    markers,
    key,
    value
});
identical_fields!(JsonArray {
    id,
    prefix,
    markers,
    values
});
identical_fields!(Literal {
    id,
    prefix,
    markers,
    source,
    value
});
identical_fields!(Identifier {
    id,
    prefix,
    markers,
    name
});
identical_fields!(Empty { id, prefix, markers });

impl Document {
    pub fn new(source_path: impl Into<String>, value: Json, eof: Space) -> Self {
        Self {
            id: TreeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::new(),
            source_path: source_path.into(),
            value,
            eof,
        }
    }
}

impl JsonObject {
    pub fn new(prefix: Space, members: Vec<RightPadded<Json>>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            members,
        }
    }
}

impl Member {
    pub fn new(prefix: Space, key: RightPadded<Json>, value: Json) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            key,
            value,
        }
    }

    /// Unquoted key name
    pub fn key_name(&self) -> Option<&str> {
        match &self.key.element {
            Json::Literal(literal) => literal.value.as_str(),
            Json::Identifier(identifier) => Some(&identifier.name),
            _ => None,
        }
    }
}

impl JsonArray {
    pub fn new(prefix: Space, values: Vec<RightPadded<Json>>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            values,
        }
    }
}

impl Literal {
    pub fn new(prefix: Space, source: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            source: source.into(),
            value,
        }
    }

    /// Literal whose source is the canonical JSON rendering of `value`
    pub fn from_value(prefix: Space, value: serde_json::Value) -> Self {
        let source = value.to_string();
        Self::new(prefix, source, value)
    }
}

impl Identifier {
    pub fn new(prefix: Space, name: impl Into<String>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            name: name.into(),
        }
    }
}

impl Empty {
    pub fn new(prefix: Space) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
        }
    }
}

impl Json {
    pub fn as_document(&self) -> Option<&Arc<Document>> {
        match self {
            Json::Document(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<JsonObject>> {
        match self {
            Json::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Arc<Member>> {
        match self {
            Json::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Arc<JsonArray>> {
        match self {
            Json::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Arc<Literal>> {
        match self {
            Json::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}
