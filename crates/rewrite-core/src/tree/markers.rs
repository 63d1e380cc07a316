use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Identical, Space, TreeId};

/// Out-of-band annotation attached to a node
///
/// Markers are held behind `Arc` so one instance can decorate many nodes;
/// RPC transmits such a shared instance once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum Marker {
    /// A search hit produced by a recipe
    SearchResult {
        id: TreeId,
        description: Option<String>,
    },
    /// The parser failed on this source; the node holds the raw text
    ParseExceptionResult {
        id: TreeId,
        parser_type: String,
        exception_type: String,
        message: String,
    },
    /// Byte range of the node in the source it was parsed from
    Range { id: TreeId, start: usize, end: usize },
    /// JavaScript optional chaining: the accessor prints as `?.`
    Optional { id: TreeId },
    /// A statement terminated by `;`
    Semicolon { id: TreeId },
    /// A trailing `,` after the last element of a list, followed by `suffix`
    TrailingComma { id: TreeId, suffix: Space },
}

/// Discriminant of a [`Marker`], used for lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    SearchResult,
    ParseExceptionResult,
    Range,
    Optional,
    Semicolon,
    TrailingComma,
}

impl Marker {
    pub fn search_result(description: Option<String>) -> Self {
        Marker::SearchResult {
            id: TreeId::random(),
            description,
        }
    }

    pub fn parse_exception(
        parser_type: impl Into<String>,
        exception_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Marker::ParseExceptionResult {
            id: TreeId::random(),
            parser_type: parser_type.into(),
            exception_type: exception_type.into(),
            message: message.into(),
        }
    }

    pub fn range(start: usize, end: usize) -> Self {
        Marker::Range {
            id: TreeId::random(),
            start,
            end,
        }
    }

    pub fn optional() -> Self {
        Marker::Optional {
            id: TreeId::random(),
        }
    }

    pub fn semicolon() -> Self {
        Marker::Semicolon {
            id: TreeId::random(),
        }
    }

    pub fn trailing_comma(suffix: Space) -> Self {
        Marker::TrailingComma {
            id: TreeId::random(),
            suffix,
        }
    }

    pub fn id(&self) -> TreeId {
        match self {
            Marker::SearchResult { id, .. }
            | Marker::ParseExceptionResult { id, .. }
            | Marker::Range { id, .. }
            | Marker::Optional { id }
            | Marker::Semicolon { id }
            | Marker::TrailingComma { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::SearchResult { .. } => MarkerKind::SearchResult,
            Marker::ParseExceptionResult { .. } => MarkerKind::ParseExceptionResult,
            Marker::Range { .. } => MarkerKind::Range,
            Marker::Optional { .. } => MarkerKind::Optional,
            Marker::Semicolon { .. } => MarkerKind::Semicolon,
            Marker::TrailingComma { .. } => MarkerKind::TrailingComma,
        }
    }

    /// Stable type tag, also used as the RPC value type
    pub fn type_name(&self) -> &'static str {
        match self.kind() {
            MarkerKind::SearchResult => "SearchResult",
            MarkerKind::ParseExceptionResult => "ParseExceptionResult",
            MarkerKind::Range => "Range",
            MarkerKind::Optional => "Optional",
            MarkerKind::Semicolon => "Semicolon",
            MarkerKind::TrailingComma => "TrailingComma",
        }
    }
}

/// Ordered set of markers, itself identified so it can be diffed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Markers {
    pub id: TreeId,
    pub markers: Vec<Arc<Marker>>,
}

impl Default for Markers {
    fn default() -> Self {
        Self::new()
    }
}

impl Markers {
    pub fn new() -> Self {
        Self::build(Vec::new())
    }

    pub fn build(markers: Vec<Arc<Marker>>) -> Self {
        Self {
            id: TreeId::random(),
            markers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Marker>> {
        self.markers.iter()
    }

    pub fn find_first(&self, kind: MarkerKind) -> Option<&Arc<Marker>> {
        self.markers.iter().find(|m| m.kind() == kind)
    }

    pub fn has(&self, kind: MarkerKind) -> bool {
        self.find_first(kind).is_some()
    }

    /// Copy with `marker` appended; the set keeps its id
    pub fn add(&self, marker: Arc<Marker>) -> Self {
        let mut markers = self.markers.clone();
        markers.push(marker);
        Self {
            id: self.id,
            markers,
        }
    }

    /// Copy with `marker` appended unless a marker of the same kind is already present
    pub fn add_if_absent(&self, marker: Arc<Marker>) -> Self {
        if self.has(marker.kind()) {
            self.clone()
        } else {
            self.add(marker)
        }
    }

    pub fn remove_by_kind(&self, kind: MarkerKind) -> Self {
        Self {
            id: self.id,
            markers: self
                .markers
                .iter()
                .filter(|m| m.kind() != kind)
                .cloned()
                .collect(),
        }
    }

    /// Mark as a search hit, sharing `marker` with every other hit
    pub fn search_result(&self, marker: &Arc<Marker>) -> Self {
        self.add_if_absent(Arc::clone(marker))
    }
}

impl Identical for Markers {
    fn identical(&self, other: &Self) -> bool {
        self.id == other.id && self.markers.identical(&other.markers)
    }
}
