//! Built-in JSON recipes
//!
//! Both recipes address members by a dotted key path such as `$.a.b` or
//! `a.*.c`. Array elements do not contribute a segment, so `$.items.id`
//! matches the `id` member of every object inside the `items` array.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::recipe::{ExecutionContext, Recipe};
use crate::result::{Result, ResultExt};
use crate::source::{JsonEditor, SourceVisitor};
use crate::tree::{Marker, MarkerKind, Tree};

use super::tree::{Json, Member};
use super::visitor::{JsonVisitor, walk_member};

/// Parsed `$.a.b` key path; `*` matches any single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    pub fn parse(path: &str) -> Self {
        let path = path.strip_prefix('$').unwrap_or(path);
        let path = path.strip_prefix('.').unwrap_or(path);
        Self {
            segments: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn matches(&self, keys: &[&str]) -> bool {
        self.segments.len() == keys.len()
            && self
                .segments
                .iter()
                .zip(keys)
                .all(|(segment, key)| segment == "*" || segment == key)
    }
}

/// Keys of the enclosing members, outermost first
fn member_keys(cursor: &Cursor) -> Vec<&str> {
    let mut keys: Vec<&str> = cursor
        .path_of::<Json>()
        .filter_map(|tree| tree.as_member().and_then(|member| member.key_name()))
        .collect();
    keys.reverse();
    keys
}

fn source_path(cursor: &Cursor) -> &str {
    cursor
        .path_of::<Json>()
        .find_map(|tree| tree.as_document())
        .map(|document| document.source_path.as_str())
        .unwrap_or_default()
}

/// Removes every member at `keyPath`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteKey {
    pub key_path: String,
}

impl DeleteKey {
    pub const NAME: &'static str = "json.DeleteKey";
}

impl Recipe for DeleteKey {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Delete key"
    }

    fn description(&self) -> &str {
        "Delete a JSON object member by key path."
    }

    fn editor(&self) -> Box<dyn SourceVisitor<ExecutionContext>> {
        Box::new(JsonEditor(DeleteKeyVisitor {
            path: KeyPath::parse(&self.key_path),
        }))
    }
}

struct DeleteKeyVisitor {
    path: KeyPath,
}

#[async_trait]
impl JsonVisitor<ExecutionContext> for DeleteKeyVisitor {
    async fn visit_member(
        &mut self,
        member: &Arc<Member>,
        ctx: &mut ExecutionContext,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        if self.path.matches(&member_keys(cursor)) {
            tracing::debug!(
                source_path = source_path(cursor),
                key = ?member.key_name(),
                "deleting member"
            );
            return Ok(None);
        }
        walk_member(self, member, ctx, cursor).await
    }
}

/// Marks every member at `keyPath` with one shared search result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindKey {
    pub key_path: String,
}

impl FindKey {
    pub const NAME: &'static str = "json.FindKey";
    pub const DATA_TABLE: &'static str = "json.FindKey.matches";
}

/// Row of [`FindKey::DATA_TABLE`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMatch {
    pub source_path: String,
    pub key: String,
}

impl Recipe for FindKey {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Find key"
    }

    fn description(&self) -> &str {
        "Mark JSON object members matching a key path."
    }

    fn editor(&self) -> Box<dyn SourceVisitor<ExecutionContext>> {
        Box::new(JsonEditor(FindKeyVisitor {
            path: KeyPath::parse(&self.key_path),
            marker: Arc::new(Marker::search_result(None)),
        }))
    }
}

struct FindKeyVisitor {
    path: KeyPath,
    marker: Arc<Marker>,
}

#[async_trait]
impl JsonVisitor<ExecutionContext> for FindKeyVisitor {
    async fn visit_member(
        &mut self,
        member: &Arc<Member>,
        ctx: &mut ExecutionContext,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        let keys = member_keys(cursor);
        let found = self.path.matches(&keys);
        let key = keys.join(".");
        let source_path = source_path(cursor).to_string();

        let Some(visited) = walk_member(self, member, ctx, cursor).await? else {
            return Ok(None);
        };
        if !found || visited.markers().has(MarkerKind::SearchResult) {
            return Ok(Some(visited));
        }

        ctx.insert_row(FindKey::DATA_TABLE, &KeyMatch { source_path, key })
            .log_and_continue();
        let markers = visited.markers().search_result(&self.marker);
        Ok(Some(visited.with_markers(markers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_path_parse() {
        assert!(KeyPath::parse("$.a.b").matches(&["a", "b"]));
        assert!(KeyPath::parse("a.b").matches(&["a", "b"]));
        assert!(KeyPath::parse("$.*.b").matches(&["x", "b"]));
        assert!(!KeyPath::parse("$.a").matches(&["a", "b"]));
        assert!(!KeyPath::parse("$.a.c").matches(&["a", "b"]));
    }
}
