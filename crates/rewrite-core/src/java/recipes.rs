//! Built-in `J` recipes

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::cursor::Cursor;
use crate::recipe::{ExecutionContext, Recipe};
use crate::result::Result;
use crate::source::{JavaEditor, SourceVisitor};
use crate::tree::Marker;
use crate::visitor::produce;

use super::tree::{J, Ternary};
use super::visitor::{JavaVisitor, walk_ternary};

/// `a ? a.b : undefined` becomes `a?.b`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TernaryToOptionalChain {}

impl TernaryToOptionalChain {
    pub const NAME: &'static str = "java.TernaryToOptionalChain";
}

impl Recipe for TernaryToOptionalChain {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Use optional chaining"
    }

    fn description(&self) -> &str {
        "Replace guarded field access ternaries with the optional chaining operator."
    }

    fn editor(&self) -> Box<dyn SourceVisitor<ExecutionContext>> {
        Box::new(JavaEditor(OptionalChainVisitor))
    }
}

struct OptionalChainVisitor;

fn is_undefined(tree: &J) -> bool {
    match tree {
        J::Identifier(identifier) => identifier.simple_name == "undefined",
        J::Literal(literal) => matches!(literal.value_source.as_str(), "undefined" | "null"),
        _ => false,
    }
}

#[async_trait]
impl JavaVisitor<ExecutionContext> for OptionalChainVisitor {
    async fn visit_ternary(
        &mut self,
        ternary: &Arc<Ternary>,
        ctx: &mut ExecutionContext,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        let Some(visited) = walk_ternary(self, ternary, ctx, cursor).await? else {
            return Ok(None);
        };
        let J::Ternary(ternary) = &visited else {
            return Ok(Some(visited));
        };
        let J::FieldAccess(access) = &ternary.true_part.element else {
            return Ok(Some(visited));
        };
        if !is_undefined(&ternary.false_part.element)
            || !access.target.is_same_reference(&ternary.condition)
        {
            return Ok(Some(visited));
        }

        tracing::debug!(field = ?access.simple_name(), "replacing ternary with optional chain");
        let prefix = ternary.prefix.clone();
        Ok(Some(J::FieldAccess(produce(access, |draft| {
            draft.prefix = prefix;
            draft.markers = draft.markers.add_if_absent(Arc::new(Marker::optional()));
        }))))
    }
}
