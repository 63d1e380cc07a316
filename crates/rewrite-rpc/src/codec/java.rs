use std::sync::Arc;

use async_trait::async_trait;

use rewrite_core::Tree;
use rewrite_core::java::{
    Annotation, Assignment, Binary, BinaryOperator, CompilationUnit, Empty, FieldAccess,
    Identifier, J, JavaType, Literal, MethodInvocation, Parentheses, Ternary,
};

use super::{RpcCodec, RpcRef, receive_header, same_kind, send_header};
use crate::error::{Result, RpcError};
use crate::receive::ReceiveQueue;
use crate::send::SendQueue;

const VALUE_TYPES: [&str; 11] = [
    "J.CompilationUnit",
    "J.Identifier",
    "J.Literal",
    "J.FieldAccess",
    "J.MethodInvocation",
    "J.Ternary",
    "J.Binary",
    "J.Assignment",
    "J.Annotation",
    "J.Parentheses",
    "J.Empty",
];

impl RpcRef for JavaType {
    fn value_type(&self) -> &'static str {
        "JavaType"
    }
}

#[async_trait]
impl RpcCodec for BinaryOperator {
    fn value_type(&self) -> &'static str {
        "J.Binary.Operator"
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        q.send_value(Some(self), before)
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        if value_type != "J.Binary.Operator" {
            return Err(RpcError::unknown_value_type(value_type));
        }
        q.receive_value_required(before, "operator").await
    }
}

#[async_trait]
impl RpcCodec for J {
    fn value_type(&self) -> &'static str {
        match self {
            J::CompilationUnit(_) => "J.CompilationUnit",
            J::Identifier(_) => "J.Identifier",
            J::Literal(_) => "J.Literal",
            J::FieldAccess(_) => "J.FieldAccess",
            J::MethodInvocation(_) => "J.MethodInvocation",
            J::Ternary(_) => "J.Ternary",
            J::Binary(_) => "J.Binary",
            J::Assignment(_) => "J.Assignment",
            J::Annotation(_) => "J.Annotation",
            J::Parentheses(_) => "J.Parentheses",
            J::Empty(_) => "J.Empty",
        }
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        send_header(self, before, q)?;
        match self {
            J::CompilationUnit(node) => {
                let before = same_kind!(before, J::CompilationUnit);
                q.get_and_send_value(node, before, |n| &n.source_path)?;
                q.send_list(
                    Some(node.statements.as_slice()),
                    before.map(|b| b.statements.as_slice()),
                    |p| p.element.id(),
                )?;
                q.get_and_send(node, before, |n| &n.eof)
            }
            J::Identifier(node) => {
                let before = same_kind!(before, J::Identifier);
                q.get_and_send_value(node, before, |n| &n.simple_name)?;
                q.send_ref(node.ty.as_ref(), before.and_then(|b| b.ty.as_ref()))
            }
            J::Literal(node) => {
                let before = same_kind!(before, J::Literal);
                q.get_and_send_value(node, before, |n| &n.value_source)?;
                q.get_and_send_value(node, before, |n| &n.value)?;
                q.send_ref(node.ty.as_ref(), before.and_then(|b| b.ty.as_ref()))
            }
            J::FieldAccess(node) => {
                let before = same_kind!(before, J::FieldAccess);
                q.get_and_send(node, before, |n| &n.target)?;
                q.get_and_send(node, before, |n| &n.name)
            }
            J::MethodInvocation(node) => {
                let before = same_kind!(before, J::MethodInvocation);
                q.send(node.select.as_ref(), before.and_then(|b| b.select.as_ref()))?;
                q.get_and_send(node, before, |n| &n.name)?;
                q.get_and_send(node, before, |n| &n.arguments)
            }
            J::Ternary(node) => {
                let before = same_kind!(before, J::Ternary);
                q.get_and_send(node, before, |n| &n.condition)?;
                q.get_and_send(node, before, |n| &n.true_part)?;
                q.get_and_send(node, before, |n| &n.false_part)
            }
            J::Binary(node) => {
                let before = same_kind!(before, J::Binary);
                q.get_and_send(node, before, |n| &n.left)?;
                q.get_and_send(node, before, |n| &n.operator)?;
                q.get_and_send(node, before, |n| &n.right)
            }
            J::Assignment(node) => {
                let before = same_kind!(before, J::Assignment);
                q.get_and_send(node, before, |n| &n.variable)?;
                q.get_and_send(node, before, |n| &n.assignment)
            }
            J::Annotation(node) => {
                let before = same_kind!(before, J::Annotation);
                q.get_and_send(node, before, |n| &n.annotation_type)?;
                q.send(
                    node.arguments.as_ref(),
                    before.and_then(|b| b.arguments.as_ref()),
                )
            }
            J::Parentheses(node) => {
                let before = same_kind!(before, J::Parentheses);
                q.get_and_send(node, before, |n| &n.tree)
            }
            J::Empty(_) => Ok(()),
        }
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        if !VALUE_TYPES.contains(&value_type) {
            return Err(RpcError::unknown_value_type(value_type));
        }
        let (id, prefix, markers) = receive_header(before, q).await?;

        let tree = match value_type {
            "J.CompilationUnit" => {
                let before = same_kind!(before, J::CompilationUnit);
                let source_path = q
                    .receive_value_required(before.map(|b| &b.source_path), "source_path")
                    .await?;
                let statements = q
                    .receive_list(before.map(|b| b.statements.as_slice()))
                    .await?
                    .unwrap_or_default();
                let eof = q.receive_required(before.map(|b| &b.eof), "eof").await?;
                J::CompilationUnit(Arc::new(CompilationUnit {
                    id,
                    prefix,
                    markers,
                    source_path,
                    statements,
                    eof,
                }))
            }
            "J.Identifier" => {
                let before = same_kind!(before, J::Identifier);
                J::Identifier(Arc::new(Identifier {
                    id,
                    prefix,
                    markers,
                    simple_name: q
                        .receive_value_required(before.map(|b| &b.simple_name), "simple_name")
                        .await?,
                    ty: q
                        .receive_ref(before.and_then(|b| b.ty.as_ref()))
                        .await?,
                }))
            }
            "J.Literal" => {
                let before = same_kind!(before, J::Literal);
                J::Literal(Arc::new(Literal {
                    id,
                    prefix,
                    markers,
                    value_source: q
                        .receive_value_required(before.map(|b| &b.value_source), "value_source")
                        .await?,
                    value: q
                        .receive_value(before.map(|b| &b.value))
                        .await?
                        .unwrap_or_default(),
                    ty: q
                        .receive_ref(before.and_then(|b| b.ty.as_ref()))
                        .await?,
                }))
            }
            "J.FieldAccess" => {
                let before = same_kind!(before, J::FieldAccess);
                J::FieldAccess(Arc::new(FieldAccess {
                    id,
                    prefix,
                    markers,
                    target: q
                        .receive_required(before.map(|b| &b.target), "target")
                        .await?,
                    name: q
                        .receive_required(before.map(|b| &b.name), "name")
                        .await?,
                }))
            }
            "J.MethodInvocation" => {
                let before = same_kind!(before, J::MethodInvocation);
                J::MethodInvocation(Arc::new(MethodInvocation {
                    id,
                    prefix,
                    markers,
                    select: q
                        .receive(before.and_then(|b| b.select.as_ref()))
                        .await?,
                    name: q
                        .receive_required(before.map(|b| &b.name), "name")
                        .await?,
                    arguments: q
                        .receive_required(before.map(|b| &b.arguments), "arguments")
                        .await?,
                }))
            }
            "J.Ternary" => {
                let before = same_kind!(before, J::Ternary);
                J::Ternary(Arc::new(Ternary {
                    id,
                    prefix,
                    markers,
                    condition: q
                        .receive_required(before.map(|b| &b.condition), "condition")
                        .await?,
                    true_part: q
                        .receive_required(before.map(|b| &b.true_part), "true_part")
                        .await?,
                    false_part: q
                        .receive_required(before.map(|b| &b.false_part), "false_part")
                        .await?,
                }))
            }
            "J.Binary" => {
                let before = same_kind!(before, J::Binary);
                J::Binary(Arc::new(Binary {
                    id,
                    prefix,
                    markers,
                    left: q
                        .receive_required(before.map(|b| &b.left), "left")
                        .await?,
                    operator: q
                        .receive_required(before.map(|b| &b.operator), "operator")
                        .await?,
                    right: q
                        .receive_required(before.map(|b| &b.right), "right")
                        .await?,
                }))
            }
            "J.Assignment" => {
                let before = same_kind!(before, J::Assignment);
                J::Assignment(Arc::new(Assignment {
                    id,
                    prefix,
                    markers,
                    variable: q
                        .receive_required(before.map(|b| &b.variable), "variable")
                        .await?,
                    assignment: q
                        .receive_required(before.map(|b| &b.assignment), "assignment")
                        .await?,
                }))
            }
            "J.Annotation" => {
                let before = same_kind!(before, J::Annotation);
                J::Annotation(Arc::new(Annotation {
                    id,
                    prefix,
                    markers,
                    annotation_type: q
                        .receive_required(before.map(|b| &b.annotation_type), "annotation_type")
                        .await?,
                    arguments: q
                        .receive(before.and_then(|b| b.arguments.as_ref()))
                        .await?,
                }))
            }
            "J.Parentheses" => {
                let before = same_kind!(before, J::Parentheses);
                J::Parentheses(Arc::new(Parentheses {
                    id,
                    prefix,
                    markers,
                    tree: q
                        .receive_required(before.map(|b| &b.tree), "tree")
                        .await?,
                }))
            }
            "J.Empty" => J::Empty(Arc::new(Empty {
                id,
                prefix,
                markers,
            })),
            other => return Err(RpcError::unknown_value_type(other)),
        };
        Ok(tree)
    }
}
