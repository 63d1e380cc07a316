use std::sync::Arc;

use async_trait::async_trait;

use rewrite_core::java::J;
use rewrite_core::json::Json;
use rewrite_core::{ParseError, SourceFile};

use super::{RpcCodec, receive_header, send_header};
use crate::error::{Result, RpcError};
use crate::receive::ReceiveQueue;
use crate::send::SendQueue;

/// Source files stream as their language's root node
#[async_trait]
impl RpcCodec for SourceFile {
    fn value_type(&self) -> &'static str {
        self.source_file_type()
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        match self {
            SourceFile::Json(document) => {
                let before = match before {
                    Some(SourceFile::Json(before)) => Some(Json::Document(before.clone())),
                    _ => None,
                };
                Json::Document(document.clone()).rpc_send(before.as_ref(), q)
            }
            SourceFile::Java(unit) => {
                let before = match before {
                    Some(SourceFile::Java(before)) => Some(J::CompilationUnit(before.clone())),
                    _ => None,
                };
                J::CompilationUnit(unit.clone()).rpc_send(before.as_ref(), q)
            }
            SourceFile::ParseError(error) => {
                let before_file = before.filter(|b| matches!(b, SourceFile::ParseError(_)));
                let before = match before_file {
                    Some(SourceFile::ParseError(before)) => Some(before),
                    _ => None,
                };
                send_header(self, before_file, q)?;
                q.get_and_send_value(error, before, |e| &e.source_path)?;
                q.get_and_send_value(error, before, |e| &e.text)
            }
        }
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        match value_type {
            "Json.Document" => {
                let before = match before {
                    Some(SourceFile::Json(before)) => Some(Json::Document(before.clone())),
                    _ => None,
                };
                let tree = Json::rpc_receive(before.as_ref(), value_type, q).await?;
                Ok(SourceFile::from_json(tree)?)
            }
            "J.CompilationUnit" => {
                let before = match before {
                    Some(SourceFile::Java(before)) => Some(J::CompilationUnit(before.clone())),
                    _ => None,
                };
                let tree = J::rpc_receive(before.as_ref(), value_type, q).await?;
                Ok(SourceFile::from_java(tree)?)
            }
            "ParseError" => {
                let before_file = before.filter(|b| matches!(b, SourceFile::ParseError(_)));
                let before = match before_file {
                    Some(SourceFile::ParseError(error)) => Some(error),
                    _ => None,
                };
                let (id, prefix, markers) = receive_header(before_file, q).await?;
                let source_path = q
                    .receive_value_required(before.map(|b| &b.source_path), "source_path")
                    .await?;
                let text = q
                    .receive_value_required(before.map(|b| &b.text), "text")
                    .await?;
                Ok(SourceFile::ParseError(Arc::new(ParseError {
                    id,
                    prefix,
                    markers,
                    source_path,
                    text,
                })))
            }
            other => Err(RpcError::unknown_value_type(other)),
        }
    }
}
