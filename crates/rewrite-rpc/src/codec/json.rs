use std::sync::Arc;

use async_trait::async_trait;

use rewrite_core::Tree;
use rewrite_core::json::{Document, Empty, Identifier, Json, JsonArray, JsonObject, Literal, Member};

use super::{RpcCodec, receive_header, same_kind, send_header};
use crate::error::{Result, RpcError};
use crate::receive::ReceiveQueue;
use crate::send::SendQueue;

const VALUE_TYPES: [&str; 7] = [
    "Json.Document",
    "Json.Object",
    "Json.Member",
    "Json.Array",
    "Json.Literal",
    "Json.Identifier",
    "Json.Empty",
];

#[async_trait]
impl RpcCodec for Json {
    fn value_type(&self) -> &'static str {
        match self {
            Json::Document(_) => "Json.Document",
            Json::Object(_) => "Json.Object",
            Json::Member(_) => "Json.Member",
            Json::Array(_) => "Json.Array",
            Json::Literal(_) => "Json.Literal",
            Json::Identifier(_) => "Json.Identifier",
            Json::Empty(_) => "Json.Empty",
        }
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        send_header(self, before, q)?;
        match self {
            Json::Document(node) => {
                let before = same_kind!(before, Json::Document);
                q.get_and_send_value(node, before, |n| &n.source_path)?;
                q.get_and_send(node, before, |n| &n.value)?;
                q.get_and_send(node, before, |n| &n.eof)
            }
            Json::Object(node) => {
                let before = same_kind!(before, Json::Object);
                q.send_list(
                    Some(node.members.as_slice()),
                    before.map(|b| b.members.as_slice()),
                    |p| p.element.id(),
                )
            }
            Json::Member(node) => {
                let before = same_kind!(before, Json::Member);
                q.get_and_send(node, before, |n| &n.key)?;
                q.get_and_send(node, before, |n| &n.value)
            }
            Json::Array(node) => {
                let before = same_kind!(before, Json::Array);
                q.send_list(
                    Some(node.values.as_slice()),
                    before.map(|b| b.values.as_slice()),
                    |p| p.element.id(),
                )
            }
            Json::Literal(node) => {
                let before = same_kind!(before, Json::Literal);
                q.get_and_send_value(node, before, |n| &n.source)?;
                q.get_and_send_value(node, before, |n| &n.value)
            }
            Json::Identifier(node) => {
                let before = same_kind!(before, Json::Identifier);
                q.get_and_send_value(node, before, |n| &n.name)
            }
            Json::Empty(_) => Ok(()),
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
            "Json.Document" => {
                let before = same_kind!(before, Json::Document);
                Json::Document(Arc::new(Document {
                    id,
                    prefix,
                    markers,
                    source_path: q
                        .receive_value_required(before.map(|b| &b.source_path), "source_path")
                        .await?,
                    value: q
                        .receive_required(before.map(|b| &b.value), "value")
                        .await?,
                    eof: q.receive_required(before.map(|b| &b.eof), "eof").await?,
                }))
            }
            "Json.Object" => {
                let before = same_kind!(before, Json::Object);
                let members = q
                    .receive_list(before.map(|b| b.members.as_slice()))
                    .await?
                    .unwrap_or_default();
                Json::Object(Arc::new(JsonObject {
                    id,
                    prefix,
                    markers,
                    members,
                }))
            }
            "Json.Member" => {
                let before = same_kind!(before, Json::Member);
                Json::Member(Arc::new(Member {
                    id,
                    prefix,
                    markers,
                    key: q.receive_required(before.map(|b| &b.key), "key").await?,
                    value: q
                        .receive_required(before.map(|b| &b.value), "value")
                        .await?,
                }))
            }
            "Json.Array" => {
                let before = same_kind!(before, Json::Array);
                let values = q
                    .receive_list(before.map(|b| b.values.as_slice()))
                    .await?
                    .unwrap_or_default();
                Json::Array(Arc::new(JsonArray {
                    id,
                    prefix,
                    markers,
                    values,
                }))
            }
            "Json.Literal" => {
                let before = same_kind!(before, Json::Literal);
                Json::Literal(Arc::new(Literal {
                    id,
                    prefix,
                    markers,
                    source: q
                        .receive_value_required(before.map(|b| &b.source), "source")
                        .await?,
                    value: q
                        .receive_value(before.map(|b| &b.value))
                        .await?
                        .unwrap_or_default(),
                }))
            }
            "Json.Identifier" => {
                let before = same_kind!(before, Json::Identifier);
                Json::Identifier(Arc::new(Identifier {
                    id,
                    prefix,
                    markers,
                    name: q
                        .receive_value_required(before.map(|b| &b.name), "name")
                        .await?,
                }))
            }
            "Json.Empty" => Json::Empty(Arc::new(Empty {
                id,
                prefix,
                markers,
            })),
            other => return Err(RpcError::unknown_value_type(other)),
        };
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use rewrite_core::json::JsonParser;
    use rewrite_core::{RightPadded, Space, produce};
    use serde_json::json;

    use super::*;
    use crate::codec::testing;
    use crate::data::State;
    use crate::refs::RpcSession;

    fn document(text: &str) -> Json {
        let parsed = JsonParser.parse_document("config.json", text).unwrap();
        Json::Document(parsed)
    }

    #[tokio::test]
    async fn test_initial_transfer_reproduces_text() {
        let text = "{\n  // retries\n  \"retries\": 3,\n  \"hosts\": [\"a\", \"b\",],\n}\n";
        let tree = document(text);

        let mut sender = RpcSession::new();
        let mut receiver = RpcSession::new();
        let records = testing::send(&mut sender, Some(&tree), None);
        assert_eq!(records[0].state, State::Add);
        assert_eq!(records[0].value_type.as_deref(), Some("Json.Document"));

        let received = testing::receive(&mut receiver, records, None).await.unwrap();
        assert_eq!(rewrite_core::json::print(&received), text);
        assert_eq!(received.id(), tree.id());
    }

    #[tokio::test]
    async fn test_change_reuses_untouched_subtrees() {
        let before = document("{\"a\": 1, \"b\": [true, false]}");
        let Json::Document(doc) = &before else {
            unreachable!()
        };
        let Json::Object(object) = &doc.value else {
            unreachable!()
        };
        let Json::Member(first) = &object.members[0].element else {
            unreachable!()
        };
        let changed_member = Json::Member(produce(first, |m| {
            m.value = Json::Literal(Arc::new(Literal::from_value(Space::whitespace(" "), json!(2))));
        }));
        let changed_object = Json::Object(produce(object, |o| {
            o.members[0] = RightPadded::build(changed_member);
        }));
        let after = Json::Document(produce(doc, |d| d.value = changed_object));

        let mut sender = RpcSession::new();
        let mut receiver = RpcSession::new();
        let records = testing::send(&mut sender, Some(&after), Some(&before));
        let received = testing::receive(&mut receiver, records, Some(&before))
            .await
            .unwrap();

        assert_eq!(rewrite_core::json::print(&received), "{\"a\": 2, \"b\": [true, false]}");

        let untouched_before = &object.members[1].element;
        let Json::Document(received_doc) = &received else {
            unreachable!()
        };
        let Json::Object(received_object) = &received_doc.value else {
            unreachable!()
        };
        assert!(received_object.members[1].element.is_same(untouched_before));
    }

    #[tokio::test]
    async fn test_unknown_json_kind_fails_before_header() {
        let tree = document("1");
        let mut sender = RpcSession::new();
        let mut records = testing::send(&mut sender, Some(&tree), None);
        records[0].value_type = Some("Json.Comment".to_string());

        let mut receiver = RpcSession::new();
        let mut batches = std::collections::VecDeque::from([records]);
        let mut q = ReceiveQueue::new(&mut batches, &mut receiver.received);
        let err = q.receive_object::<Json>(None).await.unwrap_err();
        assert!(matches!(err, RpcError::UnknownValueType { .. }));
    }
}
