//! Send-then-receive of edited trees through the record stream

use std::collections::VecDeque;
use std::sync::Arc;

use rewrite_core::java::{CompilationUnit, FieldAccess, J, Ternary};
use rewrite_core::json::{Json, JsonParser};
use rewrite_core::{
    Cursor, ExecutionContext, LeftPadded, Marker, Markers, RecipeRegistry, RightPadded,
    SourceFile, Space, Tree, produce,
};
use rewrite_rpc::{ReceiveQueue, RpcObjectData, RpcSession, SendQueue, State};
use serde_json::json;

fn send(session: &mut RpcSession, after: &SourceFile, before: Option<&SourceFile>) -> Vec<RpcObjectData> {
    let mut q = SendQueue::new(64, &mut session.sent);
    q.send_object(Some(after), before).unwrap();
    q.finish().into_iter().flatten().collect()
}

async fn receive(
    session: &mut RpcSession,
    records: Vec<RpcObjectData>,
    before: Option<&SourceFile>,
) -> SourceFile {
    let mut batches = VecDeque::from([records]);
    let mut q = ReceiveQueue::new(&mut batches, &mut session.received);
    q.receive_object(before).await.unwrap().unwrap()
}

/// Send `before` in full, then `after` as a diff; returns the receiver's
/// copy of `before`, the diff records and the receiver's copy of `after`
async fn sync(
    before: &SourceFile,
    after: &SourceFile,
) -> (SourceFile, Vec<RpcObjectData>, SourceFile) {
    let mut sender = RpcSession::new();
    let mut receiver = RpcSession::new();

    let initial = send(&mut sender, before, None);
    let received_before = receive(&mut receiver, initial, None).await;
    assert_eq!(received_before.print(), before.print());

    let diff = send(&mut sender, after, Some(before));
    let received_after = receive(&mut receiver, diff.clone(), Some(&received_before)).await;
    (received_before, diff, received_after)
}

fn changes(records: &[RpcObjectData]) -> usize {
    records
        .iter()
        .filter(|r| !matches!(r.state, State::NoChange | State::EndOfObject))
        .count()
}

async fn edit(recipe: &str, options: serde_json::Value, source: &SourceFile) -> SourceFile {
    let recipe = RecipeRegistry::with_builtins().prepare(recipe, &options).unwrap();
    let mut ctx = ExecutionContext::new();
    recipe
        .editor()
        .visit_source(source, &mut ctx, &Cursor::root())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_deleted_key_arrives_as_small_diff() {
    let members: Vec<String> = (0..100).map(|i| format!("\"k{i}\": {i}")).collect();
    let text = format!("{{\"a\": {{\"b\": 1, \"c\": 2}}, {}}}\n", members.join(", "));
    let before = JsonParser.parse("big.json", &text);
    let after = edit("json.DeleteKey", json!({"keyPath": "$.a.b"}), &before).await;

    let (_, diff, received) = sync(&before, &after).await;

    assert_eq!(received.print(), after.print());
    assert!(received.print().starts_with("{\"a\": { \"c\": 2}, \"k0\": 0"));
    assert!(
        changes(&diff) < 20,
        "{} changed records for a one-key edit",
        changes(&diff)
    );
}

#[tokio::test]
async fn test_search_marker_is_shared_on_the_receiver() {
    let before = JsonParser.parse("a.json", "[{\"id\": 1}, {\"id\": 2}]");
    let after = edit("json.FindKey", json!({"keyPath": "$.id"}), &before).await;
    let (_, diff, received) = sync(&before, &after).await;

    let payloads = diff
        .iter()
        .filter(|r| r.value_type.as_deref() == Some("SearchResult"))
        .count();
    assert_eq!(payloads, 1);

    let SourceFile::Json(document) = &received else {
        panic!("expected a JSON document");
    };
    let Json::Array(array) = &document.value else {
        panic!("expected an array");
    };
    let markers: Vec<Arc<Marker>> = array
        .values
        .iter()
        .filter_map(|value| match &value.element {
            Json::Object(object) => object.members[0].element.markers().markers.first().cloned(),
            _ => None,
        })
        .collect();
    assert_eq!(markers.len(), 2);
    assert!(Arc::ptr_eq(&markers[0], &markers[1]));
}

#[tokio::test]
async fn test_removed_first_element_keeps_positions() {
    let before = JsonParser.parse("a.json", "[\"x\", \"y\", \"z\"]");
    let SourceFile::Json(document) = &before else {
        unreachable!()
    };
    let Json::Array(array) = &document.value else {
        unreachable!()
    };
    let array = Json::Array(produce(array, |a| {
        a.values.remove(0);
    }));
    let after = SourceFile::Json(produce(document, |d| d.value = array));

    let (_, diff, received) = sync(&before, &after).await;

    let positions: Vec<&serde_json::Value> = diff
        .iter()
        .filter_map(|r| r.value.as_ref().filter(|v| v.is_array()))
        .collect();
    assert_eq!(positions, vec![&json!([1, 2])]);
    assert!(
        diff.iter()
            .all(|r| r.value_type.as_deref() != Some("RightPadded")),
        "remaining elements must not be resent"
    );
    assert_eq!(received.print(), "[ \"y\", \"z\"]");
}

#[tokio::test]
async fn test_reorder_sends_positions_only() {
    let before = JsonParser.parse("a.json", "{\"x\": 1, \"y\": 2}");
    let SourceFile::Json(document) = &before else {
        unreachable!()
    };
    let Json::Object(object) = &document.value else {
        unreachable!()
    };
    let object = Json::Object(produce(object, |o| o.members.swap(0, 1)));
    let after = SourceFile::Json(produce(document, |d| d.value = object));

    let (received_before, diff, received) = sync(&before, &after).await;

    assert!(diff.iter().any(|r| r.value == Some(json!([1, 0]))));
    assert!(
        diff.iter()
            .all(|r| r.value_type.as_deref() != Some("Json.Member")),
        "members are matched by id, not position"
    );
    assert_eq!(received.print(), after.print());

    let (SourceFile::Json(got), SourceFile::Json(had)) = (&received, &received_before) else {
        unreachable!()
    };
    let (Json::Object(got), Json::Object(had)) = (&got.value, &had.value) else {
        unreachable!()
    };
    assert!(got.members[0].element.is_same(&had.members[1].element));
}

/// `a ? a.b : undefined;`
fn guarded_access_unit() -> SourceFile {
    let ternary = J::Ternary(Arc::new(Ternary::new(
        Space::EMPTY,
        J::identifier(Space::EMPTY, "a"),
        LeftPadded::new(
            Space::whitespace(" "),
            J::FieldAccess(Arc::new(FieldAccess::new(
                Space::whitespace(" "),
                J::identifier(Space::EMPTY, "a"),
                LeftPadded::build(J::identifier(Space::EMPTY, "b")),
            ))),
        ),
        LeftPadded::new(
            Space::whitespace(" "),
            J::identifier(Space::whitespace(" "), "undefined"),
        ),
    )));
    let statement =
        RightPadded::build(ternary).with_markers(Markers::new().add(Arc::new(Marker::semicolon())));
    SourceFile::Java(Arc::new(CompilationUnit::new(
        "guard.js",
        vec![statement],
        Space::whitespace("\n"),
    )))
}

#[tokio::test]
async fn test_optional_chain_diff() {
    let before = guarded_access_unit();
    let after = edit("java.TernaryToOptionalChain", serde_json::Value::Null, &before).await;
    assert_eq!(after.print(), "a?.b;\n");

    let (_, diff, received) = sync(&before, &after).await;

    assert_eq!(received.print(), "a?.b;\n");
    let a_sent = diff.iter().filter(|r| r.value == Some(json!("a"))).count();
    assert_eq!(a_sent, 1, "only the kept `a` is sent");
    assert!(
        diff.iter()
            .all(|r| r.value != Some(json!("undefined"))),
        "the dropped branch is not sent"
    );
}

#[tokio::test]
async fn test_parse_error_file_transfers() {
    let before = JsonParser.parse("broken.json", "{\"a\": ");
    assert!(matches!(before, SourceFile::ParseError(_)));

    let mut sender = RpcSession::new();
    let mut receiver = RpcSession::new();
    let records = send(&mut sender, &before, None);
    assert_eq!(records[0].value_type.as_deref(), Some("ParseError"));

    let received = receive(&mut receiver, records, None).await;
    assert_eq!(received.print(), "{\"a\": ");
    assert_eq!(received.source_path(), "broken.json");
    assert_eq!(received.markers(), before.markers());
}

#[tokio::test]
async fn test_unchanged_file_is_one_record() {
    let before = JsonParser.parse("a.json", "{\"a\": 1}");
    let mut sender = RpcSession::new();
    let records = send(&mut sender, &before, Some(&before));
    assert_eq!(
        records,
        vec![RpcObjectData::no_change(), RpcObjectData::end_of_object()]
    );
}
