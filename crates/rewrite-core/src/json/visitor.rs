//! JSON visitor
//!
//! [`JsonVisitor::visit`] drives each node through the same sequence:
//!
//! 1. push the node onto the cursor
//! 2. [`JsonVisitor::pre_visit`], which may replace the node or stop descent
//! 3. the kind handler (`visit_object`, `visit_member`, ...), which visits
//!    prefix, markers and children in source order and rebuilds the node
//!    with [`produce`]
//! 4. [`JsonVisitor::post_visit`]
//!
//! Each default handler is a thin call to a public `walk_*` function, so an
//! override can run the default traversal and adjust its result.
//! Returning `Ok(None)` from any step removes the node from its parent.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cursor::Cursor;
use crate::result::Result;
use crate::tree::{Markers, RightPadded, Space};
use crate::visitor::{ListDraft, PreVisit, produce, required};

use super::tree::{Document, Empty, Identifier, Json, JsonArray, JsonObject, Literal, Member};

#[async_trait]
pub trait JsonVisitor<P: Send>: Send {
    async fn visit(&mut self, tree: &Json, p: &mut P, parent: &Cursor) -> Result<Option<Json>> {
        walk(self, tree, p, parent).await
    }

    /// Runs before kind dispatch; `cursor` already holds `tree`
    async fn pre_visit(
        &mut self,
        tree: &Json,
        _p: &mut P,
        _cursor: &Cursor,
    ) -> Result<PreVisit<Json>> {
        Ok(PreVisit::Descend(tree.clone()))
    }

    async fn post_visit(&mut self, tree: Json, _p: &mut P, _cursor: &Cursor) -> Result<Option<Json>> {
        Ok(Some(tree))
    }

    async fn visit_document(
        &mut self,
        document: &Arc<Document>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        walk_document(self, document, p, cursor).await
    }

    async fn visit_object(
        &mut self,
        object: &Arc<JsonObject>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        walk_object(self, object, p, cursor).await
    }

    async fn visit_member(
        &mut self,
        member: &Arc<Member>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        walk_member(self, member, p, cursor).await
    }

    async fn visit_array(
        &mut self,
        array: &Arc<JsonArray>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        walk_array(self, array, p, cursor).await
    }

    async fn visit_literal(
        &mut self,
        literal: &Arc<Literal>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        walk_literal(self, literal, p, cursor).await
    }

    async fn visit_identifier(
        &mut self,
        identifier: &Arc<Identifier>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        walk_identifier(self, identifier, p, cursor).await
    }

    async fn visit_empty(
        &mut self,
        empty: &Arc<Empty>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<Json>> {
        walk_empty(self, empty, p, cursor).await
    }

    async fn visit_right_padded(
        &mut self,
        padded: &RightPadded<Json>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<RightPadded<Json>>> {
        walk_right_padded(self, padded, p, cursor).await
    }

    async fn visit_space(&mut self, space: &Space, _p: &mut P, _cursor: &Cursor) -> Result<Space> {
        Ok(space.clone())
    }

    async fn visit_markers(
        &mut self,
        markers: &Markers,
        _p: &mut P,
        _cursor: &Cursor,
    ) -> Result<Markers> {
        Ok(markers.clone())
    }
}

/// Default body of [`JsonVisitor::visit`]
pub async fn walk<V, P>(v: &mut V, tree: &Json, p: &mut P, parent: &Cursor) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let cursor = parent.push(tree.clone());
    let tree = match v.pre_visit(tree, p, &cursor).await? {
        PreVisit::Descend(tree) => tree,
        PreVisit::Stop(result) => return Ok(result),
    };

    let visited = match &tree {
        Json::Document(node) => v.visit_document(node, p, &cursor).await?,
        Json::Object(node) => v.visit_object(node, p, &cursor).await?,
        Json::Member(node) => v.visit_member(node, p, &cursor).await?,
        Json::Array(node) => v.visit_array(node, p, &cursor).await?,
        Json::Literal(node) => v.visit_literal(node, p, &cursor).await?,
        Json::Identifier(node) => v.visit_identifier(node, p, &cursor).await?,
        Json::Empty(node) => v.visit_empty(node, p, &cursor).await?,
    };

    match visited {
        Some(tree) => v.post_visit(tree, p, &cursor).await,
        None => Ok(None),
    }
}

pub async fn walk_document<V, P>(
    v: &mut V,
    document: &Arc<Document>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&document.prefix, p, cursor).await?;
    let markers = v.visit_markers(&document.markers, p, cursor).await?;
    let value = required("Document", "value", v.visit(&document.value, p, cursor).await?)?;
    let eof = v.visit_space(&document.eof, p, cursor).await?;

    Ok(Some(Json::Document(produce(document, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.value = value;
        draft.eof = eof;
    }))))
}

pub async fn walk_object<V, P>(
    v: &mut V,
    object: &Arc<JsonObject>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&object.prefix, p, cursor).await?;
    let markers = v.visit_markers(&object.markers, p, cursor).await?;
    let members = walk_elements(v, &object.members, p, cursor).await?;

    Ok(Some(Json::Object(produce(object, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        if let Some(members) = members {
            draft.members = members;
        }
    }))))
}

pub async fn walk_member<V, P>(
    v: &mut V,
    member: &Arc<Member>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&member.prefix, p, cursor).await?;
    let markers = v.visit_markers(&member.markers, p, cursor).await?;
    let key = required(
        "Member",
        "key",
        v.visit_right_padded(&member.key, p, cursor).await?,
    )?;
    let value = required("Member", "value", v.visit(&member.value, p, cursor).await?)?;

    Ok(Some(Json::Member(produce(member, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.key = key;
        draft.value = value;
    }))))
}

pub async fn walk_array<V, P>(
    v: &mut V,
    array: &Arc<JsonArray>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&array.prefix, p, cursor).await?;
    let markers = v.visit_markers(&array.markers, p, cursor).await?;
    let values = walk_elements(v, &array.values, p, cursor).await?;

    Ok(Some(Json::Array(produce(array, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        if let Some(values) = values {
            draft.values = values;
        }
    }))))
}

pub async fn walk_literal<V, P>(
    v: &mut V,
    literal: &Arc<Literal>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&literal.prefix, p, cursor).await?;
    let markers = v.visit_markers(&literal.markers, p, cursor).await?;
    Ok(Some(Json::Literal(produce(literal, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
    }))))
}

pub async fn walk_identifier<V, P>(
    v: &mut V,
    identifier: &Arc<Identifier>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&identifier.prefix, p, cursor).await?;
    let markers = v.visit_markers(&identifier.markers, p, cursor).await?;
    Ok(Some(Json::Identifier(produce(identifier, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
    }))))
}

pub async fn walk_empty<V, P>(
    v: &mut V,
    empty: &Arc<Empty>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Json>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&empty.prefix, p, cursor).await?;
    let markers = v.visit_markers(&empty.markers, p, cursor).await?;
    Ok(Some(Json::Empty(produce(empty, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
    }))))
}

pub async fn walk_right_padded<V, P>(
    v: &mut V,
    padded: &RightPadded<Json>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<RightPadded<Json>>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let Some(element) = v.visit(&padded.element, p, cursor).await? else {
        return Ok(None);
    };
    let after = v.visit_space(&padded.after, p, cursor).await?;
    let markers = v.visit_markers(&padded.markers, p, cursor).await?;
    Ok(Some(padded.with_parts(element, after, markers)))
}

/// Visit object members or array values; `None` when the list is unchanged
///
/// A list emptied by removals gets an [`Empty`] placeholder back, so the
/// printed brackets stay `{}` / `[]`.
async fn walk_elements<V, P>(
    v: &mut V,
    elements: &[RightPadded<Json>],
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<Vec<RightPadded<Json>>>>
where
    V: JsonVisitor<P> + ?Sized,
    P: Send,
{
    let mut draft = ListDraft::new(elements);
    for (i, padded) in elements.iter().enumerate() {
        draft.push(i, v.visit_right_padded(padded, p, cursor).await?);
    }

    Ok(draft.finish().map(|mut after| {
        if after.is_empty() {
            after.push(RightPadded::build(Json::Empty(Arc::new(Empty::new(
                Space::EMPTY,
            )))));
        }
        after
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{JsonParser, print};
    use crate::tree::Tree;

    fn parse(text: &str) -> Json {
        Json::Document(JsonParser.parse_document("test.json", text).unwrap())
    }

    struct Noop;

    impl JsonVisitor<()> for Noop {}

    #[tokio::test]
    async fn test_noop_visit_returns_same_tree() {
        let tree = parse(r#"{"a": [1, 2, {"b": null}], "c": "d"}"#);
        let after = Noop
            .visit(&tree, &mut (), &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert!(tree.is_same(&after));
    }

    /// Rewrites every literal equal to `from`
    struct ReplaceLiteral {
        from: serde_json::Value,
        to: serde_json::Value,
    }

    #[async_trait]
    impl JsonVisitor<usize> for ReplaceLiteral {
        async fn visit_literal(
            &mut self,
            literal: &Arc<Literal>,
            count: &mut usize,
            _cursor: &Cursor,
        ) -> Result<Option<Json>> {
            if literal.value != self.from {
                return Ok(Some(Json::Literal(literal.clone())));
            }
            *count += 1;
            let mut replaced = Literal::from_value(literal.prefix.clone(), self.to.clone());
            replaced.id = literal.id;
            Ok(Some(Json::Literal(Arc::new(replaced))))
        }
    }

    #[tokio::test]
    async fn test_change_rebuilds_only_the_path_to_root() {
        let tree = parse(r#"{"a": {"x": 1}, "b": {"y": 2}}"#);
        let mut visitor = ReplaceLiteral {
            from: serde_json::json!(2),
            to: serde_json::json!(3),
        };
        let mut count = 0;
        let after = visitor
            .visit(&tree, &mut count, &Cursor::root())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(print(&after), r#"{"a": {"x": 1}, "b": {"y": 3}}"#);
        assert!(!tree.is_same(&after));

        let before_members = &tree.as_document().unwrap().value.as_object().unwrap().members;
        let after_members = &after.as_document().unwrap().value.as_object().unwrap().members;
        assert!(before_members[0].element.is_same(&after_members[0].element));
        assert!(!before_members[1].element.is_same(&after_members[1].element));
        assert_eq!(before_members[1].element.id(), after_members[1].element.id());
    }

    /// Stops at arrays so nothing inside them is visited
    struct SkipArrays {
        inner: ReplaceLiteral,
    }

    #[async_trait]
    impl JsonVisitor<usize> for SkipArrays {
        async fn pre_visit(
            &mut self,
            tree: &Json,
            _p: &mut usize,
            _cursor: &Cursor,
        ) -> Result<PreVisit<Json>> {
            match tree {
                Json::Array(_) => Ok(PreVisit::Stop(Some(tree.clone()))),
                _ => Ok(PreVisit::Descend(tree.clone())),
            }
        }

        async fn visit_literal(
            &mut self,
            literal: &Arc<Literal>,
            count: &mut usize,
            cursor: &Cursor,
        ) -> Result<Option<Json>> {
            self.inner.visit_literal(literal, count, cursor).await
        }
    }

    #[tokio::test]
    async fn test_pre_visit_stop_skips_subtree() {
        let tree = parse(r#"{"a": 1, "b": [1, 1]}"#);
        let mut visitor = SkipArrays {
            inner: ReplaceLiteral {
                from: serde_json::json!(1),
                to: serde_json::json!(0),
            },
        };
        let mut count = 0;
        let after = visitor
            .visit(&tree, &mut count, &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(print(&after), r#"{"a": 0, "b": [1, 1]}"#);
    }

    /// Removes every array element
    struct DropValues;

    #[async_trait]
    impl JsonVisitor<()> for DropValues {
        async fn visit_right_padded(
            &mut self,
            padded: &RightPadded<Json>,
            p: &mut (),
            cursor: &Cursor,
        ) -> Result<Option<RightPadded<Json>>> {
            if cursor.value::<Json>().is_some_and(|parent| parent.as_array().is_some()) {
                return Ok(None);
            }
            walk_right_padded(self, padded, p, cursor).await
        }
    }

    #[tokio::test]
    async fn test_emptied_array_keeps_placeholder() {
        let tree = parse(r#"{"a": [1, 2]}"#);
        let after = DropValues
            .visit(&tree, &mut (), &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(print(&after), r#"{"a": []}"#);
        let array = after.as_document().unwrap().value.as_object().unwrap().members[0]
            .element
            .as_member()
            .unwrap()
            .value
            .clone();
        assert_eq!(array.as_array().unwrap().values[0].element.kind_name(), "Empty");
    }

    /// Deleting a required child is an error
    struct DropMemberValues;

    #[async_trait]
    impl JsonVisitor<()> for DropMemberValues {
        async fn visit_literal(
            &mut self,
            _literal: &Arc<Literal>,
            _p: &mut (),
            cursor: &Cursor,
        ) -> Result<Option<Json>> {
            let in_member_value = cursor
                .parent()
                .and_then(|parent| parent.value::<Json>())
                .and_then(|parent| parent.as_member())
                .is_some();
            assert!(in_member_value);
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_removing_required_child_fails() {
        let tree = parse(r#"{"a": [], "b": 1}"#);
        let err = DropMemberValues
            .visit(&tree, &mut (), &Cursor::root())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Member"));
    }
}
