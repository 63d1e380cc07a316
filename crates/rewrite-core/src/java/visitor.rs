//! `J` visitor
//!
//! Same shape as [`crate::json::JsonVisitor`]: `visit` pushes the cursor,
//! runs `pre_visit`, dispatches by kind, then runs `post_visit`. Children
//! are visited in print order. Padding wrappers are not pushed onto the
//! cursor; their hooks visit the wrapped element and rebuild the wrapper
//! only when something inside changed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cursor::Cursor;
use crate::result::Result;
use crate::tree::{Container, Identical, LeftPadded, Markers, RightPadded, Space};
use crate::visitor::{ListDraft, PreVisit, produce, required};

use super::tree::{
    Annotation, Assignment, Binary, CompilationUnit, Empty, FieldAccess, Identifier, J, Literal,
    MethodInvocation, Parentheses, Ternary,
};

#[async_trait]
pub trait JavaVisitor<P: Send>: Send {
    async fn visit(&mut self, tree: &J, p: &mut P, parent: &Cursor) -> Result<Option<J>> {
        walk(self, tree, p, parent).await
    }

    async fn pre_visit(&mut self, tree: &J, _p: &mut P, _cursor: &Cursor) -> Result<PreVisit<J>> {
        Ok(PreVisit::Descend(tree.clone()))
    }

    async fn post_visit(&mut self, tree: J, _p: &mut P, _cursor: &Cursor) -> Result<Option<J>> {
        Ok(Some(tree))
    }

    async fn visit_compilation_unit(
        &mut self,
        unit: &Arc<CompilationUnit>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_compilation_unit(self, unit, p, cursor).await
    }

    async fn visit_identifier(
        &mut self,
        identifier: &Arc<Identifier>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_identifier(self, identifier, p, cursor).await
    }

    async fn visit_literal(
        &mut self,
        literal: &Arc<Literal>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_literal(self, literal, p, cursor).await
    }

    async fn visit_field_access(
        &mut self,
        field_access: &Arc<FieldAccess>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_field_access(self, field_access, p, cursor).await
    }

    async fn visit_method_invocation(
        &mut self,
        invocation: &Arc<MethodInvocation>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_method_invocation(self, invocation, p, cursor).await
    }

    async fn visit_ternary(
        &mut self,
        ternary: &Arc<Ternary>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_ternary(self, ternary, p, cursor).await
    }

    async fn visit_binary(
        &mut self,
        binary: &Arc<Binary>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_binary(self, binary, p, cursor).await
    }

    async fn visit_assignment(
        &mut self,
        assignment: &Arc<Assignment>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_assignment(self, assignment, p, cursor).await
    }

    async fn visit_annotation(
        &mut self,
        annotation: &Arc<Annotation>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_annotation(self, annotation, p, cursor).await
    }

    async fn visit_parentheses(
        &mut self,
        parentheses: &Arc<Parentheses>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<J>> {
        walk_parentheses(self, parentheses, p, cursor).await
    }

    async fn visit_empty(&mut self, empty: &Arc<Empty>, p: &mut P, cursor: &Cursor) -> Result<Option<J>> {
        walk_empty(self, empty, p, cursor).await
    }

    async fn visit_right_padded(
        &mut self,
        padded: &RightPadded<J>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<RightPadded<J>>> {
        walk_right_padded(self, padded, p, cursor).await
    }

    async fn visit_left_padded(
        &mut self,
        padded: &LeftPadded<J>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Option<LeftPadded<J>>> {
        walk_left_padded(self, padded, p, cursor).await
    }

    async fn visit_container(
        &mut self,
        container: &Container<J>,
        p: &mut P,
        cursor: &Cursor,
    ) -> Result<Container<J>> {
        walk_container(self, container, p, cursor).await
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

pub async fn walk<V, P>(v: &mut V, tree: &J, p: &mut P, parent: &Cursor) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let cursor = parent.push(tree.clone());
    let tree = match v.pre_visit(tree, p, &cursor).await? {
        PreVisit::Descend(tree) => tree,
        PreVisit::Stop(result) => return Ok(result),
    };

    let visited = match &tree {
        J::CompilationUnit(node) => v.visit_compilation_unit(node, p, &cursor).await?,
        J::Identifier(node) => v.visit_identifier(node, p, &cursor).await?,
        J::Literal(node) => v.visit_literal(node, p, &cursor).await?,
        J::FieldAccess(node) => v.visit_field_access(node, p, &cursor).await?,
        J::MethodInvocation(node) => v.visit_method_invocation(node, p, &cursor).await?,
        J::Ternary(node) => v.visit_ternary(node, p, &cursor).await?,
        J::Binary(node) => v.visit_binary(node, p, &cursor).await?,
        J::Assignment(node) => v.visit_assignment(node, p, &cursor).await?,
        J::Annotation(node) => v.visit_annotation(node, p, &cursor).await?,
        J::Parentheses(node) => v.visit_parentheses(node, p, &cursor).await?,
        J::Empty(node) => v.visit_empty(node, p, &cursor).await?,
    };

    match visited {
        Some(tree) => v.post_visit(tree, p, &cursor).await,
        None => Ok(None),
    }
}

pub async fn walk_compilation_unit<V, P>(
    v: &mut V,
    unit: &Arc<CompilationUnit>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&unit.prefix, p, cursor).await?;
    let markers = v.visit_markers(&unit.markers, p, cursor).await?;
    let mut statements = ListDraft::new(&unit.statements);
    for (i, statement) in unit.statements.iter().enumerate() {
        statements.push(i, v.visit_right_padded(statement, p, cursor).await?);
    }
    let statements = statements.finish();
    let eof = v.visit_space(&unit.eof, p, cursor).await?;

    Ok(Some(J::CompilationUnit(produce(unit, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        if let Some(statements) = statements {
            draft.statements = statements;
        }
        draft.eof = eof;
    }))))
}

pub async fn walk_identifier<V, P>(
    v: &mut V,
    identifier: &Arc<Identifier>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&identifier.prefix, p, cursor).await?;
    let markers = v.visit_markers(&identifier.markers, p, cursor).await?;
    Ok(Some(J::Identifier(produce(identifier, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
    }))))
}

pub async fn walk_literal<V, P>(
    v: &mut V,
    literal: &Arc<Literal>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&literal.prefix, p, cursor).await?;
    let markers = v.visit_markers(&literal.markers, p, cursor).await?;
    Ok(Some(J::Literal(produce(literal, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
    }))))
}

pub async fn walk_field_access<V, P>(
    v: &mut V,
    field_access: &Arc<FieldAccess>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&field_access.prefix, p, cursor).await?;
    let markers = v.visit_markers(&field_access.markers, p, cursor).await?;
    let target = required(
        "FieldAccess",
        "target",
        v.visit(&field_access.target, p, cursor).await?,
    )?;
    let name = required(
        "FieldAccess",
        "name",
        v.visit_left_padded(&field_access.name, p, cursor).await?,
    )?;

    Ok(Some(J::FieldAccess(produce(field_access, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.target = target;
        draft.name = name;
    }))))
}

pub async fn walk_method_invocation<V, P>(
    v: &mut V,
    invocation: &Arc<MethodInvocation>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&invocation.prefix, p, cursor).await?;
    let markers = v.visit_markers(&invocation.markers, p, cursor).await?;
    // A removed select turns `a.f()` into `f()`
    let select = match &invocation.select {
        Some(select) => v.visit_right_padded(select, p, cursor).await?,
        None => None,
    };
    let name = required(
        "MethodInvocation",
        "name",
        v.visit(&invocation.name, p, cursor).await?,
    )?;
    let arguments = v.visit_container(&invocation.arguments, p, cursor).await?;

    Ok(Some(J::MethodInvocation(produce(invocation, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.select = select;
        draft.name = name;
        draft.arguments = arguments;
    }))))
}

pub async fn walk_ternary<V, P>(
    v: &mut V,
    ternary: &Arc<Ternary>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&ternary.prefix, p, cursor).await?;
    let markers = v.visit_markers(&ternary.markers, p, cursor).await?;
    let condition = required(
        "Ternary",
        "condition",
        v.visit(&ternary.condition, p, cursor).await?,
    )?;
    let true_part = required(
        "Ternary",
        "true_part",
        v.visit_left_padded(&ternary.true_part, p, cursor).await?,
    )?;
    let false_part = required(
        "Ternary",
        "false_part",
        v.visit_left_padded(&ternary.false_part, p, cursor).await?,
    )?;

    Ok(Some(J::Ternary(produce(ternary, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.condition = condition;
        draft.true_part = true_part;
        draft.false_part = false_part;
    }))))
}

pub async fn walk_binary<V, P>(
    v: &mut V,
    binary: &Arc<Binary>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&binary.prefix, p, cursor).await?;
    let markers = v.visit_markers(&binary.markers, p, cursor).await?;
    let left = required("Binary", "left", v.visit(&binary.left, p, cursor).await?)?;
    let operator_before = v.visit_space(&binary.operator.before, p, cursor).await?;
    let operator_markers = v.visit_markers(&binary.operator.markers, p, cursor).await?;
    let operator = binary.operator.with_parts(
        operator_before,
        binary.operator.element,
        operator_markers,
    );
    let right = required("Binary", "right", v.visit(&binary.right, p, cursor).await?)?;

    Ok(Some(J::Binary(produce(binary, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.left = left;
        draft.operator = operator;
        draft.right = right;
    }))))
}

pub async fn walk_assignment<V, P>(
    v: &mut V,
    assignment: &Arc<Assignment>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&assignment.prefix, p, cursor).await?;
    let markers = v.visit_markers(&assignment.markers, p, cursor).await?;
    let variable = required(
        "Assignment",
        "variable",
        v.visit(&assignment.variable, p, cursor).await?,
    )?;
    let value = required(
        "Assignment",
        "assignment",
        v.visit_left_padded(&assignment.assignment, p, cursor).await?,
    )?;

    Ok(Some(J::Assignment(produce(assignment, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.variable = variable;
        draft.assignment = value;
    }))))
}

pub async fn walk_annotation<V, P>(
    v: &mut V,
    annotation: &Arc<Annotation>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&annotation.prefix, p, cursor).await?;
    let markers = v.visit_markers(&annotation.markers, p, cursor).await?;
    let annotation_type = required(
        "Annotation",
        "annotation_type",
        v.visit(&annotation.annotation_type, p, cursor).await?,
    )?;
    let arguments = match &annotation.arguments {
        Some(arguments) => Some(v.visit_container(arguments, p, cursor).await?),
        None => None,
    };

    Ok(Some(J::Annotation(produce(annotation, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.annotation_type = annotation_type;
        draft.arguments = arguments;
    }))))
}

pub async fn walk_parentheses<V, P>(
    v: &mut V,
    parentheses: &Arc<Parentheses>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&parentheses.prefix, p, cursor).await?;
    let markers = v.visit_markers(&parentheses.markers, p, cursor).await?;
    let tree = required(
        "Parentheses",
        "tree",
        v.visit_right_padded(&parentheses.tree, p, cursor).await?,
    )?;

    Ok(Some(J::Parentheses(produce(parentheses, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
        draft.tree = tree;
    }))))
}

pub async fn walk_empty<V, P>(v: &mut V, empty: &Arc<Empty>, p: &mut P, cursor: &Cursor) -> Result<Option<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let prefix = v.visit_space(&empty.prefix, p, cursor).await?;
    let markers = v.visit_markers(&empty.markers, p, cursor).await?;
    Ok(Some(J::Empty(produce(empty, |draft| {
        draft.prefix = prefix;
        draft.markers = markers;
    }))))
}

pub async fn walk_right_padded<V, P>(
    v: &mut V,
    padded: &RightPadded<J>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<RightPadded<J>>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let Some(element) = v.visit(&padded.element, p, cursor).await? else {
        return Ok(None);
    };
    let after = v.visit_space(&padded.after, p, cursor).await?;
    let markers = v.visit_markers(&padded.markers, p, cursor).await?;
    Ok(Some(padded.with_parts(element, after, markers)))
}

pub async fn walk_left_padded<V, P>(
    v: &mut V,
    padded: &LeftPadded<J>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Option<LeftPadded<J>>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let before = v.visit_space(&padded.before, p, cursor).await?;
    let Some(element) = v.visit(&padded.element, p, cursor).await? else {
        return Ok(None);
    };
    let markers = v.visit_markers(&padded.markers, p, cursor).await?;
    Ok(Some(padded.with_parts(before, element, markers)))
}

/// An argument list emptied by removals keeps a single [`Empty`] element
pub async fn walk_container<V, P>(
    v: &mut V,
    container: &Container<J>,
    p: &mut P,
    cursor: &Cursor,
) -> Result<Container<J>>
where
    V: JavaVisitor<P> + ?Sized,
    P: Send,
{
    let before = v.visit_space(&container.before, p, cursor).await?;
    let markers = v.visit_markers(&container.markers, p, cursor).await?;
    let mut elements = ListDraft::new(&container.elements);
    for (i, element) in container.elements.iter().enumerate() {
        elements.push(i, v.visit_right_padded(element, p, cursor).await?);
    }

    let elements = elements.finish();
    if elements.is_none() && before == container.before && markers.identical(&container.markers) {
        return Ok(container.clone());
    }

    let mut elements = elements.unwrap_or_else(|| container.elements.clone());
    if elements.is_empty() {
        elements.push(RightPadded::build(J::empty()));
    }
    Ok(Container {
        before,
        elements,
        markers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::print;
    use crate::tree::{Marker, Tree};

    fn ident(prefix: &str, name: &str) -> J {
        J::identifier(Space::whitespace(prefix), name)
    }

    /// `foo.bar(a, b)`
    fn invocation() -> J {
        J::MethodInvocation(Arc::new(MethodInvocation::new(
            Space::EMPTY,
            Some(RightPadded::build(ident("", "foo"))),
            ident("", "bar"),
            Container::build(vec![
                RightPadded::build(ident("", "a")),
                RightPadded::build(ident(" ", "b")),
            ]),
        )))
    }

    struct Noop;

    impl JavaVisitor<()> for Noop {}

    #[tokio::test]
    async fn test_noop_keeps_reference() {
        let tree = invocation();
        assert_eq!(print(&tree), "foo.bar(a, b)");
        let after = Noop.visit(&tree, &mut (), &Cursor::root()).await.unwrap().unwrap();
        assert!(tree.is_same(&after));
    }

    /// Removes arguments named `name`
    struct RemoveArgument {
        name: &'static str,
    }

    #[async_trait]
    impl JavaVisitor<()> for RemoveArgument {
        async fn visit_identifier(
            &mut self,
            identifier: &Arc<Identifier>,
            _p: &mut (),
            cursor: &Cursor,
        ) -> Result<Option<J>> {
            let is_argument = cursor
                .parent()
                .and_then(|parent| parent.value::<J>())
                .and_then(|parent| match parent {
                    J::MethodInvocation(invocation) => Some(invocation),
                    _ => None,
                })
                .is_some_and(|invocation| {
                    invocation
                        .arguments
                        .elements()
                        .any(|argument| argument.id() == identifier.id)
                });
            if is_argument && identifier.simple_name == self.name {
                return Ok(None);
            }
            Ok(Some(J::Identifier(identifier.clone())))
        }
    }

    #[tokio::test]
    async fn test_removing_arguments() {
        let tree = invocation();
        let after = RemoveArgument { name: "a" }
            .visit(&tree, &mut (), &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(print(&after), "foo.bar( b)");

        let J::MethodInvocation(before) = &tree else {
            unreachable!()
        };
        let J::MethodInvocation(after) = &after else {
            panic!("expected invocation");
        };
        assert!(before.name.is_same(&after.name));
        assert!(
            before.select.as_ref().unwrap().element.is_same(&after.select.as_ref().unwrap().element)
        );
    }

    #[tokio::test]
    async fn test_emptied_arguments_keep_placeholder() {
        let tree = J::MethodInvocation(Arc::new(MethodInvocation::new(
            Space::EMPTY,
            None,
            ident("", "f"),
            Container::build(vec![RightPadded::build(ident("", "x"))]),
        )));
        let after = RemoveArgument { name: "x" }
            .visit(&tree, &mut (), &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(print(&after), "f()");
    }

    /// Marks every identifier in `pre_visit`
    struct MarkIdentifiers {
        marker: Arc<Marker>,
    }

    #[async_trait]
    impl JavaVisitor<usize> for MarkIdentifiers {
        async fn pre_visit(
            &mut self,
            tree: &J,
            count: &mut usize,
            _cursor: &Cursor,
        ) -> Result<PreVisit<J>> {
            if let J::Identifier(_) = tree {
                *count += 1;
                let markers = tree.markers().search_result(&self.marker);
                return Ok(PreVisit::Stop(Some(tree.with_markers(markers))));
            }
            Ok(PreVisit::Descend(tree.clone()))
        }
    }

    #[tokio::test]
    async fn test_pre_visit_marks_share_one_marker() {
        let marker = Arc::new(Marker::search_result(None));
        let mut visitor = MarkIdentifiers {
            marker: marker.clone(),
        };
        let mut count = 0;
        let after = visitor
            .visit(&invocation(), &mut count, &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count, 4);
        assert_eq!(
            crate::java::print_with(&after, &crate::printer::SearchResultPrinter),
            "~~>foo.~~>bar(~~>a, ~~>b)"
        );
    }
}
