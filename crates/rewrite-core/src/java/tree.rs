//! `J`: the expression-level tree shared by Java and JavaScript
//!
//! Padding follows the token that owns the whitespace: in `a ? b : c` the
//! space before `?` is the `before` of the true part's [`LeftPadded`], and
//! the space before `,` in an argument list is the `after` of that
//! argument's [`RightPadded`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tree::{Container, Identical, LeftPadded, Markers, RightPadded, Space, TreeId};
use crate::{identical_fields, tree_enum};

use super::types::JavaType;

tree_enum! {
    pub enum J {
        CompilationUnit(CompilationUnit),
        Identifier(Identifier),
        Literal(Literal),
        FieldAccess(FieldAccess),
        MethodInvocation(MethodInvocation),
        Ternary(Ternary),
        Binary(Binary),
        Assignment(Assignment),
        Annotation(Annotation),
        Parentheses(Parentheses),
        Empty(Empty),
    }
}

#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub source_path: String,
    /// `;` is printed after a statement only when it carries a `Semicolon` marker
    pub statements: Vec<RightPadded<J>>,
    pub eof: Space,
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub simple_name: String,
    pub ty: Option<Arc<JavaType>>,
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub value_source: String,
    pub value: serde_json::Value,
    pub ty: Option<Arc<JavaType>>,
}

/// `target.name`, or `target?.name` with an `Optional` marker
#[derive(Debug, Clone)]
pub struct FieldAccess {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub target: J,
    pub name: LeftPadded<J>,
}

#[derive(Debug, Clone)]
pub struct MethodInvocation {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub select: Option<RightPadded<J>>,
    pub name: J,
    pub arguments: Container<J>,
}

#[derive(Debug, Clone)]
pub struct Ternary {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub condition: J,
    pub true_part: LeftPadded<J>,
    pub false_part: LeftPadded<J>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    And,
    Or,
}

impl BinaryOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            BinaryOperator::Addition => "+",
            BinaryOperator::Subtraction => "-",
            BinaryOperator::Multiplication => "*",
            BinaryOperator::Division => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

impl Identical for BinaryOperator {
    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

#[derive(Debug, Clone)]
pub struct Binary {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub left: J,
    pub operator: LeftPadded<BinaryOperator>,
    pub right: J,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub variable: J,
    pub assignment: LeftPadded<J>,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub annotation_type: J,
    /// `None` for a bare `@Foo`
    pub arguments: Option<Container<J>>,
}

#[derive(Debug, Clone)]
pub struct Parentheses {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub tree: RightPadded<J>,
}

#[derive(Debug, Clone)]
pub struct Empty {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
}

identical_fields!(CompilationUnit {
    id,
    prefix,
    markers,
    source_path,
    statements,
    eof
});
identical_fields!(Identifier {
    id,
    prefix,
    markers,
    simple_name,
    ty
});
identical_fields!(Literal {
    id,
    prefix,
    markers,
    value_source,
    value,
    ty
});
identical_fields!(FieldAccess {
    id,
    prefix,
    markers,
    target,
    name
});
identical_fields!(MethodInvocation {
    id,
    prefix,
    markers,
    select,
    name,
    arguments
});
identical_fields!(Ternary {
    id,
    prefix,
    markers,
    condition,
    true_part,
    false_part
});
identical_fields!(Binary {
    id,
    prefix,
    markers,
    left,
    operator,
    right
});
identical_fields!(Assignment {
    id,
    prefix,
    markers,
    variable,
    assignment
});
identical_fields!(Annotation {
    id,
    prefix,
    markers,
    annotation_type,
    arguments
});
identical_fields!(Parentheses {
    id,
    prefix,
    markers,
    tree
});
identical_fields!(Empty { id, prefix, markers });

impl CompilationUnit {
    pub fn new(source_path: impl Into<String>, statements: Vec<RightPadded<J>>, eof: Space) -> Self {
        Self {
            id: TreeId::random(),
            prefix: Space::EMPTY,
            markers: Markers::new(),
            source_path: source_path.into(),
            statements,
            eof,
        }
    }
}

impl Identifier {
    pub fn new(prefix: Space, simple_name: impl Into<String>, ty: Option<Arc<JavaType>>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            simple_name: simple_name.into(),
            ty,
        }
    }
}

impl Literal {
    pub fn new(
        prefix: Space,
        value_source: impl Into<String>,
        value: serde_json::Value,
        ty: Option<Arc<JavaType>>,
    ) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            value_source: value_source.into(),
            value,
            ty,
        }
    }
}

impl FieldAccess {
    pub fn new(prefix: Space, target: J, name: LeftPadded<J>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            target,
            name,
        }
    }

    pub fn simple_name(&self) -> Option<&str> {
        self.name.element.as_identifier().map(|name| name.simple_name.as_str())
    }
}

impl MethodInvocation {
    pub fn new(
        prefix: Space,
        select: Option<RightPadded<J>>,
        name: J,
        arguments: Container<J>,
    ) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            select,
            name,
            arguments,
        }
    }
}

impl Ternary {
    pub fn new(prefix: Space, condition: J, true_part: LeftPadded<J>, false_part: LeftPadded<J>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            condition,
            true_part,
            false_part,
        }
    }
}

impl Binary {
    pub fn new(prefix: Space, left: J, operator: LeftPadded<BinaryOperator>, right: J) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            left,
            operator,
            right,
        }
    }
}

impl Assignment {
    pub fn new(prefix: Space, variable: J, assignment: LeftPadded<J>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            variable,
            assignment,
        }
    }
}

impl Annotation {
    pub fn new(prefix: Space, annotation_type: J, arguments: Option<Container<J>>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            annotation_type,
            arguments,
        }
    }
}

impl Parentheses {
    pub fn new(prefix: Space, tree: RightPadded<J>) -> Self {
        Self {
            id: TreeId::random(),
            prefix,
            markers: Markers::new(),
            tree,
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

impl J {
    pub fn identifier(prefix: Space, simple_name: impl Into<String>) -> J {
        J::Identifier(Arc::new(Identifier::new(prefix, simple_name, None)))
    }

    pub fn empty() -> J {
        J::Empty(Arc::new(Empty::new(Space::EMPTY)))
    }

    pub fn as_identifier(&self) -> Option<&Arc<Identifier>> {
        match self {
            J::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn as_field_access(&self) -> Option<&Arc<FieldAccess>> {
        match self {
            J::FieldAccess(field_access) => Some(field_access),
            _ => None,
        }
    }

    pub fn as_ternary(&self) -> Option<&Arc<Ternary>> {
        match self {
            J::Ternary(ternary) => Some(ternary),
            _ => None,
        }
    }

    pub fn as_compilation_unit(&self) -> Option<&Arc<CompilationUnit>> {
        match self {
            J::CompilationUnit(unit) => Some(unit),
            _ => None,
        }
    }

    /// Attributed type of an expression, if the node carries one
    pub fn java_type(&self) -> Option<&Arc<JavaType>> {
        match self {
            J::Identifier(identifier) => identifier.ty.as_ref(),
            J::Literal(literal) => literal.ty.as_ref(),
            J::FieldAccess(field_access) => field_access.name.element.java_type(),
            J::Parentheses(parentheses) => parentheses.tree.element.java_type(),
            _ => None,
        }
    }

    /// Same variable referenced by two identifiers: same name and, when both
    /// are attributed, the same type
    pub fn is_same_reference(&self, other: &J) -> bool {
        match (self, other) {
            (J::Identifier(a), J::Identifier(b)) => {
                a.simple_name == b.simple_name
                    && match (&a.ty, &b.ty) {
                        (Some(ta), Some(tb)) => ta == tb,
                        _ => true,
                    }
            }
            (J::FieldAccess(a), J::FieldAccess(b)) => {
                a.simple_name() == b.simple_name() && a.target.is_same_reference(&b.target)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    #[test]
    fn test_kind_names() {
        assert_eq!(J::identifier(Space::EMPTY, "a").kind_name(), "Identifier");
        assert_eq!(J::empty().kind_name(), "Empty");
    }

    #[test]
    fn test_same_reference() {
        let a = J::identifier(Space::EMPTY, "a");
        let a_again = J::identifier(Space::whitespace(" "), "a");
        let b = J::identifier(Space::EMPTY, "b");
        assert!(a.is_same_reference(&a_again));
        assert!(!a.is_same_reference(&b));

        let typed = J::Identifier(Arc::new(Identifier::new(
            Space::EMPTY,
            "a",
            Some(JavaType::class("A")),
        )));
        let other_type = J::Identifier(Arc::new(Identifier::new(
            Space::EMPTY,
            "a",
            Some(JavaType::class("B")),
        )));
        assert!(typed.is_same_reference(&a));
        assert!(!typed.is_same_reference(&other_type));
    }

    #[test]
    fn test_field_access_type_is_name_type() {
        let name = J::Identifier(Arc::new(Identifier::new(
            Space::EMPTY,
            "b",
            Some(JavaType::class("B")),
        )));
        let access = J::FieldAccess(Arc::new(FieldAccess::new(
            Space::EMPTY,
            J::identifier(Space::EMPTY, "a"),
            LeftPadded::build(name),
        )));
        assert_eq!(access.java_type().map(|ty| ty.name()), Some("B"));
    }
}
