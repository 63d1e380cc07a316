//! `J`: expressions shared by the Java and JavaScript trees
//!
//! There is no parser here; front-ends build these trees (or they arrive
//! over RPC) and this module prints and visits them.

mod printer;
pub mod recipes;
mod tree;
mod types;
mod visitor;

pub use printer::{JavaPrinter, print, print_with};
pub use tree::{
    Annotation, Assignment, Binary, BinaryOperator, CompilationUnit, Empty, FieldAccess,
    Identifier, J, Literal, MethodInvocation, Parentheses, Ternary,
};
pub use types::{JavaType, PrimitiveKind};
pub use visitor::{
    JavaVisitor, walk, walk_annotation, walk_assignment, walk_binary, walk_compilation_unit,
    walk_container, walk_empty, walk_field_access, walk_identifier, walk_left_padded,
    walk_literal, walk_method_invocation, walk_parentheses, walk_right_padded, walk_ternary,
};
