//! JSON language support: lossless tree, parser, printer, visitor, recipes

mod parser;
mod printer;
pub mod recipes;
mod tree;
mod visitor;

pub use parser::JsonParser;
pub use printer::{JsonPrinter, print, print_with};
pub use tree::{Document, Empty, Identifier, Json, JsonArray, JsonObject, Literal, Member};
pub use visitor::{
    JsonVisitor, walk, walk_array, walk_document, walk_empty, walk_identifier, walk_literal,
    walk_member, walk_object, walk_right_padded,
};
