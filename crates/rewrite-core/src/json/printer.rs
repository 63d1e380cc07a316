//! JSON printer: the exact inverse of [`super::JsonParser`]

use crate::printer::{DefaultMarkerPrinter, MarkerPrinter, PrintOutput};
use crate::tree::{Marker, MarkerKind, RightPadded};

use super::tree::Json;

/// Print `tree` back to source text
pub fn print(tree: &Json) -> String {
    print_with(tree, &DefaultMarkerPrinter)
}

/// Print with marker decorations (e.g. search results)
pub fn print_with(tree: &Json, marker_printer: &dyn MarkerPrinter) -> String {
    let mut out = PrintOutput::new(marker_printer);
    JsonPrinter.print(tree, &mut out);
    out.finish()
}

pub struct JsonPrinter;

impl JsonPrinter {
    pub fn print(&self, tree: &Json, out: &mut PrintOutput<'_>) {
        match tree {
            Json::Document(document) => {
                out.before_syntax(&document.prefix, &document.markers);
                self.print(&document.value, out);
                out.space(&document.eof);
            }
            Json::Object(object) => {
                out.before_syntax(&object.prefix, &object.markers);
                out.append("{");
                self.print_separated(&object.members, out);
                out.append("}");
            }
            Json::Member(member) => {
                out.before_syntax(&member.prefix, &member.markers);
                self.print(&member.key.element, out);
                out.space(&member.key.after);
                out.append(":");
                self.print(&member.value, out);
            }
            Json::Array(array) => {
                out.before_syntax(&array.prefix, &array.markers);
                out.append("[");
                self.print_separated(&array.values, out);
                out.append("]");
            }
            Json::Literal(literal) => {
                out.before_syntax(&literal.prefix, &literal.markers);
                out.append(&literal.source);
            }
            Json::Identifier(identifier) => {
                out.before_syntax(&identifier.prefix, &identifier.markers);
                out.append(&identifier.name);
            }
            Json::Empty(empty) => {
                out.before_syntax(&empty.prefix, &empty.markers);
            }
        }
    }

    fn print_separated(&self, elements: &[RightPadded<Json>], out: &mut PrintOutput<'_>) {
        for (i, padded) in elements.iter().enumerate() {
            self.print(&padded.element, out);
            out.space(&padded.after);
            if i + 1 < elements.len() {
                out.append(",");
            } else if let Some(marker) = padded.markers.find_first(MarkerKind::TrailingComma) {
                if let Marker::TrailingComma { suffix, .. } = marker.as_ref() {
                    out.append(",");
                    out.space(suffix);
                }
            }
        }
    }
}
