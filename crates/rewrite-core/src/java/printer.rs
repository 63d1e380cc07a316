use crate::printer::{DefaultMarkerPrinter, MarkerPrinter, PrintOutput};
use crate::tree::{Container, MarkerKind, RightPadded};

use super::tree::J;

pub fn print(tree: &J) -> String {
    print_with(tree, &DefaultMarkerPrinter)
}

pub fn print_with(tree: &J, marker_printer: &dyn MarkerPrinter) -> String {
    let mut out = PrintOutput::new(marker_printer);
    JavaPrinter.print(tree, &mut out);
    out.finish()
}

pub struct JavaPrinter;

impl JavaPrinter {
    pub fn print(&self, tree: &J, out: &mut PrintOutput<'_>) {
        match tree {
            J::CompilationUnit(unit) => {
                out.before_syntax(&unit.prefix, &unit.markers);
                for statement in &unit.statements {
                    self.print(&statement.element, out);
                    out.space(&statement.after);
                    if statement.markers.has(MarkerKind::Semicolon) {
                        out.append(";");
                    }
                }
                out.space(&unit.eof);
            }
            J::Identifier(identifier) => {
                out.before_syntax(&identifier.prefix, &identifier.markers);
                out.append(&identifier.simple_name);
            }
            J::Literal(literal) => {
                out.before_syntax(&literal.prefix, &literal.markers);
                out.append(&literal.value_source);
            }
            J::FieldAccess(field_access) => {
                out.before_syntax(&field_access.prefix, &field_access.markers);
                self.print(&field_access.target, out);
                out.space(&field_access.name.before);
                if field_access.markers.has(MarkerKind::Optional) {
                    out.append("?.");
                } else {
                    out.append(".");
                }
                self.print(&field_access.name.element, out);
            }
            J::MethodInvocation(invocation) => {
                out.before_syntax(&invocation.prefix, &invocation.markers);
                if let Some(select) = &invocation.select {
                    self.print(&select.element, out);
                    out.space(&select.after);
                    out.append(".");
                }
                self.print(&invocation.name, out);
                self.print_container(&invocation.arguments, "(", ")", out);
            }
            J::Ternary(ternary) => {
                out.before_syntax(&ternary.prefix, &ternary.markers);
                self.print(&ternary.condition, out);
                out.space(&ternary.true_part.before);
                out.append("?");
                self.print(&ternary.true_part.element, out);
                out.space(&ternary.false_part.before);
                out.append(":");
                self.print(&ternary.false_part.element, out);
            }
            J::Binary(binary) => {
                out.before_syntax(&binary.prefix, &binary.markers);
                self.print(&binary.left, out);
                out.space(&binary.operator.before);
                out.append(binary.operator.element.keyword());
                self.print(&binary.right, out);
            }
            J::Assignment(assignment) => {
                out.before_syntax(&assignment.prefix, &assignment.markers);
                self.print(&assignment.variable, out);
                out.space(&assignment.assignment.before);
                out.append("=");
                self.print(&assignment.assignment.element, out);
            }
            J::Annotation(annotation) => {
                out.before_syntax(&annotation.prefix, &annotation.markers);
                out.append("@");
                self.print(&annotation.annotation_type, out);
                if let Some(arguments) = &annotation.arguments {
                    self.print_container(arguments, "(", ")", out);
                }
            }
            J::Parentheses(parentheses) => {
                out.before_syntax(&parentheses.prefix, &parentheses.markers);
                out.append("(");
                self.print_right_padded(&parentheses.tree, out);
                out.append(")");
            }
            J::Empty(empty) => {
                out.before_syntax(&empty.prefix, &empty.markers);
            }
        }
    }

    fn print_right_padded(&self, padded: &RightPadded<J>, out: &mut PrintOutput<'_>) {
        self.print(&padded.element, out);
        out.space(&padded.after);
    }

    fn print_container(
        &self,
        container: &Container<J>,
        open: &str,
        close: &str,
        out: &mut PrintOutput<'_>,
    ) {
        out.before_syntax(&container.before, &container.markers);
        out.append(open);
        for (i, padded) in container.elements.iter().enumerate() {
            if i > 0 {
                out.append(",");
            }
            self.print_right_padded(padded, out);
        }
        out.append(close);
    }
}
