//! Shared printing support
//!
//! Language printers walk their tree in declaration order and append to a
//! [`PrintOutput`]: prefix space first, then marker decorations, then the
//! node's own syntax interleaved with its children. With the default
//! [`MarkerPrinter`] the output is exactly the parsed source.

use crate::tree::{Marker, Markers, Space};

/// Decides what markers contribute to printed output
pub trait MarkerPrinter: Send + Sync {
    /// Text emitted after a node's prefix and before its own syntax
    fn before_syntax(&self, marker: &Marker) -> Option<String>;
}

/// Prints markers as nothing; output equals the source
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMarkerPrinter;

impl MarkerPrinter for DefaultMarkerPrinter {
    fn before_syntax(&self, _marker: &Marker) -> Option<String> {
        None
    }
}

/// Highlights search hits as `~~>` or `~~(description)~~>`
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchResultPrinter;

impl MarkerPrinter for SearchResultPrinter {
    fn before_syntax(&self, marker: &Marker) -> Option<String> {
        match marker {
            Marker::SearchResult {
                description: Some(description),
                ..
            } => Some(format!("~~({description})~~>")),
            Marker::SearchResult {
                description: None, ..
            } => Some("~~>".to_string()),
            _ => None,
        }
    }
}

/// Output buffer handed through a print
pub struct PrintOutput<'p> {
    out: String,
    marker_printer: &'p dyn MarkerPrinter,
}

impl<'p> PrintOutput<'p> {
    pub fn new(marker_printer: &'p dyn MarkerPrinter) -> Self {
        Self {
            out: String::new(),
            marker_printer,
        }
    }

    pub fn append(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn space(&mut self, space: &Space) {
        space.print_to(&mut self.out);
    }

    /// Prefix followed by any marker decorations
    pub fn before_syntax(&mut self, prefix: &Space, markers: &Markers) {
        self.space(prefix);
        for marker in markers.iter() {
            if let Some(text) = self.marker_printer.before_syntax(marker) {
                self.out.push_str(&text);
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}
