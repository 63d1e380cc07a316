//! Source files across languages
//!
//! A [`SourceFile`] is the root a scheduler or RPC peer works with. Recipes
//! see it through [`SourceVisitor`]; the [`JsonEditor`] and [`JavaEditor`]
//! adapters lift a language visitor into one, leaving files of other
//! languages untouched.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cursor::Cursor;
use crate::error::RewriteError;
use crate::identical_fields;
use crate::java::{self, J, JavaVisitor};
use crate::json::{self, Json, JsonVisitor};
use crate::printer::{DefaultMarkerPrinter, MarkerPrinter};
use crate::result::Result;
use crate::tree::{Identical, Markers, Space, Tree, TreeId};
use crate::visitor::produce;

/// Unparseable input, kept verbatim so the file still round-trips
#[derive(Debug, Clone)]
pub struct ParseError {
    pub id: TreeId,
    pub prefix: Space,
    pub markers: Markers,
    pub source_path: String,
    pub text: String,
}

identical_fields!(ParseError {
    id,
    prefix,
    markers,
    source_path,
    text
});

impl ParseError {
    pub fn new(source_path: impl Into<String>, text: impl Into<String>, markers: Markers) -> Self {
        Self {
            id: TreeId::random(),
            prefix: Space::EMPTY,
            markers,
            source_path: source_path.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SourceFile {
    Json(Arc<json::Document>),
    Java(Arc<java::CompilationUnit>),
    ParseError(Arc<ParseError>),
}

impl SourceFile {
    pub fn source_path(&self) -> &str {
        match self {
            SourceFile::Json(document) => &document.source_path,
            SourceFile::Java(unit) => &unit.source_path,
            SourceFile::ParseError(error) => &error.source_path,
        }
    }

    /// Stable type tag, also used as the RPC `sourceFileType`
    pub fn source_file_type(&self) -> &'static str {
        match self {
            SourceFile::Json(_) => "Json.Document",
            SourceFile::Java(_) => "J.CompilationUnit",
            SourceFile::ParseError(_) => "ParseError",
        }
    }

    pub fn print(&self) -> String {
        self.print_with(&DefaultMarkerPrinter)
    }

    pub fn print_with(&self, marker_printer: &dyn MarkerPrinter) -> String {
        match self {
            SourceFile::Json(document) => {
                json::print_with(&Json::Document(document.clone()), marker_printer)
            }
            SourceFile::Java(unit) => {
                java::print_with(&J::CompilationUnit(unit.clone()), marker_printer)
            }
            SourceFile::ParseError(error) => {
                let mut out = error.prefix.print();
                out.push_str(&error.text);
                out
            }
        }
    }

    /// Convert a visited JSON root back into a source file
    pub fn from_json(tree: Json) -> Result<Self> {
        match tree {
            Json::Document(document) => Ok(SourceFile::Json(document)),
            other => Err(RewriteError::UnexpectedKind {
                expected: "Document",
                found: other.kind_name(),
            }),
        }
    }

    /// Convert a visited J root back into a source file
    pub fn from_java(tree: J) -> Result<Self> {
        match tree {
            J::CompilationUnit(unit) => Ok(SourceFile::Java(unit)),
            other => Err(RewriteError::UnexpectedKind {
                expected: "CompilationUnit",
                found: other.kind_name(),
            }),
        }
    }
}

impl Tree for SourceFile {
    fn id(&self) -> TreeId {
        match self {
            SourceFile::Json(document) => document.id,
            SourceFile::Java(unit) => unit.id,
            SourceFile::ParseError(error) => error.id,
        }
    }

    fn prefix(&self) -> &Space {
        match self {
            SourceFile::Json(document) => &document.prefix,
            SourceFile::Java(unit) => &unit.prefix,
            SourceFile::ParseError(error) => &error.prefix,
        }
    }

    fn markers(&self) -> &Markers {
        match self {
            SourceFile::Json(document) => &document.markers,
            SourceFile::Java(unit) => &unit.markers,
            SourceFile::ParseError(error) => &error.markers,
        }
    }

    fn with_prefix(&self, prefix: Space) -> Self {
        match self {
            SourceFile::Json(document) => SourceFile::Json(produce(document, |d| d.prefix = prefix)),
            SourceFile::Java(unit) => SourceFile::Java(produce(unit, |d| d.prefix = prefix)),
            SourceFile::ParseError(error) => {
                SourceFile::ParseError(produce(error, |d| d.prefix = prefix))
            }
        }
    }

    fn with_markers(&self, markers: Markers) -> Self {
        match self {
            SourceFile::Json(document) => {
                SourceFile::Json(produce(document, |d| d.markers = markers))
            }
            SourceFile::Java(unit) => SourceFile::Java(produce(unit, |d| d.markers = markers)),
            SourceFile::ParseError(error) => {
                SourceFile::ParseError(produce(error, |d| d.markers = markers))
            }
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            SourceFile::Json(_) => "Document",
            SourceFile::Java(_) => "CompilationUnit",
            SourceFile::ParseError(_) => "ParseError",
        }
    }

    fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (SourceFile::Json(a), SourceFile::Json(b)) => Arc::ptr_eq(a, b),
            (SourceFile::Java(a), SourceFile::Java(b)) => Arc::ptr_eq(a, b),
            (SourceFile::ParseError(a), SourceFile::ParseError(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Identical for SourceFile {
    fn identical(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

/// Language-erased visitor over whole source files
#[async_trait]
pub trait SourceVisitor<P: Send>: Send {
    fn is_acceptable(&self, _source: &SourceFile) -> bool {
        true
    }

    /// `Ok(None)` deletes the file
    async fn visit_source(
        &mut self,
        source: &SourceFile,
        p: &mut P,
        parent: &Cursor,
    ) -> Result<Option<SourceFile>>;
}

/// Applies a [`JsonVisitor`] to JSON documents
pub struct JsonEditor<V>(pub V);

#[async_trait]
impl<V, P> SourceVisitor<P> for JsonEditor<V>
where
    V: JsonVisitor<P>,
    P: Send,
{
    fn is_acceptable(&self, source: &SourceFile) -> bool {
        matches!(source, SourceFile::Json(_))
    }

    async fn visit_source(
        &mut self,
        source: &SourceFile,
        p: &mut P,
        parent: &Cursor,
    ) -> Result<Option<SourceFile>> {
        let SourceFile::Json(document) = source else {
            return Ok(Some(source.clone()));
        };
        match self.0.visit(&Json::Document(document.clone()), p, parent).await? {
            Some(tree) => SourceFile::from_json(tree).map(Some),
            None => Ok(None),
        }
    }
}

/// Applies a [`JavaVisitor`] to compilation units
pub struct JavaEditor<V>(pub V);

#[async_trait]
impl<V, P> SourceVisitor<P> for JavaEditor<V>
where
    V: JavaVisitor<P>,
    P: Send,
{
    fn is_acceptable(&self, source: &SourceFile) -> bool {
        matches!(source, SourceFile::Java(_))
    }

    async fn visit_source(
        &mut self,
        source: &SourceFile,
        p: &mut P,
        parent: &Cursor,
    ) -> Result<Option<SourceFile>> {
        let SourceFile::Java(unit) = source else {
            return Ok(Some(source.clone()));
        };
        match self.0.visit(&J::CompilationUnit(unit.clone()), p, parent).await? {
            Some(tree) => SourceFile::from_java(tree).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonParser;

    struct Noop;

    impl JsonVisitor<()> for Noop {}

    struct ReplaceRoot;

    #[async_trait]
    impl JsonVisitor<()> for ReplaceRoot {
        async fn visit_document(
            &mut self,
            document: &Arc<json::Document>,
            _p: &mut (),
            _cursor: &Cursor,
        ) -> Result<Option<Json>> {
            Ok(Some(document.value.clone()))
        }
    }

    #[tokio::test]
    async fn test_json_editor_noop_keeps_reference() {
        let source = JsonParser.parse("a.json", "{\"a\": 1}");
        let after = JsonEditor(Noop)
            .visit_source(&source, &mut (), &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert!(source.is_same(&after));
    }

    #[tokio::test]
    async fn test_json_editor_passes_other_languages_through() {
        let source = JsonParser.parse("broken.json", "{");
        let mut editor = JsonEditor(Noop);
        assert!(!editor.is_acceptable(&source));
        let after = editor
            .visit_source(&source, &mut (), &Cursor::root())
            .await
            .unwrap()
            .unwrap();
        assert!(source.is_same(&after));
    }

    #[tokio::test]
    async fn test_wrong_root_kind_is_an_error() {
        let source = JsonParser.parse("a.json", "[1]");
        let err = JsonEditor(ReplaceRoot)
            .visit_source(&source, &mut (), &Cursor::root())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RewriteError::UnexpectedKind {
                expected: "Document",
                found: "Array"
            }
        ));
    }

    #[test]
    fn test_parse_error_prints_verbatim() {
        let source = SourceFile::ParseError(Arc::new(ParseError::new(
            "x.json",
            "{ not json",
            Markers::new(),
        )));
        assert_eq!(source.print(), "{ not json");
        assert_eq!(source.kind_name(), "ParseError");
        assert_eq!(source.source_path(), "x.json");
    }
}
