//! Round-trip validation
//!
//! The primary correctness oracle for a parser/printer pair: printing an
//! unmodified tree must give back exactly the text it was parsed from.
//! Failures are reported with a unified diff rather than raised.
//!
//! ```rust,ignore
//! let result = RoundTripValidator::new().validate_json("a.json", "{ \"a\": 1 }")?;
//! assert!(result.is_valid());
//! ```

use similar::TextDiff;

use crate::json::JsonParser;
use crate::result::Result;
use crate::source::SourceFile;

#[derive(Debug, Clone, PartialEq)]
pub struct RoundTripResult {
    pub source_path: String,
    pub original: String,
    pub printed: String,
}

impl RoundTripResult {
    pub fn is_valid(&self) -> bool {
        self.original == self.printed
    }

    /// Unified diff from original to printed; empty when valid
    pub fn diff(&self) -> String {
        if self.is_valid() {
            return String::new();
        }
        TextDiff::from_lines(&self.original, &self.printed)
            .unified_diff()
            .header(
                &format!("{} (original)", self.source_path),
                &format!("{} (printed)", self.source_path),
            )
            .to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RoundTripValidator;

impl RoundTripValidator {
    pub fn new() -> Self {
        Self
    }

    /// Parse as JSON and print back; parse failures are errors
    pub fn validate_json(&self, source_path: &str, text: &str) -> Result<RoundTripResult> {
        let document = JsonParser.parse_document(source_path, text)?;
        Ok(self.validate(&SourceFile::Json(document), text))
    }

    /// Compare `source` printed against the text it came from
    pub fn validate(&self, source: &SourceFile, original: &str) -> RoundTripResult {
        let result = RoundTripResult {
            source_path: source.source_path().to_string(),
            original: original.to_string(),
            printed: source.print(),
        };
        if !result.is_valid() {
            tracing::warn!(source_path = %result.source_path, "round trip changed the source");
        }
        result
    }
}
