//! Error types for tree construction, traversal, and recipe execution

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rewrite operations
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Source text could not be parsed; the parser also yields a
    /// `ParseError` source file, this variant is for callers that want a hard failure
    #[error("Parse error in '{source_path}' at offset {offset}: {message}")]
    ParseError {
        source_path: String,
        offset: usize,
        message: String,
    },

    /// A visitor returned a node of a kind the enclosing slot cannot hold
    #[error("Unexpected tree kind: expected {expected}, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },

    /// A visitor deleted a child that its parent cannot exist without
    #[error("Visitor removed required child '{field}' of {kind}")]
    RequiredChildRemoved {
        kind: &'static str,
        field: &'static str,
    },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Recipe lookup, option binding, or execution errors
    #[error("Recipe error in '{recipe}': {message}")]
    RecipeError { recipe: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Traversal,
    Config,
    Recipe,
    Io,
    Internal,
}

impl RewriteError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RewriteError::ParseError { .. } => ErrorKind::Parse,
            RewriteError::UnexpectedKind { .. } => ErrorKind::Traversal,
            RewriteError::RequiredChildRemoved { .. } => ErrorKind::Traversal,
            RewriteError::ConfigError { .. } => ErrorKind::Config,
            RewriteError::RecipeError { .. } => ErrorKind::Recipe,
            RewriteError::IoError { .. } => ErrorKind::Io,
            RewriteError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (other source files can still be processed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Parse | ErrorKind::Recipe)
    }

    /// Create a parse error
    pub fn parse_error(
        source_path: impl Into<String>,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::ParseError {
            source_path: source_path.into(),
            offset,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a recipe error
    pub fn recipe_error(recipe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecipeError {
            recipe: recipe.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for RewriteError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RewriteError::parse_error("a.json", 3, "unexpected token").kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            RewriteError::RequiredChildRemoved {
                kind: "Member",
                field: "value"
            }
            .kind(),
            ErrorKind::Traversal
        );
        assert_eq!(RewriteError::config_error("bad").kind(), ErrorKind::Config);
    }

    #[test]
    fn test_recoverable() {
        assert!(RewriteError::recipe_error("r", "boom").is_recoverable());
        assert!(!RewriteError::internal_error("boom").is_recoverable());
        assert!(
            !RewriteError::UnexpectedKind {
                expected: "Document",
                found: "Literal"
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_display_names_the_kind() {
        let err = RewriteError::UnexpectedKind {
            expected: "Document",
            found: "Array",
        };
        assert_eq!(
            err.to_string(),
            "Unexpected tree kind: expected Document, found Array"
        );
    }
}
