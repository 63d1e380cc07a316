use serde::{Deserialize, Serialize};

use super::Markers;

/// Whitespace and comments preceding a node or padding boundary
///
/// `whitespace` is the text before the first comment; each [`Comment`]
/// carries the whitespace that follows it in `suffix`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub whitespace: String,
    pub comments: Vec<Comment>,
}

/// A single comment inside a [`Space`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// `/* ... */` when true, `// ...` otherwise
    pub multiline: bool,
    /// Comment body without its delimiters
    pub text: String,
    /// Whitespace between the end of this comment and the next comment or token
    pub suffix: String,
    pub markers: Markers,
}

impl Space {
    pub const EMPTY: Space = Space {
        whitespace: String::new(),
        comments: Vec::new(),
    };

    pub fn build(whitespace: impl Into<String>, comments: Vec<Comment>) -> Self {
        Self {
            whitespace: whitespace.into(),
            comments,
        }
    }

    /// Whitespace-only space
    pub fn whitespace(whitespace: impl Into<String>) -> Self {
        Self::build(whitespace, Vec::new())
    }

    /// Split raw trivia text into whitespace and `//` / `/* */` comments
    ///
    /// An unterminated block comment runs to the end of `text`.
    pub fn format(text: &str) -> Self {
        let mut space = Space::default();
        let mut rest = text;

        while !rest.is_empty() {
            if let Some(body) = rest.strip_prefix("//") {
                let end = body.find('\n').unwrap_or(body.len());
                space.comments.push(Comment::new(false, &body[..end]));
                rest = &body[end..];
            } else if let Some(body) = rest.strip_prefix("/*") {
                match body.find("*/") {
                    Some(end) => {
                        space.comments.push(Comment::new(true, &body[..end]));
                        rest = &body[end + 2..];
                    }
                    None => {
                        space.comments.push(Comment::new(true, body));
                        rest = "";
                    }
                }
            } else {
                let end = rest
                    .char_indices()
                    .find(|&(i, _)| rest[i..].starts_with("//") || rest[i..].starts_with("/*"))
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                let (ws, tail) = rest.split_at(end);
                match space.comments.last_mut() {
                    Some(comment) => comment.suffix.push_str(ws),
                    None => space.whitespace.push_str(ws),
                }
                rest = tail;
            }
        }

        space
    }

    pub fn is_empty(&self) -> bool {
        self.whitespace.is_empty() && self.comments.is_empty()
    }

    /// Exact source text of this space
    pub fn print(&self) -> String {
        let mut out = String::new();
        self.print_to(&mut out);
        out
    }

    pub fn print_to(&self, out: &mut String) {
        out.push_str(&self.whitespace);
        for comment in &self.comments {
            comment.print_to(out);
        }
    }

    /// Whitespace after the last comment, or the leading whitespace if there are none
    pub fn last_whitespace(&self) -> &str {
        self.comments
            .last()
            .map(|c| c.suffix.as_str())
            .unwrap_or(&self.whitespace)
    }

    pub fn with_whitespace(&self, whitespace: impl Into<String>) -> Self {
        Self {
            whitespace: whitespace.into(),
            comments: self.comments.clone(),
        }
    }

    pub fn with_comments(&self, comments: Vec<Comment>) -> Self {
        Self {
            whitespace: self.whitespace.clone(),
            comments,
        }
    }
}

impl Comment {
    pub fn new(multiline: bool, text: impl Into<String>) -> Self {
        Self {
            multiline,
            text: text.into(),
            suffix: String::new(),
            markers: Markers::default(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn print_to(&self, out: &mut String) {
        if self.multiline {
            out.push_str("/*");
            out.push_str(&self.text);
            out.push_str("*/");
        } else {
            out.push_str("//");
            out.push_str(&self.text);
        }
        out.push_str(&self.suffix);
    }
}
