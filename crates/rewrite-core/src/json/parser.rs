//! Lossless JSON parser
//!
//! Accepts standard JSON plus the relaxations commonly found in
//! configuration files: `//` and `/* */` comments, trailing commas, and
//! unquoted member keys. Every byte of input ends up in a prefix, a padding
//! space, a trailing-comma suffix, or a token, so printing the result
//! reproduces the input exactly.

use std::sync::Arc;

use crate::error::RewriteError;
use crate::result::Result;
use crate::source::{ParseError, SourceFile};
use crate::tree::{Marker, Markers, RightPadded, Space};

use super::tree::{Document, Empty, Identifier, Json, JsonArray, JsonObject, Literal, Member};

/// Parser entry points
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl JsonParser {
    /// Parse into a source file; unparseable input becomes a [`ParseError`] file
    pub fn parse(&self, source_path: &str, text: &str) -> SourceFile {
        match self.parse_document(source_path, text) {
            Ok(document) => SourceFile::Json(document),
            Err(err) => {
                tracing::debug!(source_path, error = %err, "JSON parse failed");
                let message = err.to_string();
                SourceFile::ParseError(Arc::new(ParseError::new(
                    source_path,
                    text,
                    Markers::new().add(Arc::new(Marker::parse_exception(
                        "JsonParser",
                        "ParseError",
                        message,
                    ))),
                )))
            }
        }
    }

    /// Parse, failing with [`RewriteError::ParseError`] on invalid input
    pub fn parse_document(&self, source_path: &str, text: &str) -> Result<Arc<Document>> {
        let mut scanner = Scanner {
            text,
            pos: 0,
            source_path,
        };
        let value = scanner.value()?;
        let eof = scanner.space()?;
        if scanner.pos < text.len() {
            return Err(scanner.error("expected end of input"));
        }
        tracing::trace!(source_path, len = text.len(), "parsed JSON document");
        Ok(Arc::new(Document::new(source_path, value, eof)))
    }
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    source_path: &'a str,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error(&self, message: &str) -> RewriteError {
        RewriteError::parse_error(self.source_path, self.pos, message)
    }

    fn expect(&mut self, token: char) -> Result<()> {
        if self.peek() == Some(token) {
            self.pos += token.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{token}'")))
        }
    }

    /// Whitespace and comments up to the next token
    fn space(&mut self) -> Result<Space> {
        let start = self.pos;
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if let Some(body) = trimmed.strip_prefix("//") {
                let end = body.find('\n').unwrap_or(body.len());
                self.pos += 2 + end;
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                let end = body
                    .find("*/")
                    .ok_or_else(|| self.error("unterminated block comment"))?;
                self.pos += 2 + end + 2;
            } else {
                break;
            }
        }
        Ok(Space::format(&self.text[start..self.pos]))
    }

    fn value(&mut self) -> Result<Json> {
        let prefix = self.space()?;
        self.value_with_prefix(prefix)
    }

    fn value_with_prefix(&mut self, prefix: Space) -> Result<Json> {
        match self.peek() {
            Some('{') => self.object(prefix),
            Some('[') => self.array(prefix),
            Some('"') => self.string(prefix),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(prefix),
            Some(_) => self.keyword(prefix),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self, prefix: Space) -> Result<Json> {
        self.expect('{')?;
        let members = self.separated('}', |scanner| scanner.member())?;
        self.expect('}')?;
        Ok(Json::Object(Arc::new(JsonObject::new(prefix, members))))
    }

    fn array(&mut self, prefix: Space) -> Result<Json> {
        self.expect('[')?;
        let values = self.separated(']', |scanner| scanner.value())?;
        self.expect(']')?;
        Ok(Json::Array(Arc::new(JsonArray::new(prefix, values))))
    }

    /// Elements up to (not including) `close`
    fn separated(
        &mut self,
        close: char,
        mut element: impl FnMut(&mut Self) -> Result<Json>,
    ) -> Result<Vec<RightPadded<Json>>> {
        let mut elements: Vec<RightPadded<Json>> = Vec::new();
        loop {
            let checkpoint = self.pos;
            let space = self.space()?;
            if self.peek() == Some(close) {
                match elements.last_mut() {
                    // Only reachable right after a comma: `[1, 2, ]`
                    Some(last) => {
                        last.markers = last
                            .markers
                            .add(Arc::new(Marker::trailing_comma(space)));
                    }
                    None => {
                        elements.push(RightPadded::build(Json::Empty(Arc::new(Empty::new(
                            space,
                        )))));
                    }
                }
                return Ok(elements);
            }

            self.pos = checkpoint;
            let value = element(self)?;
            let after = self.space()?;
            elements.push(RightPadded::new(value, after));

            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => return Ok(elements),
                _ => return Err(self.error(&format!("expected ',' or '{close}'"))),
            }
        }
    }

    fn member(&mut self) -> Result<Json> {
        let prefix = self.space()?;
        let key = match self.peek() {
            Some('"') => self.string(Space::EMPTY)?,
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                let name = self.identifier_text();
                Json::Identifier(Arc::new(Identifier::new(Space::EMPTY, name)))
            }
            _ => return Err(self.error("expected member key")),
        };
        let after_key = self.space()?;
        self.expect(':')?;
        let value = self.value()?;
        Ok(Json::Member(Arc::new(Member::new(
            prefix,
            RightPadded::new(key, after_key),
            value,
        ))))
    }

    fn identifier_text(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn string(&mut self, prefix: Space) -> Result<Json> {
        let start = self.pos;
        let mut escaped = false;
        let mut end = None;
        for (i, c) in self.rest().char_indices().skip(1) {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(i + 1);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| self.error("unterminated string"))?;
        self.pos += end;
        self.literal(prefix, start)
    }

    fn number(&mut self, prefix: Space) -> Result<Json> {
        let start = self.pos;
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        self.literal(prefix, start)
    }

    fn keyword(&mut self, prefix: Space) -> Result<Json> {
        let start = self.pos;
        let word = self.identifier_text();
        if !matches!(word, "true" | "false" | "null") {
            self.pos = start;
            return Err(self.error("unexpected token"));
        }
        self.literal(prefix, start)
    }

    fn literal(&mut self, prefix: Space, start: usize) -> Result<Json> {
        let source = &self.text[start..self.pos];
        let value: serde_json::Value = serde_json::from_str(source).map_err(|e| {
            RewriteError::parse_error(self.source_path, start, format!("invalid literal: {e}"))
        })?;
        Ok(Json::Literal(Arc::new(Literal::new(prefix, source, value))))
    }
}
