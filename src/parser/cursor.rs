use crate::error::{Error, Result};
use crate::parser::lexer::token::{Token, TokenKind};
use std::path::{Path, PathBuf};

/// Cursor over a pre-tokenized source buffer.
///
/// `advance` steps between semantically significant tokens, skipping
/// comments while latching the most recent doc comment so the next
/// declaration parser can pick it up. End of input is the `Eof` sentinel
/// token, never an error.
pub struct TokenCursor<'src> {
    source: &'src [u8],
    tokens: Vec<Token>,
    /// Index of the next unread token; the current token sits behind it.
    pos: usize,
    current: Token,
    doc_comment: Option<String>,
    filename: Option<PathBuf>,
}

impl<'src> TokenCursor<'src> {
    pub fn new(source: &'src [u8], tokens: Vec<Token>, filename: Option<PathBuf>) -> Self {
        let mut cursor = Self {
            source,
            tokens,
            pos: 0,
            current: Token {
                kind: TokenKind::Eof,
                span: crate::parser::span::Span::default(),
            },
            doc_comment: None,
            filename,
        };
        cursor.advance();
        cursor
    }

    pub fn source(&self) -> &'src [u8] {
        self.source
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn kind(&self) -> TokenKind {
        self.current.kind
    }

    pub fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.current.text(self.source)).into_owned()
    }

    /// Doc comment latched while advancing onto the current token.
    pub fn doc_comment(&self) -> Option<String> {
        self.doc_comment.clone()
    }

    /// 1-based line of the current token.
    pub fn line(&self) -> usize {
        self.current.line(self.source)
    }

    pub fn advance(&mut self) {
        self.doc_comment = None;
        loop {
            let Some(token) = self.tokens.get(self.pos).copied() else {
                self.current = Token {
                    kind: TokenKind::Eof,
                    span: crate::parser::span::Span::new(self.source.len(), self.source.len()),
                };
                return;
            };
            self.pos += 1;
            if token.kind == TokenKind::DocComment {
                self.doc_comment =
                    Some(String::from_utf8_lossy(token.text(self.source)).into_owned());
            } else if !token.kind.is_trivia() {
                self.current = token;
                return;
            }
        }
    }

    /// Consumes the current token if it matches, returning its text.
    pub fn expect(&mut self, kind: TokenKind) -> Result<String> {
        if self.current.kind != kind {
            return Err(self.expected(kind.describe()));
        }
        let text = self.text();
        self.advance();
        Ok(text)
    }

    /// Consumes and returns the text when the current token matches.
    pub fn opt(&mut self, kind: TokenKind) -> Option<String> {
        if self.current.kind == kind {
            let text = self.text();
            self.advance();
            return Some(text);
        }
        None
    }

    /// Consumes the current token when it matches.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        self.opt(kind).is_some()
    }

    /// First token kind after the current one, skipping trivia and any kind
    /// in `skip`. Returns `Eof` when input runs out first.
    pub fn lookahead_skipping(&self, skip: &[TokenKind]) -> TokenKind {
        for token in &self.tokens[self.pos..] {
            if token.kind.is_trivia() || skip.contains(&token.kind) {
                continue;
            }
            return token.kind;
        }
        TokenKind::Eof
    }

    /// True when `expected` is found after the current token, skipping
    /// trivia and at most a run of `ignore` tokens.
    pub fn is_lookahead(&self, expected: TokenKind, ignore: Option<TokenKind>) -> bool {
        for token in &self.tokens[self.pos..] {
            if token.kind.is_trivia() {
                continue;
            }
            if token.kind == expected {
                return true;
            }
            if ignore != Some(token.kind) {
                return false;
            }
        }
        false
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            filename: self.filename.clone(),
            line: self.line(),
            message: message.into(),
        }
    }

    pub fn expected(&self, what: &str) -> Error {
        let actual = if self.at_eof() {
            "end of file".to_string()
        } else {
            self.text()
        };
        self.error(format!("Expected {} but got {}", what, actual))
    }
}
