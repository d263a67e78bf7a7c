use crate::error::Result;
use crate::parser::cursor::TokenCursor;
use crate::parser::lexer::Lexer;
use crate::parser::lexer::token::TokenKind;
use crate::reflect::{ReflectionClass, ReflectionFunction};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

mod definitions;
mod expr;
mod stmt;

/// Single-pass parser recognizing the declaration subset of PHP: namespaces,
/// use aliases, class/interface/trait/function declarations and their
/// members. Statement bodies are skipped, balanced but unparsed.
///
/// Entry points reset all per-parse state; results stay available until the
/// next parse or `clear`.
pub struct Parser {
    classes: IndexMap<String, Rc<ReflectionClass>>,
    functions: IndexMap<String, Rc<ReflectionFunction>>,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            classes: IndexMap::new(),
            functions: IndexMap::new(),
        }
    }

    /// Parses a file. On error nothing from the file is recorded.
    pub fn parse_file(&mut self, filename: impl AsRef<Path>) -> Result<()> {
        let filename = filename.as_ref();
        let contents = fs::read(filename)?;
        self.parse(&contents, Some(filename.to_path_buf()))
    }

    /// Parses an in-memory buffer with no associated path; `__FILE__`
    /// reports a fixed placeholder.
    pub fn parse_source(&mut self, source: &str) -> Result<()> {
        self.parse(source.as_bytes(), None)
    }

    fn parse(&mut self, source: &[u8], filename: Option<PathBuf>) -> Result<()> {
        self.clear();
        let tokens = Lexer::new(source).tokenize();
        let mut session = Session {
            cursor: TokenCursor::new(source, tokens, filename),
            namespace: String::new(),
            aliases: IndexMap::new(),
            classes: IndexMap::new(),
            functions: IndexMap::new(),
            class_name: String::new(),
            trait_name: String::new(),
            method_name: String::new(),
            function_name: String::new(),
        };
        session.run()?;
        self.classes = session.classes;
        self.functions = session.functions;
        Ok(())
    }

    /// Class-like entities found by the last parse, keyed by FQN in
    /// declaration order.
    pub fn classes(&self) -> &IndexMap<String, Rc<ReflectionClass>> {
        &self.classes
    }

    /// Functions found by the last parse, keyed by FQN.
    pub fn functions(&self) -> &IndexMap<String, Rc<ReflectionFunction>> {
        &self.functions
    }

    pub fn into_entities(
        self,
    ) -> (
        IndexMap<String, Rc<ReflectionClass>>,
        IndexMap<String, Rc<ReflectionFunction>>,
    ) {
        (self.classes, self.functions)
    }

    pub fn clear(&mut self) {
        self.classes = IndexMap::new();
        self.functions = IndexMap::new();
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Control flow out of a top-level statement: a halt directive deliberately
/// aborts the rest of the file, keeping everything parsed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    Continue,
    Halt,
}

/// Per-parse state. Dropped when the parse finishes; accumulators move back
/// into the `Parser` only on success.
pub(super) struct Session<'src> {
    pub(super) cursor: TokenCursor<'src>,
    pub(super) namespace: String,
    /// Alias -> fully-qualified name, scoped to the remainder of the file.
    pub(super) aliases: IndexMap<String, String>,
    pub(super) classes: IndexMap<String, Rc<ReflectionClass>>,
    pub(super) functions: IndexMap<String, Rc<ReflectionFunction>>,
    pub(super) class_name: String,
    pub(super) trait_name: String,
    pub(super) method_name: String,
    pub(super) function_name: String,
}

impl<'src> Session<'src> {
    fn run(&mut self) -> Result<()> {
        self.template()?;
        if !self.cursor.at_eof() {
            self.code()?;
        }
        Ok(())
    }

    /// Skips raw markup, including `<?= ... ?>` echo sections.
    fn template(&mut self) -> Result<()> {
        loop {
            match self.cursor.kind() {
                TokenKind::InlineHtml => self.cursor.advance(),
                TokenKind::OpenTagEcho => {
                    loop {
                        self.cursor.advance();
                        if self.cursor.at_eof() || self.cursor.kind() == TokenKind::CloseTag {
                            break;
                        }
                    }
                    if !self.cursor.at_eof() {
                        self.cursor.expect(TokenKind::CloseTag)?;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn code(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::OpenTag)?;
        while !self.cursor.at_eof() {
            if self.top_statement()? == Flow::Halt {
                break;
            }
        }
        Ok(())
    }

    fn top_statement(&mut self) -> Result<Flow> {
        match self.cursor.kind() {
            TokenKind::Use => self.use_statement()?,
            TokenKind::Abstract | TokenKind::Final | TokenKind::Class => {
                self.class_declaration()?
            }
            TokenKind::Interface => self.interface_declaration()?,
            TokenKind::Trait => self.trait_declaration()?,
            TokenKind::CloseTag => {
                self.cursor.advance();
                self.template()?;
                if !self.cursor.at_eof() {
                    self.cursor.expect(TokenKind::OpenTag)?;
                }
            }
            TokenKind::HaltCompiler => {
                self.cursor.expect(TokenKind::HaltCompiler)?;
                self.cursor.expect(TokenKind::OpenParen)?;
                self.cursor.expect(TokenKind::CloseParen)?;
                if !self.cursor.eat(TokenKind::CloseTag) {
                    self.cursor.expect(TokenKind::SemiColon)?;
                }
                return Ok(Flow::Halt);
            }
            TokenKind::Function
                if self
                    .cursor
                    .is_lookahead(TokenKind::Identifier, Some(TokenKind::Ampersand)) =>
            {
                // Only a named declaration; otherwise it is an anonymous
                // function expression inside a statement.
                self.function_declaration()?
            }
            TokenKind::Namespace
                if !self.cursor.is_lookahead(TokenKind::NsSeparator, None) =>
            {
                return self.namespace_statement();
            }
            _ => self.statement()?,
        }
        Ok(Flow::Continue)
    }

    /// `;` or an implicit terminator through `?>` markup back to `<?php`.
    pub(super) fn match_end_statement(&mut self) -> Result<()> {
        if self.cursor.eat(TokenKind::CloseTag) {
            self.template()?;
            if !self.cursor.at_eof() {
                self.cursor.expect(TokenKind::OpenTag)?;
            }
            Ok(())
        } else {
            self.cursor.expect(TokenKind::SemiColon)?;
            Ok(())
        }
    }

    pub(super) fn prefix_namespace(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }

    /// Resolves a possibly-relative name: the alias table wins on an exact
    /// first-segment match, a `namespace\` prefix is always relative to the
    /// current namespace, a leading `\` means already fully qualified.
    pub(super) fn qualified_name(&mut self) -> Result<String> {
        match self.cursor.kind() {
            TokenKind::Namespace => {
                self.cursor.advance();
                let mut full = self.namespace.clone();
                loop {
                    self.cursor.expect(TokenKind::NsSeparator)?;
                    let base = self.cursor.expect(TokenKind::Identifier)?;
                    if !full.is_empty() {
                        full.push('\\');
                    }
                    full.push_str(&base);
                    if self.cursor.kind() != TokenKind::NsSeparator {
                        break;
                    }
                }
                Ok(full)
            }
            TokenKind::Identifier => {
                let first = self.cursor.expect(TokenKind::Identifier)?;
                let mut full = match self.aliases.get(&first) {
                    Some(target) => target.clone(),
                    None => self.prefix_namespace(&first),
                };
                while self.cursor.eat(TokenKind::NsSeparator) {
                    let base = self.cursor.expect(TokenKind::Identifier)?;
                    full.push('\\');
                    full.push_str(&base);
                }
                Ok(full)
            }
            TokenKind::NsSeparator => {
                let mut full = String::new();
                loop {
                    self.cursor.expect(TokenKind::NsSeparator)?;
                    let base = self.cursor.expect(TokenKind::Identifier)?;
                    if !full.is_empty() {
                        full.push('\\');
                    }
                    full.push_str(&base);
                    if self.cursor.kind() != TokenKind::NsSeparator {
                        break;
                    }
                }
                Ok(full)
            }
            _ => Err(self.cursor.expected("identifier")),
        }
    }

    /// A name taken literally, without alias or namespace resolution; used
    /// by `use` and `namespace` statements. Returns `(path, last segment)`.
    pub(super) fn fully_qualified_name(&mut self) -> Result<(String, String)> {
        self.cursor.eat(TokenKind::NsSeparator);
        let mut base = self.cursor.expect(TokenKind::Identifier)?;
        let mut path = base.clone();
        while self.cursor.eat(TokenKind::NsSeparator) {
            base = self.cursor.expect(TokenKind::Identifier)?;
            path.push('\\');
            path.push_str(&base);
        }
        Ok((path, base))
    }

    fn use_statement(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::Use)?;

        // `use function` / `use const` imports do not affect class names.
        if matches!(self.cursor.kind(), TokenKind::Const | TokenKind::Function) {
            while !self.cursor.at_eof() && self.cursor.kind() != TokenKind::SemiColon {
                self.cursor.advance();
            }
            return self.match_end_statement();
        }

        loop {
            let (path, mut alias) = self.fully_qualified_name()?;
            if self.cursor.eat(TokenKind::As) {
                alias = self.cursor.expect(TokenKind::Identifier)?;
            }
            self.aliases.insert(alias, path);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.match_end_statement()
    }

    /// `namespace X;`, `namespace X { }` or the global `namespace { }` form;
    /// braced forms restore the enclosing prefix afterwards.
    fn namespace_statement(&mut self) -> Result<Flow> {
        self.cursor.expect(TokenKind::Namespace)?;

        if self.cursor.kind() != TokenKind::OpenBrace {
            let (name, _) = self.fully_qualified_name()?;
            if self.cursor.eat(TokenKind::OpenBrace) {
                let saved = std::mem::replace(&mut self.namespace, name);
                let flow = self.namespace_block(saved)?;
                return Ok(flow);
            }
            self.namespace = name;
            self.match_end_statement()?;
            return Ok(Flow::Continue);
        }

        self.cursor.expect(TokenKind::OpenBrace)?;
        let saved = std::mem::take(&mut self.namespace);
        self.namespace_block(saved)
    }

    fn namespace_block(&mut self, saved: String) -> Result<Flow> {
        while !self.cursor.at_eof() && self.cursor.kind() != TokenKind::CloseBrace {
            if self.top_statement()? == Flow::Halt {
                self.namespace = saved;
                return Ok(Flow::Halt);
            }
        }
        let result = self.cursor.expect(TokenKind::CloseBrace);
        self.namespace = saved;
        result.map(|_| Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_reset_state_between_parses() {
        let mut parser = Parser::new();
        parser.parse_source("<?php class A {}").unwrap();
        assert!(parser.classes().contains_key("A"));
        parser.parse_source("<?php class B {}").unwrap();
        assert!(!parser.classes().contains_key("A"));
        assert!(parser.classes().contains_key("B"));
    }

    #[test]
    fn failed_parse_records_nothing() {
        let mut parser = Parser::new();
        let err = parser.parse_source("<?php class A {} class {").unwrap_err();
        assert!(err.to_string().contains("Expected identifier"));
        assert!(parser.classes().is_empty());
    }
}
