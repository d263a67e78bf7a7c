use crate::error::{Error, Result};
use crate::eval;
use crate::parser::lexer::token::TokenKind;
use crate::parser::parser::Session;
use crate::reflect::{ConstantValue, ScalarExpression};
use crate::value::Value;
use std::path::Path;
use std::rc::Rc;

/// Reported by `__FILE__` when parsing an in-memory buffer.
const NO_FILE: &str = "php shell code";

impl Session<'_> {
    /// Reads a constant scalar expression: literals, arrays, operators,
    /// ternaries, heredocs, magic constants and constant references.
    ///
    /// The expression is rendered into a textual template. Magic constants
    /// are resolved right away from parser context; references to class
    /// constants and global constants become positional placeholders. A
    /// template without placeholders folds to its value immediately,
    /// anything else is returned deferred.
    ///
    /// Stops at `;`, or at `,` / `)` / `]` outside any nesting the reader
    /// opened itself, so it terminates the same way inside array literals,
    /// parameter default lists and multi-declarator statements.
    pub(super) fn scalar_expression(&mut self) -> Result<ConstantValue> {
        let line = self.cursor.line();
        let mut template = String::new();
        let mut class_refs: Vec<(String, String)> = Vec::new();
        let mut const_refs: Vec<String> = Vec::new();
        let mut depth = 0usize;

        loop {
            match self.cursor.kind() {
                TokenKind::SemiColon | TokenKind::CloseTag | TokenKind::Eof => break,
                TokenKind::Comma | TokenKind::CloseParen | TokenKind::CloseBracket
                    if depth == 0 =>
                {
                    break;
                }
                TokenKind::OpenParen | TokenKind::OpenBracket => {
                    depth += 1;
                    template.push_str(&self.cursor.text());
                    template.push(' ');
                    self.cursor.advance();
                }
                TokenKind::CloseParen | TokenKind::CloseBracket => {
                    depth -= 1;
                    template.push_str(&self.cursor.text());
                    template.push(' ');
                    self.cursor.advance();
                }
                TokenKind::StartHeredoc => self.heredoc_text(&mut template)?,
                TokenKind::Identifier | TokenKind::NsSeparator | TokenKind::Namespace => {
                    self.constant_reference(&mut template, &mut class_refs, &mut const_refs)?;
                }
                TokenKind::Line => self.magic_constant(
                    &mut template,
                    Value::Int(self.cursor.line() as i64),
                ),
                TokenKind::File => {
                    let file = match self.cursor.filename() {
                        Some(path) => path.display().to_string(),
                        None => NO_FILE.to_string(),
                    };
                    self.magic_constant(&mut template, Value::String(file));
                }
                TokenKind::Dir => {
                    let dir = match self.cursor.filename().and_then(Path::parent) {
                        Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
                        _ => ".".to_string(),
                    };
                    self.magic_constant(&mut template, Value::String(dir));
                }
                TokenKind::ClassC => {
                    self.magic_constant(&mut template, Value::String(self.class_name.clone()))
                }
                TokenKind::TraitC => {
                    self.magic_constant(&mut template, Value::String(self.trait_name.clone()))
                }
                TokenKind::MethodC => {
                    self.magic_constant(&mut template, Value::String(self.method_name.clone()))
                }
                TokenKind::FuncC => self.magic_constant(
                    &mut template,
                    Value::String(self.function_name.clone()),
                ),
                TokenKind::NsC => {
                    self.magic_constant(&mut template, Value::String(self.namespace.clone()))
                }
                TokenKind::At => {
                    return Err(self.cursor.expected("scalar expression"));
                }
                TokenKind::StringLiteral if self.cursor.text().starts_with('`') => {
                    return Err(self.cursor.expected("scalar expression"));
                }
                TokenKind::Error => {
                    return Err(self
                        .cursor
                        .error(format!("Unexpected character {}", self.cursor.text())));
                }
                _ => {
                    template.push_str(&self.cursor.text());
                    template.push(' ');
                    self.cursor.advance();
                }
            }
        }

        if template.is_empty() {
            return Err(self.cursor.expected("scalar expression"));
        }

        if class_refs.is_empty() && const_refs.is_empty() {
            let value = eval::fold(&template).map_err(|message| Error::Syntax {
                filename: self.cursor.filename().map(Path::to_path_buf),
                line,
                message,
            })?;
            return Ok(ConstantValue::Value(value));
        }

        Ok(ConstantValue::Deferred(Rc::new(ScalarExpression::new(
            template, class_refs, const_refs,
        ))))
    }

    fn magic_constant(&mut self, template: &mut String, value: Value) {
        template.push_str(&value.php_literal());
        template.push(' ');
        self.cursor.advance();
    }

    /// `<<<LABEL ... LABEL`, captured verbatim into the template.
    fn heredoc_text(&mut self, template: &mut String) -> Result<()> {
        template.push_str(&self.cursor.text());
        self.cursor.advance();
        if self.cursor.kind() == TokenKind::EncapsedAndWhitespace {
            template.push_str(&self.cursor.text());
            self.cursor.advance();
        }
        let end = self.cursor.expect(TokenKind::EndHeredoc)?;
        template.push_str(&end);
        template.push(' ');
        Ok(())
    }

    /// Classifies a name inside a scalar expression.
    ///
    /// `self::CONST` refers to the class being parsed, captured now.
    /// `Name::class` folds to the resolved class name string right away.
    /// `Name::CONST` and bare / qualified constant names become deferred
    /// placeholders: `@N` for the N-th class constant reference, `` `N ``
    /// for the N-th global constant reference.
    fn constant_reference(
        &mut self,
        template: &mut String,
        class_refs: &mut Vec<(String, String)>,
        const_refs: &mut Vec<String>,
    ) -> Result<()> {
        let next = self.cursor.lookahead_skipping(&[]);

        let class_name = if self.cursor.kind() == TokenKind::Identifier
            && self.cursor.text().eq_ignore_ascii_case("self")
            && next == TokenKind::DoubleColon
        {
            if self.class_name.is_empty() {
                return Err(self.cursor.error("Cannot use self outside of a class"));
            }
            self.cursor.advance();
            self.class_name.clone()
        } else if self.cursor.kind() == TokenKind::Identifier
            && next != TokenKind::DoubleColon
            && next != TokenKind::NsSeparator
        {
            // A bare name; PHP falls back to the global constant table.
            let name = self.cursor.text();
            self.cursor.advance();
            template.push_str(&format!("`{} ", const_refs.len()));
            const_refs.push(name);
            return Ok(());
        } else {
            self.qualified_name()?
        };

        if self.cursor.kind() != TokenKind::DoubleColon {
            // A qualified constant name such as `Foo\BAR`.
            template.push_str(&format!("`{} ", const_refs.len()));
            const_refs.push(class_name);
            return Ok(());
        }
        self.cursor.advance();

        if self.cursor.kind() == TokenKind::Class {
            self.magic_constant(template, Value::String(class_name));
            return Ok(());
        }

        let constant = self.cursor.expect(TokenKind::Identifier)?;
        template.push_str(&format!("@{} ", class_refs.len()));
        class_refs.push((class_name, constant));
        Ok(())
    }
}
