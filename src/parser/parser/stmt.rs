use crate::error::Result;
use crate::parser::lexer::token::TokenKind;
use crate::parser::parser::Session;

/// Statement skipping. Control constructs are recognized just enough to
/// balance their conditions and bodies, in both brace and alternative
/// (`: ... end*`) syntax; their contents are never parsed.
impl Session<'_> {
    pub(super) fn statement(&mut self) -> Result<()> {
        match self.cursor.kind() {
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.conditional_statement(TokenKind::EndWhile),
            TokenKind::For => self.conditional_statement(TokenKind::EndFor),
            TokenKind::Foreach => self.conditional_statement(TokenKind::EndForeach),
            TokenKind::Declare => self.conditional_statement(TokenKind::EndDeclare),
            TokenKind::Do => self.do_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Try => self.try_statement(),
            TokenKind::OpenBrace => self.block(),
            TokenKind::SemiColon => {
                self.cursor.advance();
                Ok(())
            }
            TokenKind::CloseTag => self.end_of_code_section(),
            _ => self.expression_statement(),
        }
    }

    /// A brace-delimited statement block, recursing per statement.
    pub(super) fn block(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::OpenBrace)?;
        while self.cursor.kind() != TokenKind::CloseBrace {
            if self.cursor.at_eof() {
                return Err(self.cursor.expected("'}'"));
            }
            self.statement()?;
        }
        self.cursor.expect(TokenKind::CloseBrace)?;
        Ok(())
    }

    /// Balances one parenthesized condition without looking inside it.
    fn condition(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::OpenParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.cursor.kind() {
                TokenKind::Eof => return Err(self.cursor.expected("')'")),
                TokenKind::OpenParen => {
                    depth += 1;
                    self.cursor.advance();
                }
                TokenKind::CloseParen => {
                    depth -= 1;
                    self.cursor.advance();
                }
                _ => self.cursor.advance(),
            }
        }
        Ok(())
    }

    fn if_statement(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::If)?;
        self.condition()?;

        if self.cursor.eat(TokenKind::Colon) {
            loop {
                self.alternative_block(&[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf])?;
                match self.cursor.kind() {
                    TokenKind::ElseIf => {
                        self.cursor.advance();
                        self.condition()?;
                        self.cursor.expect(TokenKind::Colon)?;
                    }
                    TokenKind::Else => {
                        self.cursor.advance();
                        self.cursor.expect(TokenKind::Colon)?;
                    }
                    _ => break,
                }
            }
            self.cursor.expect(TokenKind::EndIf)?;
            self.match_end_statement()
        } else {
            self.statement()?;
            loop {
                match self.cursor.kind() {
                    TokenKind::ElseIf => {
                        self.cursor.advance();
                        self.condition()?;
                        self.statement()?;
                    }
                    // `else if` chains through the recursive statement.
                    TokenKind::Else => {
                        self.cursor.advance();
                        self.statement()?;
                    }
                    _ => break,
                }
            }
            Ok(())
        }
    }

    /// `while`/`for`/`foreach`/`declare`: a condition followed by either a
    /// single statement or an alternative block closed by `end`.
    fn conditional_statement(&mut self, end: TokenKind) -> Result<()> {
        self.cursor.advance();
        self.condition()?;
        if self.cursor.eat(TokenKind::Colon) {
            self.alternative_block(&[end])?;
            self.cursor.advance();
            self.match_end_statement()
        } else {
            self.statement()
        }
    }

    fn do_statement(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::Do)?;
        self.statement()?;
        self.cursor.expect(TokenKind::While)?;
        self.condition()?;
        self.match_end_statement()
    }

    fn switch_statement(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::Switch)?;
        self.condition()?;
        if self.cursor.eat(TokenKind::Colon) {
            self.alternative_block(&[TokenKind::EndSwitch])?;
            self.cursor.advance();
            self.match_end_statement()
        } else {
            self.block()
        }
    }

    fn try_statement(&mut self) -> Result<()> {
        self.cursor.expect(TokenKind::Try)?;
        self.block()?;
        loop {
            match self.cursor.kind() {
                TokenKind::Catch => {
                    self.cursor.advance();
                    self.condition()?;
                    self.block()?;
                }
                TokenKind::Finally => {
                    self.cursor.advance();
                    self.block()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skips statements until one of `terminators` appears at this nesting
    /// level; nested constructs are consumed by the recursion.
    fn alternative_block(&mut self, terminators: &[TokenKind]) -> Result<()> {
        loop {
            if terminators.contains(&self.cursor.kind()) {
                return Ok(());
            }
            if self.cursor.at_eof() {
                return Err(self.cursor.expected(terminators[0].describe()));
            }
            self.statement()?;
        }
    }

    /// Anything unstructured: consumed up to the terminating `;` (or `?>`,
    /// or a `}` belonging to the enclosing block), with brace, paren and
    /// bracket nesting balanced along the way.
    fn expression_statement(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.cursor.kind() {
                TokenKind::Eof => {
                    // A final statement may legally end at end of input.
                    if depth > 0 {
                        return Err(self.cursor.expected("';'"));
                    }
                    return Ok(());
                }
                TokenKind::SemiColon if depth == 0 => {
                    self.cursor.advance();
                    return Ok(());
                }
                TokenKind::CloseBrace if depth == 0 => return Ok(()),
                TokenKind::CloseTag if depth == 0 => return self.end_of_code_section(),
                TokenKind::OpenBrace | TokenKind::OpenParen | TokenKind::OpenBracket => {
                    depth += 1;
                    self.cursor.advance();
                }
                TokenKind::CloseBrace | TokenKind::CloseParen | TokenKind::CloseBracket => {
                    depth = match depth.checked_sub(1) {
                        Some(depth) => depth,
                        None => return Err(self.cursor.expected("';'")),
                    };
                    self.cursor.advance();
                }
                _ => self.cursor.advance(),
            }
        }
    }

    /// `?>` terminates the statement; raw markup runs until the next open
    /// tag (or end of input).
    fn end_of_code_section(&mut self) -> Result<()> {
        self.cursor.advance();
        self.template()?;
        if !self.cursor.at_eof() {
            self.cursor.expect(TokenKind::OpenTag)?;
        }
        Ok(())
    }
}
