//! Self-hosted folding of constant scalar expressions.
//!
//! Snippets produced by the scalar expression reader (and re-produced after
//! placeholder substitution) are re-lexed in expression mode, parsed into a
//! small expression tree and evaluated with PHP's type juggling rules.
//! Nothing here executes user code.

use crate::parser::lexer::Lexer;
use crate::parser::lexer::token::{Token, TokenKind};
use crate::value::{ArrayKey, ArrayValue, Value};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Or,
    And,
    Xor,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Shl,
    Shr,
    Add,
    Sub,
    Concat,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug)]
enum Node {
    Lit(Value),
    Array(Vec<(Option<Node>, Node)>),
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    /// `cond ? then : else`; a `None` branch is the short `?:` form.
    Ternary(Box<Node>, Option<Box<Node>>, Box<Node>),
}

/// Folds a scalar expression snippet to its value.
pub(crate) fn fold(snippet: &str) -> Result<Value, String> {
    let tokens = Lexer::new_expression(snippet.as_bytes()).tokenize();
    let mut parser = FoldParser {
        source: snippet.as_bytes(),
        tokens,
        pos: 0,
    };
    let node = parser.parse_expr(0)?;
    parser.skip_trivia();
    if parser.kind() != TokenKind::Eof {
        return Err(format!(
            "Unexpected {} in scalar expression",
            parser.kind().describe()
        ));
    }
    eval(&node)
}

struct FoldParser<'src> {
    source: &'src [u8],
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> FoldParser<'src> {
    fn skip_trivia(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind.is_trivia())
        {
            self.pos += 1;
        }
    }

    fn kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn text(&self) -> &'src [u8] {
        self.tokens
            .get(self.pos)
            .map(|t| t.text(self.source))
            .unwrap_or_default()
    }

    fn bump(&mut self) {
        self.pos += 1;
        self.skip_trivia();
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), String> {
        if self.kind() != kind {
            return Err(format!(
                "Expected {} but got {}",
                kind.describe(),
                self.kind().describe()
            ));
        }
        self.bump();
        Ok(())
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Node, String> {
        self.skip_trivia();
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some((op, lbp, rbp)) = infix_binding(self.kind()) else {
                break;
            };
            if lbp < min_bp {
                break;
            }

            if op == TERNARY {
                self.bump();
                let then_branch = if self.kind() == TokenKind::Colon {
                    None
                } else {
                    Some(Box::new(self.parse_expr(0)?))
                };
                self.expect(TokenKind::Colon)?;
                let else_branch = self.parse_expr(rbp)?;
                lhs = Node::Ternary(Box::new(lhs), then_branch, Box::new(else_branch));
                continue;
            }

            self.bump();
            let rhs = self.parse_expr(rbp)?;
            lhs = Node::Binary(binary_op(op), Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Node, String> {
        match self.kind() {
            TokenKind::LNumber => {
                let value = decode_int_literal(&String::from_utf8_lossy(self.text()))?;
                self.bump();
                Ok(Node::Lit(value))
            }
            TokenKind::DNumber => {
                let text = String::from_utf8_lossy(self.text()).replace('_', "");
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("Malformed float literal {}", text))?;
                self.bump();
                Ok(Node::Lit(Value::Float(value)))
            }
            TokenKind::StringLiteral => {
                let text = String::from_utf8_lossy(self.text()).into_owned();
                self.bump();
                Ok(Node::Lit(Value::String(decode_string_literal(&text)?)))
            }
            TokenKind::StartHeredoc => self.parse_heredoc(),
            TokenKind::TypeTrue => {
                self.bump();
                Ok(Node::Lit(Value::Bool(true)))
            }
            TokenKind::TypeFalse => {
                self.bump();
                Ok(Node::Lit(Value::Bool(false)))
            }
            TokenKind::TypeNull => {
                self.bump();
                Ok(Node::Lit(Value::Null))
            }
            TokenKind::Identifier => {
                // INF/NAN reach us through substituted float literals.
                let text = String::from_utf8_lossy(self.text()).to_ascii_uppercase();
                let value = match text.as_str() {
                    "INF" => Value::Float(f64::INFINITY),
                    "NAN" => Value::Float(f64::NAN),
                    _ => return Err(format!("Unexpected identifier {}", text)),
                };
                self.bump();
                Ok(Node::Lit(value))
            }
            TokenKind::Minus => {
                self.bump();
                Ok(Node::Unary(UnaryOp::Neg, Box::new(self.parse_expr(19)?)))
            }
            TokenKind::Plus => {
                self.bump();
                Ok(Node::Unary(UnaryOp::Plus, Box::new(self.parse_expr(19)?)))
            }
            TokenKind::BitNot => {
                self.bump();
                Ok(Node::Unary(UnaryOp::BitNot, Box::new(self.parse_expr(19)?)))
            }
            TokenKind::Bang => {
                self.bump();
                Ok(Node::Unary(UnaryOp::Not, Box::new(self.parse_expr(17)?)))
            }
            TokenKind::OpenParen => {
                self.bump();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::CloseParen)?;
                Ok(inner)
            }
            TokenKind::Array => {
                self.bump();
                self.expect(TokenKind::OpenParen)?;
                self.parse_array_items(TokenKind::CloseParen)
            }
            TokenKind::OpenBracket => {
                self.bump();
                self.parse_array_items(TokenKind::CloseBracket)
            }
            other => Err(format!(
                "Unexpected {} in scalar expression",
                other.describe()
            )),
        }
    }

    fn parse_array_items(&mut self, terminator: TokenKind) -> Result<Node, String> {
        let mut items = Vec::new();
        while self.kind() != terminator {
            let first = self.parse_expr(0)?;
            if self.kind() == TokenKind::DoubleArrow {
                self.bump();
                let value = self.parse_expr(0)?;
                items.push((Some(first), value));
            } else {
                items.push((None, first));
            }
            if self.kind() == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(terminator)?;
        Ok(Node::Array(items))
    }

    fn parse_heredoc(&mut self) -> Result<Node, String> {
        let start_text = String::from_utf8_lossy(self.text()).into_owned();
        let is_nowdoc = start_text.contains('\'');
        self.bump();

        let mut content = String::new();
        if self.kind() == TokenKind::EncapsedAndWhitespace {
            content = String::from_utf8_lossy(self.text()).into_owned();
            self.bump();
        }
        self.expect(TokenKind::EndHeredoc)?;

        // The newline before the closing label is not part of the body.
        if content.ends_with('\n') {
            content.pop();
            if content.ends_with('\r') {
                content.pop();
            }
        }

        let decoded = if is_nowdoc {
            content
        } else {
            decode_escapes(&content, false)
        };
        Ok(Node::Lit(Value::String(decoded)))
    }
}

/// Marker for the ternary pseudo-operator in the binding table.
const TERNARY: u8 = u8::MAX;

/// Returns `(op-id, left-bp, right-bp)` for infix tokens, following PHP's
/// precedence table. `op-id` indexes `binary_op`, except `TERNARY`.
fn infix_binding(kind: TokenKind) -> Option<(u8, u8, u8)> {
    let entry = match kind {
        TokenKind::LogicalOr => (0, 1, 2),
        TokenKind::LogicalXor => (1, 2, 3),
        TokenKind::LogicalAnd => (2, 3, 4),
        TokenKind::Question => (TERNARY, 5, 5),
        TokenKind::PipePipe => (3, 7, 8),
        TokenKind::AmpersandAmpersand => (4, 8, 9),
        TokenKind::Pipe => (5, 9, 10),
        TokenKind::Caret => (6, 10, 11),
        TokenKind::Ampersand => (7, 11, 12),
        TokenKind::EqEq => (8, 12, 13),
        TokenKind::BangEq => (9, 12, 13),
        TokenKind::EqEqEq => (10, 12, 13),
        TokenKind::BangEqEq => (11, 12, 13),
        TokenKind::Lt => (12, 13, 14),
        TokenKind::LtEq => (13, 13, 14),
        TokenKind::Gt => (14, 13, 14),
        TokenKind::GtEq => (15, 13, 14),
        TokenKind::Sl => (16, 14, 15),
        TokenKind::Sr => (17, 14, 15),
        TokenKind::Plus => (18, 15, 16),
        TokenKind::Minus => (19, 15, 16),
        TokenKind::Dot => (20, 15, 16),
        TokenKind::Asterisk => (21, 16, 17),
        TokenKind::Slash => (22, 16, 17),
        TokenKind::Percent => (23, 16, 17),
        TokenKind::Pow => (24, 20, 20),
        _ => return None,
    };
    Some(entry)
}

fn binary_op(id: u8) -> BinaryOp {
    match id {
        0 => BinaryOp::Or,
        1 => BinaryOp::Xor,
        2 => BinaryOp::And,
        3 => BinaryOp::Or,
        4 => BinaryOp::And,
        5 => BinaryOp::BitOr,
        6 => BinaryOp::BitXor,
        7 => BinaryOp::BitAnd,
        8 => BinaryOp::Equal,
        9 => BinaryOp::NotEqual,
        10 => BinaryOp::Identical,
        11 => BinaryOp::NotIdentical,
        12 => BinaryOp::Less,
        13 => BinaryOp::LessEqual,
        14 => BinaryOp::Greater,
        15 => BinaryOp::GreaterEqual,
        16 => BinaryOp::Shl,
        17 => BinaryOp::Shr,
        18 => BinaryOp::Add,
        19 => BinaryOp::Sub,
        20 => BinaryOp::Concat,
        21 => BinaryOp::Mul,
        22 => BinaryOp::Div,
        23 => BinaryOp::Mod,
        24 => BinaryOp::Pow,
        _ => unreachable!(),
    }
}

fn eval(node: &Node) -> Result<Value, String> {
    match node {
        Node::Lit(value) => Ok(value.clone()),
        Node::Array(items) => {
            let mut map = ArrayValue::new();
            let mut next_index: i64 = 0;
            for (key, value) in items {
                let value = eval(value)?;
                let key = match key {
                    Some(key) => ArrayKey::from_value(&eval(key)?),
                    None => {
                        let key = ArrayKey::Int(next_index);
                        next_index += 1;
                        key
                    }
                };
                if let ArrayKey::Int(i) = key
                    && i >= next_index
                {
                    next_index = i + 1;
                }
                map.insert(key, value);
            }
            Ok(Value::Array(Rc::new(map)))
        }
        Node::Unary(op, operand) => {
            let value = eval(operand)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.to_bool()),
                UnaryOp::Neg => match to_number(&value) {
                    Value::Int(i) => match i.checked_neg() {
                        Some(n) => Value::Int(n),
                        None => Value::Float(-(i as f64)),
                    },
                    other => Value::Float(-other.to_float()),
                },
                UnaryOp::Plus => to_number(&value),
                UnaryOp::BitNot => Value::Int(!value.to_int()),
            })
        }
        Node::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs),
        Node::Ternary(cond, then_branch, else_branch) => {
            let cond = eval(cond)?;
            if cond.to_bool() {
                match then_branch {
                    Some(node) => eval(node),
                    None => Ok(cond),
                }
            } else {
                eval(else_branch)
            }
        }
    }
}

fn eval_binary(op: BinaryOp, lhs: &Node, rhs: &Node) -> Result<Value, String> {
    // Short-circuit forms first.
    match op {
        BinaryOp::And => {
            let a = eval(lhs)?;
            if !a.to_bool() {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(eval(rhs)?.to_bool()));
        }
        BinaryOp::Or => {
            let a = eval(lhs)?;
            if a.to_bool() {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(eval(rhs)?.to_bool()));
        }
        _ => {}
    }

    let a = eval(lhs)?;
    let b = eval(rhs)?;

    let value = match op {
        BinaryOp::And | BinaryOp::Or => unreachable!(),
        BinaryOp::Xor => Value::Bool(a.to_bool() ^ b.to_bool()),
        BinaryOp::BitOr => Value::Int(a.to_int() | b.to_int()),
        BinaryOp::BitXor => Value::Int(a.to_int() ^ b.to_int()),
        BinaryOp::BitAnd => Value::Int(a.to_int() & b.to_int()),
        BinaryOp::Equal => Value::Bool(a.loose_equals(&b)),
        BinaryOp::NotEqual => Value::Bool(!a.loose_equals(&b)),
        BinaryOp::Identical => Value::Bool(a.identical(&b)),
        BinaryOp::NotIdentical => Value::Bool(!a.identical(&b)),
        BinaryOp::Less => Value::Bool(a.compare(&b) == std::cmp::Ordering::Less),
        BinaryOp::LessEqual => Value::Bool(a.compare(&b) != std::cmp::Ordering::Greater),
        BinaryOp::Greater => Value::Bool(a.compare(&b) == std::cmp::Ordering::Greater),
        BinaryOp::GreaterEqual => Value::Bool(a.compare(&b) != std::cmp::Ordering::Less),
        BinaryOp::Shl => {
            let shift = b.to_int();
            if shift < 0 {
                return Err("Bit shift by negative number".to_string());
            }
            if shift >= 64 {
                Value::Int(0)
            } else {
                Value::Int(a.to_int().wrapping_shl(shift as u32))
            }
        }
        BinaryOp::Shr => {
            let shift = b.to_int();
            if shift < 0 {
                return Err("Bit shift by negative number".to_string());
            }
            if shift >= 64 {
                Value::Int(if a.to_int() < 0 { -1 } else { 0 })
            } else {
                Value::Int(a.to_int() >> shift)
            }
        }
        BinaryOp::Concat => Value::String(a.to_php_string() + &b.to_php_string()),
        BinaryOp::Add => {
            if let (Value::Array(x), Value::Array(y)) = (&a, &b) {
                // Array union: left operand wins on key clashes.
                let mut merged = (**x).clone();
                for (k, v) in y.iter() {
                    merged.entry(k.clone()).or_insert_with(|| v.clone());
                }
                Value::Array(Rc::new(merged))
            } else {
                arith(&a, &b, i64::checked_add, |x, y| x + y)
            }
        }
        BinaryOp::Sub => arith(&a, &b, i64::checked_sub, |x, y| x - y),
        BinaryOp::Mul => arith(&a, &b, i64::checked_mul, |x, y| x * y),
        BinaryOp::Div => {
            if b.to_float() == 0.0 {
                return Err("Division by zero".to_string());
            }
            match (is_int_operand(&a), is_int_operand(&b)) {
                (true, true) => {
                    let (x, y) = (a.to_int(), b.to_int());
                    if x % y == 0 {
                        Value::Int(x / y)
                    } else {
                        Value::Float(x as f64 / y as f64)
                    }
                }
                _ => Value::Float(a.to_float() / b.to_float()),
            }
        }
        BinaryOp::Mod => {
            let y = b.to_int();
            if y == 0 {
                return Err("Modulo by zero".to_string());
            }
            Value::Int(a.to_int().wrapping_rem(y))
        }
        BinaryOp::Pow => {
            let exp = b.to_int();
            if is_int_operand(&a) && is_int_operand(&b) && exp >= 0 {
                match u32::try_from(exp)
                    .ok()
                    .and_then(|e| a.to_int().checked_pow(e))
                {
                    Some(result) => Value::Int(result),
                    None => Value::Float(a.to_float().powf(b.to_float())),
                }
            } else {
                Value::Float(a.to_float().powf(b.to_float()))
            }
        }
    };
    Ok(value)
}

/// Whether the operand takes the integer path in arithmetic: anything but
/// an actual float (or float-valued numeric string).
fn is_int_operand(value: &Value) -> bool {
    !matches!(to_number(value), Value::Float(_))
}

fn to_number(value: &Value) -> Value {
    match value {
        Value::Int(i) => Value::Int(*i),
        Value::Float(f) => Value::Float(*f),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Value::Int(i)
            } else {
                Value::Float(trimmed.parse::<f64>().unwrap_or(0.0))
            }
        }
        other => Value::Int(other.to_int()),
    }
}

fn arith(
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    if is_int_operand(a) && is_int_operand(b) {
        match int_op(a.to_int(), b.to_int()) {
            Some(result) => Value::Int(result),
            // Integer overflow promotes to float.
            None => Value::Float(float_op(a.to_float(), b.to_float())),
        }
    } else {
        Value::Float(float_op(a.to_float(), b.to_float()))
    }
}

/// Decodes an integer literal (decimal, hex, octal or binary, with optional
/// digit separators). Values past i64 range become floats.
fn decode_int_literal(text: &str) -> Result<Value, String> {
    let text = text.replace('_', "");
    let (radix, digits) = if let Some(rest) = text.strip_prefix("0x").or(text.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = text.strip_prefix("0b").or(text.strip_prefix("0B")) {
        (2, rest)
    } else if text.len() > 1 && text.starts_with('0') {
        (8, &text[1..])
    } else {
        (10, text.as_str())
    };

    if digits.is_empty() {
        return if text == "0" {
            Ok(Value::Int(0))
        } else {
            Err(format!("Malformed integer literal {}", text))
        };
    }

    match i64::from_str_radix(digits, radix) {
        Ok(i) => Ok(Value::Int(i)),
        Err(_) => {
            let mut result = 0.0f64;
            for c in digits.chars() {
                let digit = c
                    .to_digit(radix)
                    .ok_or_else(|| format!("Malformed integer literal {}", text))?;
                result = result * radix as f64 + digit as f64;
            }
            Ok(Value::Float(result))
        }
    }
}

/// Decodes a quoted string literal, including the surrounding quotes.
fn decode_string_literal(text: &str) -> Result<String, String> {
    let mut chars = text.chars();
    let quote = chars
        .next()
        .ok_or_else(|| "Empty string literal".to_string())?;
    let inner: String = chars.collect();
    let inner = inner
        .strip_suffix(quote)
        .ok_or_else(|| "Unterminated string literal".to_string())?;
    Ok(decode_escapes(inner, quote == '\''))
}

/// Escape processing: single-quoted strings only unescape `\'` and `\\`;
/// double-quoted (and heredoc) bodies get the full set.
fn decode_escapes(inner: &str, single_quoted: bool) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(&next) = chars.peek() else {
            out.push('\\');
            break;
        };
        if single_quoted {
            if next == '\'' || next == '\\' {
                chars.next();
                out.push(next);
            } else {
                out.push('\\');
            }
            continue;
        }
        match next {
            'n' => {
                chars.next();
                out.push('\n');
            }
            't' => {
                chars.next();
                out.push('\t');
            }
            'r' => {
                chars.next();
                out.push('\r');
            }
            'v' => {
                chars.next();
                out.push('\u{b}');
            }
            'f' => {
                chars.next();
                out.push('\u{c}');
            }
            'e' => {
                chars.next();
                out.push('\u{1b}');
            }
            '\\' | '$' | '"' => {
                chars.next();
                out.push(next);
            }
            'x' => {
                chars.next();
                let mut code = 0u32;
                let mut seen = 0;
                while seen < 2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            chars.next();
                            code = code * 16 + d;
                            seen += 1;
                        }
                        None => break,
                    }
                }
                if seen == 0 {
                    out.push('\\');
                    out.push('x');
                } else {
                    out.push(code as u8 as char);
                }
            }
            '0'..='7' => {
                let mut code = 0u32;
                let mut seen = 0;
                while seen < 3 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            chars.next();
                            code = code * 8 + d;
                            seen += 1;
                        }
                        None => break,
                    }
                }
                out.push((code & 0xFF) as u8 as char);
            }
            _ => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold_ok(snippet: &str) -> Value {
        fold(snippet).expect(snippet)
    }

    #[test]
    fn folds_arithmetic_with_precedence() {
        assert_eq!(fold_ok("1 + 2 * 3"), Value::Int(7));
        assert_eq!(fold_ok("(1 + 2) * 3"), Value::Int(9));
        assert_eq!(fold_ok("7 / 2"), Value::Float(3.5));
        assert_eq!(fold_ok("6 / 2"), Value::Int(3));
        assert_eq!(fold_ok("2 ** 3 ** 2"), Value::Int(512));
        assert_eq!(fold_ok("-2 ** 2"), Value::Int(-4));
        assert_eq!(fold_ok("7 % 3"), Value::Int(1));
    }

    #[test]
    fn folds_string_concatenation() {
        assert_eq!(
            fold_ok("'foo' . \"bar\" . 1"),
            Value::String("foobar1".into())
        );
        assert_eq!(fold_ok("'a\\'b'"), Value::String("a'b".into()));
        assert_eq!(fold_ok("\"a\\tb\\n\""), Value::String("a\tb\n".into()));
    }

    #[test]
    fn folds_comparisons_and_logic() {
        assert_eq!(fold_ok("1 < 2 && 2 <= 2"), Value::Bool(true));
        assert_eq!(fold_ok("'1' == 1"), Value::Bool(true));
        assert_eq!(fold_ok("'1' === 1"), Value::Bool(false));
        assert_eq!(fold_ok("true and false or true"), Value::Bool(true));
        assert_eq!(fold_ok("true xor true"), Value::Bool(false));
        assert_eq!(fold_ok("!0"), Value::Bool(true));
    }

    #[test]
    fn folds_ternaries() {
        assert_eq!(fold_ok("1 ? 'a' : 'b'"), Value::String("a".into()));
        assert_eq!(fold_ok("0 ?: 'fallback'"), Value::String("fallback".into()));
        assert_eq!(fold_ok("'kept' ?: 'other'"), Value::String("kept".into()));
    }

    #[test]
    fn folds_arrays_with_php_key_rules() {
        let value = fold_ok("array (1, 'k' => 2, 5 => 3, 4, )");
        let Value::Array(map) = value else {
            panic!("expected array")
        };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                ArrayKey::Int(0),
                ArrayKey::Str("k".into()),
                ArrayKey::Int(5),
                ArrayKey::Int(6),
            ]
        );
    }

    #[test]
    fn folds_short_array_syntax() {
        let value = fold_ok("[1, [2, 3]]");
        let Value::Array(map) = value else {
            panic!("expected array")
        };
        assert_eq!(map.len(), 2);
        assert!(matches!(map.get(&ArrayKey::Int(1)), Some(Value::Array(_))));
    }

    #[test]
    fn folds_numeric_bases_and_overflow() {
        assert_eq!(fold_ok("0xFF"), Value::Int(255));
        assert_eq!(fold_ok("0b101"), Value::Int(5));
        assert_eq!(fold_ok("0777"), Value::Int(511));
        assert!(matches!(
            fold_ok("9223372036854775808"),
            Value::Float(f) if f > 9.2e18
        ));
        assert!(matches!(fold_ok("1 << 70"), Value::Int(0)));
    }

    #[test]
    fn folds_bitwise_operators() {
        assert_eq!(fold_ok("6 & 3"), Value::Int(2));
        assert_eq!(fold_ok("6 | 3"), Value::Int(7));
        assert_eq!(fold_ok("6 ^ 3"), Value::Int(5));
        assert_eq!(fold_ok("~0"), Value::Int(-1));
        assert_eq!(fold_ok("1 << 4"), Value::Int(16));
        assert_eq!(fold_ok("-16 >> 2"), Value::Int(-4));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(fold("1 / 0").is_err());
        assert!(fold("1 % 0").is_err());
        // The dead ternary branch is still evaluated lazily.
        assert_eq!(fold_ok("true ? 1 : 1 / 0"), Value::Int(1));
    }

    #[test]
    fn rejects_unsupported_constructs() {
        assert!(fold("1 +").is_err());
        assert!(fold("foo(1)").is_err());
        assert!(fold("$x + 1").is_err());
    }

    #[test]
    fn literal_printing_round_trips() {
        for snippet in ["array (0 => 1, 'k' => 'v\\'s', )", "1.5", "-3", "NULL"] {
            let value = fold_ok(snippet);
            assert_eq!(fold_ok(&value.php_literal()), value);
        }
    }
}
