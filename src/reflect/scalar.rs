use crate::error::{Error, Result};
use crate::eval;
use crate::reflect::factory::ReflectionFactory;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A constant expression that could not be folded at parse time because it
/// references constants defined elsewhere.
///
/// The textual template carries positional placeholders: `@N` for the N-th
/// class constant reference and `` `N `` for the N-th global constant
/// reference, in capture order. Evaluation substitutes each placeholder with
/// the literal-printed form of the resolved value and folds the result.
#[derive(Debug)]
pub struct ScalarExpression {
    template: String,
    class_refs: Vec<(String, String)>,
    const_refs: Vec<String>,
}

impl ScalarExpression {
    pub(crate) fn new(
        template: String,
        class_refs: Vec<(String, String)>,
        const_refs: Vec<String>,
    ) -> Self {
        Self {
            template,
            class_refs,
            const_refs,
        }
    }

    /// Referenced `(class, constant)` pairs, in placeholder order.
    pub fn class_references(&self) -> &[(String, String)] {
        &self.class_refs
    }

    /// Referenced global constant names, in placeholder order.
    pub fn global_constant_references(&self) -> &[String] {
        &self.const_refs
    }

    /// Resolves every reference through the factory, substitutes and folds.
    ///
    /// Resolving a class constant may recursively parse and resolve other
    /// classes through the factory.
    pub fn evaluate(&self, factory: &ReflectionFactory) -> Result<Value> {
        let mut class_values = Vec::with_capacity(self.class_refs.len());
        for (class_name, constant_name) in &self.class_refs {
            let class = factory.get_class(class_name)?;
            let value = class.get_constant(factory, constant_name)?.ok_or_else(|| {
                Error::Resolution(format!(
                    "Undefined constant {}::{}",
                    class_name, constant_name
                ))
            })?;
            class_values.push(value.php_literal());
        }

        let mut const_values = Vec::with_capacity(self.const_refs.len());
        for name in &self.const_refs {
            let value = factory
                .global_constant(name)
                .ok_or_else(|| Error::Resolution(format!("Undefined constant {}", name)))?;
            const_values.push(value.php_literal());
        }

        let snippet = substitute(&self.template, &class_values, &const_values)
            .map_err(Error::Resolution)?;
        eval::fold(&snippet).map_err(|message| Error::Syntax {
            filename: None,
            line: 0,
            message: format!(
                "{} evaluating scalar expression \"{}\"",
                message,
                snippet.trim_end()
            ),
        })
    }
}

/// Replaces `@N` / `` `N `` placeholders, leaving string literal and heredoc
/// contents untouched so body text can never masquerade as a placeholder.
fn substitute(
    template: &str,
    class_values: &[String],
    const_values: &[String],
) -> std::result::Result<String, String> {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                let start = i;
                i += 1;
                while i < bytes.len() {
                    let c = bytes[i];
                    if c == b'\\' {
                        i += 2;
                        continue;
                    }
                    i += 1;
                    if c == quote {
                        break;
                    }
                }
                let end = i.min(bytes.len());
                out.push_str(&template[start..end]);
            }
            b'<' if bytes[i..].starts_with(b"<<<") => {
                let end = heredoc_end(bytes, i)
                    .ok_or_else(|| "Unterminated heredoc in scalar expression".to_string())?;
                out.push_str(&template[i..end]);
                i = end;
            }
            marker @ (b'@' | b'`') => {
                i += 1;
                let digits_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let index: usize = template[digits_start..i]
                    .parse()
                    .map_err(|_| "Malformed placeholder in scalar expression".to_string())?;
                let values = if marker == b'@' {
                    class_values
                } else {
                    const_values
                };
                let value = values
                    .get(index)
                    .ok_or_else(|| "Placeholder out of range in scalar expression".to_string())?;
                out.push_str(value);
            }
            _ => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i];
                    if matches!(c, b'\'' | b'"' | b'@' | b'`')
                        || (c == b'<' && bytes[i..].starts_with(b"<<<"))
                    {
                        break;
                    }
                    i += 1;
                }
                out.push_str(&template[start..i]);
            }
        }
    }

    Ok(out)
}

/// Byte offset just past the closing label of the heredoc starting at `at`.
fn heredoc_end(bytes: &[u8], at: usize) -> Option<usize> {
    let mut i = at + 3;
    while bytes.get(i).is_some_and(|c| *c == b' ' || *c == b'\t') {
        i += 1;
    }

    let quote = match bytes.get(i) {
        Some(b'\'') => {
            i += 1;
            Some(b'\'')
        }
        Some(b'"') => {
            i += 1;
            Some(b'"')
        }
        _ => None,
    };

    let label_start = i;
    while bytes
        .get(i)
        .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_' || *c >= 0x80)
    {
        i += 1;
    }
    let label = &bytes[label_start..i];
    if label.is_empty() {
        return None;
    }

    if quote.is_some() && bytes.get(i) == quote.as_ref() {
        i += 1;
    }

    // Walk line by line for the closing label.
    while i < bytes.len() {
        let line_start = match bytes[i..].iter().position(|c| *c == b'\n') {
            Some(pos) => i + pos + 1,
            None => return None,
        };
        i = line_start;
        let mut j = i;
        while bytes.get(j).is_some_and(|c| *c == b' ' || *c == b'\t') {
            j += 1;
        }
        if bytes[j..].starts_with(label) {
            let after = j + label.len();
            let terminated = match bytes.get(after) {
                None => true,
                Some(c) => !c.is_ascii_alphanumeric() && *c != b'_' && *c < 0x80,
            };
            if terminated {
                return Some(after);
            }
        }
    }
    None
}

/// A value slot: either already folded, or deferred until first access.
///
/// `Evaluating` marks a resolution in progress, turning cyclic constant
/// references into an error instead of unbounded recursion.
#[derive(Debug, Clone)]
pub enum ConstantValue {
    Value(Value),
    Deferred(Rc<ScalarExpression>),
    Evaluating,
}

/// Once-settable cell holding a possibly-deferred value. Settles in place
/// on first read; reads after that are cheap clones. Clones share the cell,
/// so a slot merged from a parent settles together with it.
#[derive(Debug, Clone)]
pub struct LazySlot(Rc<RefCell<ConstantValue>>);

impl LazySlot {
    pub(crate) fn new(value: ConstantValue) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub(crate) fn from_value(value: Value) -> Self {
        Self::new(ConstantValue::Value(value))
    }

    /// Whether the slot still holds an unevaluated expression.
    pub fn is_deferred(&self) -> bool {
        matches!(&*self.0.borrow(), ConstantValue::Deferred(_))
    }

    /// Resolves the slot, evaluating a deferred expression at most once.
    /// `owner` names the slot in cycle diagnostics.
    pub fn get(&self, factory: &ReflectionFactory, owner: &str) -> Result<Value> {
        let current = self.0.borrow().clone();
        match current {
            ConstantValue::Value(value) => Ok(value),
            ConstantValue::Evaluating => Err(Error::Resolution(format!(
                "Cyclic constant reference detected while evaluating {}",
                owner
            ))),
            ConstantValue::Deferred(expression) => {
                *self.0.borrow_mut() = ConstantValue::Evaluating;
                match expression.evaluate(factory) {
                    Ok(value) => {
                        *self.0.borrow_mut() = ConstantValue::Value(value.clone());
                        Ok(value)
                    }
                    Err(err) => {
                        // Leave the slot retryable; the failure may be a
                        // class that simply is not loadable yet.
                        *self.0.borrow_mut() = ConstantValue::Deferred(expression);
                        Err(err)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_fills_placeholders_in_order() {
        let out = substitute(
            "@0 + `0 + @1 ",
            &["1".to_string(), "2".to_string()],
            &["3".to_string()],
        )
        .unwrap();
        assert_eq!(out, "1 + 3 + 2 ");
    }

    #[test]
    fn substitution_ignores_markers_inside_strings() {
        let out = substitute("'user@0' . @0 ", &["'x'".to_string()], &[]).unwrap();
        assert_eq!(out, "'user@0' . 'x' ");
    }

    #[test]
    fn substitution_ignores_markers_inside_heredocs() {
        let template = "<<<EOT\nmail: a@0\nEOT\n . @0 ";
        let out = substitute(template, &["'x'".to_string()], &[]).unwrap();
        assert_eq!(out, "<<<EOT\nmail: a@0\nEOT\n . 'x' ");
    }

    #[test]
    fn out_of_range_placeholder_is_rejected() {
        assert!(substitute("@1 ", &["1".to_string()], &[]).is_err());
    }
}
