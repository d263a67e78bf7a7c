use indexmap::IndexMap;
use std::cmp::Ordering;
use std::rc::Rc;

/// Key of a PHP array element.
///
/// PHP normalizes keys before insertion: integral floats, booleans and
/// integer-like decimal strings all collapse to integer keys, `null` to the
/// empty string key.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    pub fn from_value(value: &Value) -> ArrayKey {
        match value {
            Value::Null => ArrayKey::Str(String::new()),
            Value::Bool(b) => ArrayKey::Int(*b as i64),
            Value::Int(i) => ArrayKey::Int(*i),
            Value::Float(f) => ArrayKey::Int(*f as i64),
            Value::String(s) => match canonical_int_string(s) {
                Some(i) => ArrayKey::Int(i),
                None => ArrayKey::Str(s.clone()),
            },
            Value::Array(_) => ArrayKey::Str(String::new()),
        }
    }
}

/// Returns the integer when `s` is its canonical decimal spelling
/// (no leading zeros, no whitespace, optional minus).
fn canonical_int_string(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    let i: i64 = s.parse().ok()?;
    (i.to_string() == s).then_some(i)
}

pub type ArrayValue = IndexMap<ArrayKey, Value>;

/// A fully-resolved PHP scalar or array value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Rc<ArrayValue>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Array(map) => !map.is_empty(),
        }
    }

    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => *b as i64,
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::String(s) => parse_numeric_string(s).map_or(0, |n| match n {
                Numeric::Int(i) => i,
                Numeric::Float(f) => f as i64,
            }),
            Value::Array(map) => {
                if map.is_empty() {
                    0
                } else {
                    1
                }
            }
        }
    }

    pub fn to_float(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => *b as i64 as f64,
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::String(s) => parse_numeric_string(s).map_or(0.0, |n| match n {
                Numeric::Int(i) => i as f64,
                Numeric::Float(f) => f,
            }),
            Value::Array(map) => {
                if map.is_empty() {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// String conversion used by the concatenation operator.
    pub fn to_php_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => {
                if *b {
                    "1".to_string()
                } else {
                    String::new()
                }
            }
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_to_php_string(*f),
            Value::String(s) => s.clone(),
            Value::Array(_) => "Array".to_string(),
        }
    }

    /// Strict (`===`) equality: types must match, arrays compare in order.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
            }
            _ => false,
        }
    }

    /// Loose (`==`) equality with type juggling.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) => *a as f64 == *b,
            (Value::Float(a), Value::Int(b)) => *a == *b as f64,
            (Value::String(a), Value::String(b)) => {
                match (parse_numeric_string(a), parse_numeric_string(b)) {
                    (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
                    _ => a == b,
                }
            }
            (Value::Bool(a), _) => *a == other.to_bool(),
            (_, Value::Bool(b)) => self.to_bool() == *b,
            (Value::Null, _) => !other.to_bool(),
            (_, Value::Null) => !self.to_bool(),
            (Value::String(_), Value::Int(_) | Value::Float(_))
            | (Value::Int(_) | Value::Float(_), Value::String(_)) => {
                self.to_float() == other.to_float()
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.loose_equals(w)))
            }
            _ => false,
        }
    }

    /// Relational comparison used by `<`, `<=`, `>`, `>=`.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => {
                match (parse_numeric_string(a), parse_numeric_string(b)) {
                    (Some(x), Some(y)) => float_cmp(x.as_f64(), y.as_f64()),
                    _ => a.cmp(b),
                }
            }
            (Value::Bool(_) | Value::Null, _) | (_, Value::Bool(_) | Value::Null) => {
                self.to_bool().cmp(&other.to_bool())
            }
            (Value::Array(a), Value::Array(b)) => {
                let by_len = a.len().cmp(&b.len());
                if by_len != Ordering::Equal {
                    return by_len;
                }
                for (k, v) in a.iter() {
                    match b.get(k) {
                        Some(w) => {
                            let ord = v.compare(w);
                            if ord != Ordering::Equal {
                                return ord;
                            }
                        }
                        None => return Ordering::Greater,
                    }
                }
                Ordering::Equal
            }
            (Value::Array(_), _) => Ordering::Greater,
            (_, Value::Array(_)) => Ordering::Less,
            _ => float_cmp(self.to_float(), other.to_float()),
        }
    }

    /// Prints the value as a PHP literal expression, the way `var_export`
    /// would. The output must re-fold to the same value.
    pub fn php_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_literal(*f),
            Value::String(s) => quote_php_string(s),
            Value::Array(map) => {
                let mut out = String::from("array (");
                for (key, value) in map.iter() {
                    match key {
                        ArrayKey::Int(i) => out.push_str(&i.to_string()),
                        ArrayKey::Str(s) => out.push_str(&quote_php_string(s)),
                    }
                    out.push_str(" => ");
                    out.push_str(&value.php_literal());
                    out.push_str(", ");
                }
                out.push(')');
                out
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

fn float_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn float_to_php_string(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.0}", f)
    } else {
        format!("{}", f)
    }
}

fn float_literal(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    // Debug formatting keeps a trailing ".0" on integral floats, which is
    // exactly what keeps the literal a float when re-folded.
    format!("{:?}", f)
}

fn quote_php_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn as_f64(&self) -> f64 {
        match self {
            Numeric::Int(i) => *i as f64,
            Numeric::Float(f) => *f,
        }
    }
}

/// Parses a string that is numeric in its entirety (modulo surrounding
/// whitespace); anything else is not a numeric string.
fn parse_numeric_string(s: &str) -> Option<Numeric> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Numeric::Int(i));
    }
    trimmed.parse::<f64>().ok().map(Numeric::Float)
}
