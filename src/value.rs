/// Runtime values for the hydro VM
///
/// The machine's only first-class value is a signed 64-bit integer.
/// Constant-pool tokens that do not parse as integers are carried as
/// opaque text: echo and equality see the token, arithmetic coerces it.
use std::fmt;

/// Value returned for a read of an out-of-range variable slot.
pub const SENTINEL: i64 = -1337;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Parse a constant-pool token. Integers become `Int`, anything else
    /// is kept verbatim as an opaque token.
    pub fn parse(token: &str) -> Value {
        match token.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Text(token.to_string()),
        }
    }

    /// 1 for true, 0 for false. The comparison and logic opcodes only
    /// ever push these two values.
    pub fn flag(condition: bool) -> Value {
        Value::Int(if condition { 1 } else { 0 })
    }

    /// Integer coercion used by arithmetic and logic. Text that fails to
    /// parse coerces to 0.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    /// Truthiness for the conditional opcodes: exactly the integer 1.
    pub fn is_true(&self) -> bool {
        self.as_int() == 1
    }

    /// Equality for the `=` opcode. Same-typed values compare directly;
    /// a mixed pair compares numerically when the text side parses as an
    /// integer, and is unequal otherwise.
    pub fn same_token(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(n), Value::Text(s)) | (Value::Text(s), Value::Int(n)) => {
                s.trim().parse::<i64>().map_or(false, |parsed| parsed == *n)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(Value::parse("42"), Value::Int(42));
        assert_eq!(Value::parse("-7"), Value::Int(-7));
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(Value::parse("hello"), Value::Text("hello".into()));
        assert_eq!(Value::parse("1.5"), Value::Text("1.5".into()));
    }

    #[test]
    fn test_coercion() {
        assert_eq!(Value::Int(3).as_int(), 3);
        assert_eq!(Value::Text("12".into()).as_int(), 12);
        assert_eq!(Value::Text("banana".into()).as_int(), 0);
    }

    #[test]
    fn test_truthiness_is_exactly_one() {
        assert!(Value::Int(1).is_true());
        assert!(!Value::Int(0).is_true());
        assert!(!Value::Int(2).is_true());
        assert!(Value::Text("1".into()).is_true());
    }

    #[test]
    fn test_token_equality() {
        assert!(Value::Int(2).same_token(&Value::Int(2)));
        assert!(Value::Text("a".into()).same_token(&Value::Text("a".into())));
        assert!(Value::Int(2).same_token(&Value::Text("2".into())));
        assert!(!Value::Int(0).same_token(&Value::Text("zero".into())));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-5).to_string(), "-5");
        assert_eq!(Value::Text("hi".into()).to_string(), "hi");
    }
}
