use bigdecimal::BigDecimal;
use serde::Serialize;
use std::fmt;

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Literal {
    Integer(i64),
    Decimal(BigDecimal),
    String(String),
    Boolean(bool),
    Null,
}

impl Literal {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Integer(_) | Literal::Decimal(_))
    }

    pub fn negated(&self) -> Option<Literal> {
        match self {
            Literal::Integer(value) => Some(match value.checked_neg() {
                Some(negated) => Literal::Integer(negated),
                None => Literal::Decimal(-BigDecimal::from(*value)),
            }),
            Literal::Decimal(value) => Some(Literal::Decimal(-value.clone())),
            _ => None,
        }
    }

    /// Shifts a numeric literal by `delta`, keeping its type. Integers that
    /// would overflow are promoted to decimals rather than wrapping.
    pub fn offset(&self, delta: i64) -> Option<Literal> {
        match self {
            Literal::Integer(value) => Some(match value.checked_add(delta) {
                Some(shifted) => Literal::Integer(shifted),
                None => Literal::Decimal(BigDecimal::from(*value) + BigDecimal::from(delta)),
            }),
            Literal::Decimal(value) => Some(Literal::Decimal(value + BigDecimal::from(delta))),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Decimal(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Boolean(true) => write!(f, "TRUE"),
            Literal::Boolean(false) => write!(f, "FALSE"),
            Literal::Null => write!(f, "NULL"),
        }
    }
}
