use pest::error::{Error as PestError, LineColLocation};
use thiserror::Error;

use crate::parser::Rule;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Unsupported statement: only SELECT queries are accepted, found {0}")]
    UnsupportedStatement(String),
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn from_pest_error(err: PestError<Rule>) -> Self {
        let (line, column) = match err.line_col {
            LineColLocation::Pos((l, c)) => (l, c),
            LineColLocation::Span((l, c), _) => (l, c),
        };

        ParseError::Syntax {
            message: format!("{}", err.variant),
            line,
            column,
        }
    }
}
