use foxlite_core::{Error as CoreError, Token};
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error, PartialEq, Clone)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("[line {line}] lexical error: {source}")]
    LexicalError { line: usize, source: CoreError },

    #[error("[line {line}] parser error: {msg}")]
    ParserError {
        token: Token,

        // line is copied from token, this is required because thiserror doesn't support field
        // access, e.g {token.line}, in error strings
        line: usize,
        msg: String,
    },

    #[error("[line {line}] runtime error: {msg}")]
    RuntimeError { line: usize, msg: String },

    // The variants below unwind the evaluator and are caught before `interpret` returns.
    #[error("return value")]
    Return(Value),

    #[error("exit outside of a loop")]
    Exit,

    #[error("loop outside of a loop")]
    Loop,
}

impl Error {
    pub(crate) fn parser_error(token: &Token, msg: &str) -> Self {
        Error::ParserError {
            token: token.clone(),
            line: token.line,
            msg: String::from(msg),
        }
    }

    pub(crate) fn runtime_error(token: &Token, msg: &str) -> Self {
        Error::RuntimeError {
            line: token.line,
            msg: String::from(msg),
        }
    }
}

impl From<CoreError> for Error {
    fn from(value: CoreError) -> Self {
        Error::LexicalError {
            line: value.line(),
            source: value,
        }
    }
}
