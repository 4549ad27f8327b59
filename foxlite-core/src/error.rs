use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum Error {
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, line: usize },

    // A dotted literal that is not `.t.`, `.f.` or `.null.`, or one missing its closing dot
    #[error("unknown literal '{lexeme}'")]
    UnknownLiteral { lexeme: String, line: usize },
}

impl Error {
    pub fn line(&self) -> usize {
        match self {
            Error::UnexpectedCharacter { line, .. } => *line,
            Error::UnknownLiteral { line, .. } => *line,
        }
    }
}
