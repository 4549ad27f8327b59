use phf::{phf_map, Map};

use crate::error::Error;
use crate::token::{Token, Type};

// Reserved words are matched against the lowercased lexeme, so `IF`, `EndDo` and `.T.` are
// keywords too. Identifiers keep their case.
const KEYWORDS: Map<&'static str, Type> = phf_map! {
    "and" => Type::And,
    "case" => Type::Case,
    "do" => Type::Do,
    "else" => Type::Else,
    "endcase" => Type::EndCase,
    "enddo" => Type::EndDo,
    "endfunc" => Type::EndFunc,
    "endif" => Type::EndIf,
    "exit" => Type::Exit,
    "function" => Type::Function,
    "if" => Type::If,
    "local" => Type::Local,
    "loop" => Type::Loop,
    "or" => Type::Or,
    "otherwise" => Type::Otherwise,
    "private" => Type::Private,
    "public" => Type::Public,
    "return" => Type::Return,
    "while" => Type::While,
    ".t." => Type::True,
    ".f." => Type::False,
    ".null." => Type::Null,
};

pub fn lookup_keyword(text: &str) -> Option<Type> {
    KEYWORDS.get(text.to_lowercase().as_str()).copied()
}

/// Pulls tokens out of the source one at a time.
///
/// Line breaks are significant in FoxLite and are emitted as [`Type::LineBreak`], except when
/// the previously emitted token was already a line break (or nothing was emitted yet), so
/// blank lines and comment-only lines collapse into a single statement terminator.
pub struct Lexer<'a> {
    src: &'a str,

    // Byte offsets of the start and end of the token being scanned
    start: usize,
    current: usize,

    line: usize,
    // Column of the character at `current`
    col: usize,

    // Position of the token being scanned, captured before any of its characters are consumed
    start_line: usize,
    start_col: usize,

    last: Type,

    // Set once the iterator has handed out the eof token
    eof: bool,
    error: Option<Error>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            start: 0,
            current: 0,
            line: 1,
            col: 1,
            start_line: 1,
            start_col: 1,
            last: Type::LineBreak,
            eof: false,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns the next token. Once the end of input is reached every further call returns an
    /// eof token. After a lexical error every further call returns that same error.
    pub fn next_token(&mut self) -> Result<Token, Error> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        loop {
            self.start = self.current;
            self.start_line = self.line;
            self.start_col = self.col;

            if self.is_at_end() {
                let token = self.make_token(Type::Eof);
                self.last = Type::Eof;
                return Ok(token);
            }

            match self.scan_token() {
                Ok(None) => continue,
                Ok(Some(token)) => {
                    self.last = token.ty;
                    return Ok(token);
                }
                Err(err) => {
                    self.error = Some(err.clone());
                    return Err(err);
                }
            }
        }
    }

    fn scan_token(&mut self) -> Result<Option<Token>, Error> {
        let c = self.advance();

        let token = match c {
            '(' => Some(self.make_token(Type::LeftParen)),
            ')' => Some(self.make_token(Type::RightParen)),
            ',' => Some(self.make_token(Type::Comma)),
            '-' => Some(self.make_token(Type::Minus)),
            '+' => Some(self.make_token(Type::Plus)),
            '*' => Some(self.make_token(Type::Star)),
            '/' => Some(self.make_token(Type::Slash)),
            '%' => Some(self.make_token(Type::Percent)),
            '^' => Some(self.make_token(Type::Caret)),
            '?' => Some(self.make_token(Type::Question)),

            '!' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::BangEqual))
                } else {
                    Some(self.make_token(Type::Bang))
                }
            }

            '=' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::EqualEqual))
                } else {
                    Some(self.make_token(Type::Equal))
                }
            }

            '<' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::LessEqual))
                } else {
                    Some(self.make_token(Type::Less))
                }
            }

            '>' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::GreaterEqual))
                } else {
                    Some(self.make_token(Type::Greater))
                }
            }

            // `&&` comments run to the end of the line, the line break itself is kept
            '&' if self.match_char('&') => {
                while !matches!(self.peek(), Some('\n') | None) {
                    self.advance();
                }
                None
            }

            '"' | '\'' => Some(self.string(c)),

            '.' => Some(self.dotted()?),

            ' ' | '\t' | '\r' => None,

            '\n' => {
                let token = if self.last != Type::LineBreak {
                    Some(self.make_token(Type::LineBreak))
                } else {
                    None
                };
                self.line += 1;
                self.col = 1;
                token
            }

            _ if c.is_ascii_digit() => Some(self.integer()),
            _ if c.is_alphabetic() || c == '_' => Some(self.identifier()),

            _ => {
                return Err(Error::UnexpectedCharacter {
                    ch: c,
                    line: self.start_line,
                })
            }
        };

        Ok(token)
    }

    // There is no escape processing. A string missing its closing quote runs to the end of
    // the input.
    fn string(&mut self, delimiter: char) -> Token {
        while let Some(c) = self.peek() {
            if c == delimiter {
                break;
            }

            self.advance();
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            }
        }

        let end = self.current;
        self.match_char(delimiter);

        let text = String::from(&self.src[self.start + 1..end]);
        Token::new(Type::String, text, self.start_line, self.start_col)
    }

    fn integer(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        self.make_token(Type::Integer)
    }

    fn identifier(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let ty = lookup_keyword(&self.src[self.start..self.current]).unwrap_or(Type::Identifier);
        self.make_token(ty)
    }

    // `.t.`, `.f.` and `.null.`
    fn dotted(&mut self) -> Result<Token, Error> {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let closed = self.match_char('.');
        let text = &self.src[self.start..self.current];

        match lookup_keyword(text) {
            Some(ty @ (Type::True | Type::False | Type::Null)) if closed => Ok(self.make_token(ty)),
            _ => Err(Error::UnknownLiteral {
                lexeme: String::from(text),
                line: self.start_line,
            }),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.current..].chars().next()
    }

    fn advance(&mut self) -> char {
        match self.peek() {
            Some(c) => {
                self.current += c.len_utf8();
                self.col += 1;
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.current += c.len_utf8();
            self.col += 1;
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&self, ty: Type) -> Token {
        let lexeme = match ty {
            Type::Eof => String::new(),
            _ => String::from(&self.src[self.start..self.current]),
        };

        Token::new(ty, lexeme, self.start_line, self.start_col)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    // Yields every token up to and including the first eof. Stops early on a lexical error,
    // which is then available through `error()`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.eof || self.error.is_some() {
            return None;
        }

        match self.next_token() {
            Ok(token) => {
                if token.ty == Type::Eof {
                    self.eof = true;
                }
                Some(token)
            }
            Err(_) => None,
        }
    }
}
