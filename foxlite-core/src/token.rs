use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    LeftParen,
    RightParen,
    Comma,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,
    Caret,
    Question,

    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    Identifier,
    String,
    Integer,

    And,
    Case,
    Do,
    Else,
    EndCase,
    EndDo,
    EndFunc,
    EndIf,
    Exit,
    False,
    Function,
    If,
    Local,
    Loop,
    Null,
    Or,
    Otherwise,
    Private,
    Public,
    Return,
    True,
    While,

    LineBreak,
    Eof,
}

impl Type {
    /// Keywords that close a block. Statements never start with one of these.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Type::Else
                | Type::EndIf
                | Type::EndDo
                | Type::EndFunc
                | Type::EndCase
                | Type::Case
                | Type::Otherwise
        )
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Type::LeftParen => "'('",
            Type::RightParen => "')'",
            Type::Comma => "','",
            Type::Minus => "'-'",
            Type::Plus => "'+'",
            Type::Slash => "'/'",
            Type::Star => "'*'",
            Type::Percent => "'%'",
            Type::Caret => "'^'",
            Type::Question => "'?'",
            Type::Bang => "'!'",
            Type::BangEqual => "'!='",
            Type::Equal => "'='",
            Type::EqualEqual => "'=='",
            Type::Greater => "'>'",
            Type::GreaterEqual => "'>='",
            Type::Less => "'<'",
            Type::LessEqual => "'<='",
            Type::Identifier => "identifier",
            Type::String => "string",
            Type::Integer => "integer",
            Type::And => "'and'",
            Type::Case => "'case'",
            Type::Do => "'do'",
            Type::Else => "'else'",
            Type::EndCase => "'endcase'",
            Type::EndDo => "'enddo'",
            Type::EndFunc => "'endfunc'",
            Type::EndIf => "'endif'",
            Type::Exit => "'exit'",
            Type::False => "'.f.'",
            Type::Function => "'function'",
            Type::If => "'if'",
            Type::Local => "'local'",
            Type::Loop => "'loop'",
            Type::Null => "'.null.'",
            Type::Or => "'or'",
            Type::Otherwise => "'otherwise'",
            Type::Private => "'private'",
            Type::Public => "'public'",
            Type::Return => "'return'",
            Type::True => "'.t.'",
            Type::While => "'while'",
            Type::LineBreak => "line break",
            Type::Eof => "end of file",
        };
        f.write_str(text)
    }
}

// Lines and columns are 1-based. For strings the lexeme is the text between the quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ty: Type,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(ty: Type, lexeme: String, line: usize, col: usize) -> Self {
        Token {
            ty,
            lexeme,
            line,
            col,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.ty {
            Type::Identifier | Type::Integer => {
                write!(f, "[{}:{}] {} '{}'", self.line, self.col, self.ty, self.lexeme)
            }
            Type::String => write!(f, "[{}:{}] string {:?}", self.line, self.col, self.lexeme),
            _ => write!(f, "[{}:{}] {}", self.line, self.col, self.ty),
        }
    }
}
