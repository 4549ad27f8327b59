use std::fmt::{Display, Formatter};
use std::rc::Rc;

use foxlite_core::Token;

use crate::error::Error;

// Names and operators keep their tokens so runtime errors can point at a source line. The
// tokens are cloned out of the lexer while parsing and never touched again.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Public,
    Local,
    Private,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Public => f.write_str("public"),
            Scope::Local => f.write_str("local"),
            Scope::Private => f.write_str("private"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        name: Token,
    },
    Integer {
        value: i64,
    },
    Str {
        value: String,
    },
    Boolean {
        value: bool,
    },
    Null,
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        name: Token,
        args: Vec<Expr>,
    },
}

pub(crate) trait ExprVisitor {
    type Item;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Item, Error> {
        match expr {
            Expr::Identifier { name } => self.visit_identifier(name),
            Expr::Integer { value } => self.visit_integer(*value),
            Expr::Str { value } => self.visit_string(value),
            Expr::Boolean { value } => self.visit_boolean(*value),
            Expr::Null => self.visit_null(),
            Expr::Binary {
                left,
                operator,
                right,
            } => self.visit_binary(left, operator, right),
            Expr::Logical {
                left,
                operator,
                right,
            } => self.visit_logical(left, operator, right),
            Expr::Unary { operator, right } => self.visit_unary(operator, right),
            Expr::Call { name, args } => self.visit_call(name, args),
        }
    }

    fn visit_identifier(&mut self, name: &Token) -> Result<Self::Item, Error>;
    fn visit_integer(&mut self, value: i64) -> Result<Self::Item, Error>;
    fn visit_string(&mut self, value: &str) -> Result<Self::Item, Error>;
    fn visit_boolean(&mut self, value: bool) -> Result<Self::Item, Error>;
    fn visit_null(&mut self) -> Result<Self::Item, Error>;
    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Self::Item, Error>;
    fn visit_call(&mut self, name: &Token, args: &[Expr]) -> Result<Self::Item, Error>;
}

impl Expr {
    pub(crate) fn identifier(name: Token) -> Self {
        Expr::Identifier { name }
    }

    pub(crate) fn binary(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn logical(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn unary(operator: Token, right: Expr) -> Self {
        Expr::Unary {
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn call(name: Token, args: Vec<Expr>) -> Self {
        Expr::Call { name, args }
    }
}

/// A sequence of statements closed by a terminator keyword. Blocks do not open a new scope.
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VariableDecl {
        name: Token,
        scope: Scope,
    },
    Assignment {
        name: Token,
        value: Expr,
    },
    Function {
        name: Token,
        params: Vec<Token>,
        // Shared with every function value created from this declaration
        body: Rc<[Stmt]>,
    },
    DoWhile {
        token: Token,
        condition: Expr,
        body: Block,
    },
    DoCase {
        token: Token,
        branches: Vec<CaseBranch>,
        otherwise: Option<Block>,
    },
    If {
        token: Token,
        condition: Expr,
        consequence: Block,
        alternative: Option<Block>,
    },
    Return {
        keyword: Token,
        value: Expr,
    },
    Print {
        token: Token,
        arguments: Vec<Expr>,
    },
    Exit {
        keyword: Token,
    },
    Loop {
        keyword: Token,
    },
    Expression {
        expression: Expr,
    },
}

pub(crate) trait StmtVisitor {
    type Item;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Self::Item, Error> {
        match stmt {
            Stmt::VariableDecl { name, scope } => self.visit_variable_decl(name, *scope),
            Stmt::Assignment { name, value } => self.visit_assignment(name, value),
            Stmt::Function { name, params, body } => self.visit_function(name, params, body),
            Stmt::DoWhile {
                token,
                condition,
                body,
            } => self.visit_do_while(token, condition, body),
            Stmt::DoCase {
                token,
                branches,
                otherwise,
            } => self.visit_do_case(token, branches, otherwise.as_deref()),
            Stmt::If {
                token,
                condition,
                consequence,
                alternative,
            } => self.visit_if(token, condition, consequence, alternative.as_deref()),
            Stmt::Return { keyword, value } => self.visit_return(keyword, value),
            Stmt::Print { token, arguments } => self.visit_print(token, arguments),
            Stmt::Exit { keyword } => self.visit_exit(keyword),
            Stmt::Loop { keyword } => self.visit_loop(keyword),
            Stmt::Expression { expression } => self.visit_expression(expression),
        }
    }

    fn visit_variable_decl(&mut self, name: &Token, scope: Scope) -> Result<Self::Item, Error>;
    fn visit_assignment(&mut self, name: &Token, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_function(
        &mut self,
        name: &Token,
        params: &[Token],
        body: &Rc<[Stmt]>,
    ) -> Result<Self::Item, Error>;
    fn visit_do_while(
        &mut self,
        token: &Token,
        condition: &Expr,
        body: &[Stmt],
    ) -> Result<Self::Item, Error>;
    fn visit_do_case(
        &mut self,
        token: &Token,
        branches: &[CaseBranch],
        otherwise: Option<&[Stmt]>,
    ) -> Result<Self::Item, Error>;
    fn visit_if(
        &mut self,
        token: &Token,
        condition: &Expr,
        consequence: &[Stmt],
        alternative: Option<&[Stmt]>,
    ) -> Result<Self::Item, Error>;
    fn visit_return(&mut self, keyword: &Token, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_print(&mut self, token: &Token, arguments: &[Expr]) -> Result<Self::Item, Error>;
    fn visit_exit(&mut self, keyword: &Token) -> Result<Self::Item, Error>;
    fn visit_loop(&mut self, keyword: &Token) -> Result<Self::Item, Error>;
    fn visit_expression(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

// The textual forms below are valid FoxLite again. Binary and unary expressions are fully
// parenthesized so the printed program keeps the parsed precedence.

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Identifier { name } => f.write_str(&name.lexeme),
            Expr::Integer { value } => write!(f, "{}", value),
            Expr::Str { value } if value.contains('"') => write!(f, "'{}'", value),
            Expr::Str { value } => write!(f, "\"{}\"", value),
            Expr::Boolean { value: true } => f.write_str(".t."),
            Expr::Boolean { value: false } => f.write_str(".f."),
            Expr::Null => f.write_str(".null."),
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator.lexeme, right),
            Expr::Unary { operator, right } => write!(f, "({}{})", operator.lexeme, right),
            Expr::Call { name, args } => {
                write!(f, "{}(", name.lexeme)?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> std::fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_block(f: &mut Formatter<'_>, block: &[Stmt]) -> std::fmt::Result {
    for stmt in block {
        for line in stmt.to_string().lines() {
            writeln!(f, "  {}", line)?;
        }
    }
    Ok(())
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stmt::VariableDecl { name, scope } => write!(f, "{} {}", scope, name.lexeme),
            Stmt::Assignment { name, value } => write!(f, "{} = {}", name.lexeme, value),
            Stmt::Function { name, params, body } => {
                write!(f, "function {}(", name.lexeme)?;
                let params: Vec<&str> = params.iter().map(|param| param.lexeme.as_str()).collect();
                write_list(f, &params)?;
                f.write_str(")\n")?;
                write_block(f, body)?;
                f.write_str("endfunc")
            }
            Stmt::DoWhile {
                condition, body, ..
            } => {
                writeln!(f, "do while {}", condition)?;
                write_block(f, body)?;
                f.write_str("enddo")
            }
            Stmt::DoCase {
                branches,
                otherwise,
                ..
            } => {
                f.write_str("do case\n")?;
                for branch in branches {
                    writeln!(f, "case {}", branch.condition)?;
                    write_block(f, &branch.body)?;
                }
                if let Some(otherwise) = otherwise {
                    f.write_str("otherwise\n")?;
                    write_block(f, otherwise)?;
                }
                f.write_str("endcase")
            }
            Stmt::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                writeln!(f, "if {}", condition)?;
                write_block(f, consequence)?;
                if let Some(alternative) = alternative {
                    f.write_str("else\n")?;
                    write_block(f, alternative)?;
                }
                f.write_str("endif")
            }
            Stmt::Return { value, .. } => write!(f, "return {}", value),
            Stmt::Print { arguments, .. } if arguments.is_empty() => f.write_str("?"),
            Stmt::Print { arguments, .. } => {
                f.write_str("? ")?;
                write_list(f, arguments)
            }
            Stmt::Exit { .. } => f.write_str("exit"),
            Stmt::Loop { .. } => f.write_str("loop"),
            Stmt::Expression { expression } => write!(f, "{}", expression),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
