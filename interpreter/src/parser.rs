use std::mem;
use std::rc::Rc;

use foxlite_core::{Lexer, Token, Type};
use tracing::debug;

use crate::ast::{Block, CaseBranch, Expr, Program, Scope, Stmt};
use crate::error::Error;

// Helper alias for shorter return types
type ParserResult = Result<Program, Vec<Error>>;
type BlockResult = Result<(Block, Type), Error>;
type StmtResult = Result<Stmt, Error>;
type ExprResult = Result<Expr, Error>;

/// Parses a whole source text.
pub fn parse(src: &str) -> ParserResult {
    Parser::new(src).parse()
}

/// Recursive descent parser pulling tokens from the lexer on demand, with one token of
/// lookahead past the current one.
///
/// A statement that fails to parse leaves a diagnostic behind and the parser skips to the
/// next line (or the next block terminator when inside a block) before trying again. A
/// lexical error stops everything: it becomes the only reported error.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    errors: Vec<Error>,
    lex_error: Option<Error>,
    block_depth: usize,
    loop_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut parser = Parser {
            lexer: Lexer::new(src),
            current: Token::new(Type::Eof, String::new(), 1, 1),
            peek: Token::new(Type::Eof, String::new(), 1, 1),
            errors: Vec::new(),
            lex_error: None,
            block_depth: 0,
            loop_depth: 0,
        };
        parser.current = parser.read_token();
        parser.peek = parser.read_token();
        parser
    }

    pub fn parse(&mut self) -> ParserResult {
        let mut statements = Vec::new();

        self.skip_line_break();
        while !self.check(Type::Eof) {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.record(err);
                    self.synchronize();
                }
            }
        }

        if let Some(err) = self.lex_error.take() {
            return Err(vec![err]);
        }

        if self.errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(mem::take(&mut self.errors))
        }
    }

    fn statement(&mut self) -> StmtResult {
        match self.current.ty {
            Type::Public => self.variable_decl(Scope::Public),
            Type::Local => self.variable_decl(Scope::Local),
            Type::Private => self.variable_decl(Scope::Private),
            Type::Function => self.function(),
            Type::Do => self.do_statement(),
            Type::If => self.if_statement(),
            Type::Return => self.return_statement(),
            Type::Question => self.print_statement(),
            Type::Exit | Type::Loop => self.loop_control(),
            Type::Identifier if self.peek.ty == Type::Equal => self.assignment(),
            ty if ty.is_terminator() => Err(Error::parser_error(
                &self.current,
                &format!("unexpected {}", ty),
            )),
            _ => self.expression_statement(),
        }
    }

    fn variable_decl(&mut self, scope: Scope) -> StmtResult {
        self.advance();
        let name = self.consume(Type::Identifier, &format!("after '{}'", scope))?;
        self.finish_statement()?;
        Ok(Stmt::VariableDecl { name, scope })
    }

    fn assignment(&mut self) -> StmtResult {
        let name = self.advance();
        self.advance();
        let value = self.expression()?;
        self.finish_statement()?;
        Ok(Stmt::Assignment { name, value })
    }

    fn function(&mut self) -> StmtResult {
        self.advance();
        let name = self.consume(Type::Identifier, "after 'function'")?;

        // The parameter list is optional, `function main` declares no parameters
        let mut params = Vec::new();
        if self.match_one(Type::LeftParen) {
            if !self.check(Type::RightParen) {
                loop {
                    params.push(self.consume(Type::Identifier, "in parameter list")?);
                    if !self.match_one(Type::Comma) {
                        break;
                    }
                }
            }
            self.consume(Type::RightParen, "after parameters")?;
        }

        // `exit` and `loop` never cross a function boundary
        let loop_depth = mem::replace(&mut self.loop_depth, 0);
        let body = self.block(&[Type::EndFunc]);
        self.loop_depth = loop_depth;

        let (body, _) = body?;
        self.finish_statement()?;
        Ok(Stmt::Function {
            name,
            params,
            body: Rc::from(body),
        })
    }

    fn do_statement(&mut self) -> StmtResult {
        let token = self.advance();
        match self.current.ty {
            Type::While => self.do_while(token),
            Type::Case => self.do_case(token),
            ty => Err(Error::parser_error(
                &self.current,
                &format!("expected 'while' or 'case' after 'do', found {}", ty),
            )),
        }
    }

    fn do_while(&mut self, token: Token) -> StmtResult {
        self.advance();
        let condition = self.expression()?;

        self.loop_depth += 1;
        let body = self.block(&[Type::EndDo]);
        self.loop_depth -= 1;

        let (body, _) = body?;
        self.finish_statement()?;
        Ok(Stmt::DoWhile {
            token,
            condition,
            body,
        })
    }

    fn do_case(&mut self, token: Token) -> StmtResult {
        self.advance();
        self.skip_line_break();

        let mut keyword = match self.current.ty {
            Type::Case | Type::Otherwise | Type::EndCase => self.advance().ty,
            ty => {
                return Err(Error::parser_error(
                    &self.current,
                    &format!("expected 'case' after 'do case', found {}", ty),
                ))
            }
        };

        let mut branches = Vec::new();
        let mut otherwise = None;
        loop {
            match keyword {
                Type::Case => {
                    let condition = self.expression()?;
                    let (body, next) =
                        self.block(&[Type::Case, Type::Otherwise, Type::EndCase])?;
                    branches.push(CaseBranch { condition, body });
                    keyword = next;
                }
                Type::Otherwise => {
                    let (body, next) = self.block(&[Type::EndCase])?;
                    otherwise = Some(body);
                    keyword = next;
                }
                _ => break,
            }
        }

        self.finish_statement()?;
        Ok(Stmt::DoCase {
            token,
            branches,
            otherwise,
        })
    }

    fn if_statement(&mut self) -> StmtResult {
        let token = self.advance();
        let condition = self.expression()?;

        let (consequence, terminator) = self.block(&[Type::Else, Type::EndIf])?;
        let alternative = if terminator == Type::Else {
            Some(self.block(&[Type::EndIf])?.0)
        } else {
            None
        };

        self.finish_statement()?;
        Ok(Stmt::If {
            token,
            condition,
            consequence,
            alternative,
        })
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.advance();

        // A bare `return` yields .T.
        let value = if self.at_statement_end() {
            Expr::Boolean { value: true }
        } else {
            self.expression()?
        };

        self.finish_statement()?;
        Ok(Stmt::Return { keyword, value })
    }

    fn print_statement(&mut self) -> StmtResult {
        let token = self.advance();

        let mut arguments = Vec::new();
        if !self.at_statement_end() {
            loop {
                arguments.push(self.expression()?);
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }

        self.finish_statement()?;
        Ok(Stmt::Print { token, arguments })
    }

    fn loop_control(&mut self) -> StmtResult {
        let keyword = self.advance();
        if self.loop_depth == 0 {
            return Err(Error::parser_error(
                &keyword,
                &format!("cannot use {} outside of a loop", keyword.ty),
            ));
        }

        self.finish_statement()?;
        if keyword.ty == Type::Exit {
            Ok(Stmt::Exit { keyword })
        } else {
            Ok(Stmt::Loop { keyword })
        }
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expression = self.expression()?;
        self.finish_statement()?;
        Ok(Stmt::Expression { expression })
    }

    // Parses statements up to one of `terminators` and consumes it. Reaching a different
    // terminator or the end of input is an error and leaves that token in place.
    fn block(&mut self, terminators: &[Type]) -> BlockResult {
        self.block_depth += 1;
        let result = self.block_statements(terminators);
        self.block_depth -= 1;
        result
    }

    fn block_statements(&mut self, terminators: &[Type]) -> BlockResult {
        self.skip_line_break();

        let mut stmts = Vec::new();
        loop {
            let ty = self.current.ty;
            if terminators.contains(&ty) {
                self.advance();
                return Ok((stmts, ty));
            }

            if ty == Type::Eof || ty.is_terminator() {
                return Err(Error::parser_error(
                    &self.current,
                    &format!("expected {}, found {}", describe(terminators), ty),
                ));
            }

            match self.statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.record(err);
                    self.synchronize();
                }
            }
        }
    }

    fn expression(&mut self) -> ExprResult {
        self.or_expression()
    }

    fn or_expression(&mut self) -> ExprResult {
        let mut expr = self.and_expression()?;
        while self.check(Type::Or) {
            let operator = self.advance();
            let right = self.and_expression()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.check(Type::And) {
            let operator = self.advance();
            let right = self.equality()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while self.check_either(&[Type::BangEqual, Type::EqualEqual]) {
            let operator = self.advance();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while self.check_either(&[
            Type::Greater,
            Type::GreaterEqual,
            Type::Less,
            Type::LessEqual,
        ]) {
            let operator = self.advance();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while self.check_either(&[Type::Plus, Type::Minus]) {
            let operator = self.advance();
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while self.check_either(&[Type::Slash, Type::Star, Type::Percent]) {
            let operator = self.advance();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.check_either(&[Type::Bang, Type::Minus]) {
            let operator = self.advance();
            Ok(Expr::unary(operator, self.unary()?))
        } else {
            self.power()
        }
    }

    // Right associative and tighter than a leading minus: `-2 ^ 3 ^ 2` is `-(2 ^ (3 ^ 2))`
    fn power(&mut self) -> ExprResult {
        let base = self.call()?;
        if self.check(Type::Caret) {
            let operator = self.advance();
            let exponent = self.unary()?;
            Ok(Expr::binary(base, operator, exponent))
        } else {
            Ok(base)
        }
    }

    // Only a name can be called, `name(args)`
    fn call(&mut self) -> ExprResult {
        if self.check(Type::Identifier) && self.peek.ty == Type::LeftParen {
            let name = self.advance();
            self.advance();

            let mut args = Vec::new();
            if !self.check(Type::RightParen) {
                loop {
                    args.push(self.expression()?);
                    if !self.match_one(Type::Comma) {
                        break;
                    }
                }
            }

            self.consume(Type::RightParen, "after arguments")?;
            Ok(Expr::call(name, args))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> ExprResult {
        match self.current.ty {
            Type::Integer => {
                let token = self.advance();
                match token.lexeme.parse::<i64>() {
                    Ok(value) => Ok(Expr::Integer { value }),
                    Err(_) => Err(Error::parser_error(
                        &token,
                        &format!("integer literal '{}' is out of range", token.lexeme),
                    )),
                }
            }
            Type::String => Ok(Expr::Str {
                value: self.advance().lexeme,
            }),
            Type::True => {
                self.advance();
                Ok(Expr::Boolean { value: true })
            }
            Type::False => {
                self.advance();
                Ok(Expr::Boolean { value: false })
            }
            Type::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            Type::Identifier => Ok(Expr::identifier(self.advance())),
            Type::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(Type::RightParen, "after expression")?;
                Ok(expr)
            }
            ty => Err(Error::parser_error(
                &self.current,
                &format!("expected expression, found {}", ty),
            )),
        }
    }

    // Every statement ends at a line break or at the end of input
    fn finish_statement(&mut self) -> Result<(), Error> {
        match self.current.ty {
            Type::LineBreak => {
                self.advance();
                Ok(())
            }
            Type::Eof => Ok(()),
            ty => Err(Error::parser_error(
                &self.current,
                &format!("expected line break after statement, found {}", ty),
            )),
        }
    }

    fn at_statement_end(&self) -> bool {
        self.check_either(&[Type::LineBreak, Type::Eof]) || self.current.ty.is_terminator()
    }

    // Skips the rest of the current line. Inside a block a terminator keyword also stops the
    // skip so the enclosing block can close.
    fn synchronize(&mut self) {
        loop {
            match self.current.ty {
                Type::Eof => return,
                Type::LineBreak => {
                    self.advance();
                    return;
                }
                ty if self.block_depth > 0 && ty.is_terminator() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // Once the input has run out, enclosing blocks would each report the same missing
    // terminator. Only the innermost one is kept.
    fn record(&mut self, err: Error) {
        if at_eof(&err) && self.errors.iter().any(at_eof) {
            debug!(error = %err, "dropping diagnostic at end of file");
            return;
        }

        debug!(error = %err, "parser diagnostic");
        self.errors.push(err);
    }

    fn read_token(&mut self) -> Token {
        match self.lexer.next_token() {
            Ok(token) => token,
            Err(err) => {
                let line = err.line();
                if self.lex_error.is_none() {
                    self.lex_error = Some(Error::from(err));
                }
                // Parsing winds down on a stream of eof tokens
                Token::new(Type::Eof, String::new(), line, 1)
            }
        }
    }

    fn advance(&mut self) -> Token {
        let next = self.read_token();
        let peek = mem::replace(&mut self.peek, next);
        mem::replace(&mut self.current, peek)
    }

    fn check(&self, ty: Type) -> bool {
        self.current.ty == ty
    }

    fn check_either(&self, types: &[Type]) -> bool {
        types.contains(&self.current.ty)
    }

    fn match_one(&mut self, ty: Type) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_line_break(&mut self) {
        self.match_one(Type::LineBreak);
    }

    fn consume(&mut self, ty: Type, context: &str) -> Result<Token, Error> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(Error::parser_error(
                &self.current,
                &format!("expected {} {}, found {}", ty, context, self.current.ty),
            ))
        }
    }
}

fn at_eof(err: &Error) -> bool {
    matches!(err, Error::ParserError { token, .. } if token.ty == Type::Eof)
}

fn describe(types: &[Type]) -> String {
    match types {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(Type::to_string).collect();
            format!("{} or {}", init.join(", "), last)
        }
    }
}
