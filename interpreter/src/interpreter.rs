use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use foxlite_core::{Token, Type};
use tracing::trace;

use crate::ast::{CaseBranch, Expr, ExprVisitor, Program, Scope, Stmt, StmtVisitor};
use crate::builtins::Builtins;
use crate::callable::{Callable, Function};
use crate::env::Environment;
use crate::error::Error;
use crate::limits::MAX_CALL_DEPTH;
use crate::value::Value;

/// Tree walking evaluator. The root environment lives as long as the interpreter, so
/// several programs run one after another share their globals.
pub struct Interpreter {
    env: Rc<RefCell<Environment>>,
    builtins: Builtins,
    stdout: Rc<RefCell<dyn Write>>,
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
}

impl Interpreter {
    /// An interpreter with the standard builtins, printing to `stdout`.
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        Self::with_builtins(stdout, Builtins::standard())
    }

    pub fn with_builtins(stdout: Rc<RefCell<dyn Write>>, builtins: Builtins) -> Self {
        Interpreter {
            env: Rc::new(RefCell::new(Environment::new())),
            builtins,
            stdout,
            depth: 0,
            max_depth: MAX_CALL_DEPTH,
        }
    }

    /// Limits how many user function calls may be nested.
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Runs `program` and returns the value of its last statement, if it has one. A
    /// top-level `return` ends the program early with its value.
    pub fn interpret(&mut self, program: &Program) -> Result<Option<Value>, Error> {
        let mut result = None;
        for stmt in &program.statements {
            match self.execute(stmt) {
                Ok(value) => result = value,
                Err(Error::Return(value)) => return Ok(Some(value)),
                Err(err) => return Err(err),
            }
        }
        Ok(result)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Option<Value>, Error> {
        trace!(statement = %stmt, "executing");
        self.visit_stmt(stmt)
    }

    // Blocks run in the current environment, only function calls open a new frame
    fn execute_block(&mut self, stmts: &[Stmt]) -> Result<Option<Value>, Error> {
        let mut result = None;
        for stmt in stmts {
            result = self.execute(stmt)?;
        }
        Ok(result)
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        stmts: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<Option<Value>, Error> {
        let current = Rc::clone(&self.env);
        self.env = env;
        let result = self.execute_block(stmts);
        self.env = current;
        result
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        match self.env.borrow().get(name) {
            Some(value) => Some(value),
            None => self.builtins.get(name).map(Value::Builtin),
        }
    }

    fn define(
        &mut self,
        name: &Token,
        value: Value,
        scope: Scope,
        restrict: bool,
    ) -> Result<(), Error> {
        self.env
            .borrow_mut()
            .set(&name.lexeme, value, scope, restrict)
            .map_err(|_| {
                Error::runtime_error(
                    name,
                    &format!("invalid redefinition of variable '{}'", name.lexeme),
                )
            })
    }

    fn condition(
        &mut self,
        token: &Token,
        condition: &Expr,
        what: &str,
    ) -> Result<bool, Error> {
        match self.visit_expr(condition)? {
            Value::Boolean(value) => Ok(value),
            other => Err(Error::runtime_error(
                token,
                &format!("{} must be a BOOLEAN but got {}", what, other.type_name()),
            )),
        }
    }
}

fn checked(operator: &Token, result: Option<i64>) -> Result<Value, Error> {
    result
        .map(Value::Integer)
        .ok_or_else(|| Error::runtime_error(operator, "integer overflow"))
}

fn unsupported(operator: &Token, ty: &str) -> Error {
    Error::runtime_error(
        operator,
        &format!("operator '{}' is not supported for {}", operator.lexeme, ty),
    )
}

fn integer_operation(operator: &Token, left: i64, right: i64) -> Result<Value, Error> {
    match operator.ty {
        Type::Plus => checked(operator, left.checked_add(right)),
        Type::Minus => checked(operator, left.checked_sub(right)),
        Type::Star => checked(operator, left.checked_mul(right)),
        Type::Slash => {
            if right == 0 {
                Err(Error::runtime_error(operator, "division by zero"))
            } else {
                checked(operator, left.checked_div(right))
            }
        }
        Type::Percent => {
            if right == 0 {
                Err(Error::runtime_error(operator, "modulo by zero"))
            } else {
                checked(operator, left.checked_rem(right))
            }
        }
        Type::Caret => match u32::try_from(right) {
            Ok(exponent) => checked(operator, left.checked_pow(exponent)),
            Err(_) if right < 0 => Err(Error::runtime_error(
                operator,
                &format!("negative exponent {}", right),
            )),
            // Only 0, 1 and -1 survive an exponent this large
            Err(_) => {
                let result = match left {
                    0 | 1 => Some(left),
                    -1 if right % 2 == 0 => Some(1),
                    -1 => Some(-1),
                    _ => None,
                };
                checked(operator, result)
            }
        },
        _ => compare(operator, left, right).ok_or_else(|| unsupported(operator, "INTEGER")),
    }
}

fn compare<T: PartialOrd>(operator: &Token, left: T, right: T) -> Option<Value> {
    let result = match operator.ty {
        Type::Less => left < right,
        Type::LessEqual => left <= right,
        Type::Greater => left > right,
        Type::GreaterEqual => left >= right,
        Type::EqualEqual => left == right,
        Type::BangEqual => left != right,
        _ => return None,
    };
    Some(Value::Boolean(result))
}

impl ExprVisitor for Interpreter {
    type Item = Value;

    fn visit_identifier(&mut self, name: &Token) -> Result<Value, Error> {
        self.lookup(&name.lexeme).ok_or_else(|| {
            Error::runtime_error(
                name,
                &format!("variable '{}' is not defined", name.lexeme),
            )
        })
    }

    fn visit_integer(&mut self, value: i64) -> Result<Value, Error> {
        Ok(Value::Integer(value))
    }

    fn visit_string(&mut self, value: &str) -> Result<Value, Error> {
        Ok(Value::from(value))
    }

    fn visit_boolean(&mut self, value: bool) -> Result<Value, Error> {
        Ok(Value::Boolean(value))
    }

    fn visit_null(&mut self) -> Result<Value, Error> {
        Ok(Value::NULL)
    }

    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Error> {
        let left = self.visit_expr(left)?;
        let right = self.visit_expr(right)?;

        match (left, right) {
            (Value::Integer(left), Value::Integer(right)) => {
                integer_operation(operator, left, right)
            }
            (Value::Str(left), Value::Str(right)) => match operator.ty {
                Type::Plus => Ok(Value::from(format!("{}{}", left, right))),
                Type::EqualEqual => Ok(Value::Boolean(left == right)),
                Type::BangEqual => Ok(Value::Boolean(left != right)),
                _ => Err(unsupported(operator, "STRING")),
            },
            // Ordering treats .F. as 0 and .T. as 1
            (Value::Boolean(left), Value::Boolean(right)) => {
                compare(operator, i64::from(left), i64::from(right))
                    .ok_or_else(|| unsupported(operator, "BOOLEAN"))
            }
            (Value::Null, Value::Null) => match operator.ty {
                Type::EqualEqual => Ok(Value::TRUE),
                Type::BangEqual => Ok(Value::FALSE),
                _ => Err(unsupported(operator, "NULL")),
            },
            (left, right) if left.type_name() == right.type_name() => {
                Err(unsupported(operator, left.type_name()))
            }
            (left, right) => Err(Error::runtime_error(
                operator,
                &format!(
                    "incompatible types: {} {} {}",
                    left.type_name(),
                    operator.lexeme,
                    right.type_name()
                ),
            )),
        }
    }

    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Error> {
        let operand = |value: Value| match value {
            Value::Boolean(value) => Ok(value),
            other => Err(Error::runtime_error(
                operator,
                &format!(
                    "operands of '{}' must be BOOLEAN but got {}",
                    operator.lexeme,
                    other.type_name()
                ),
            )),
        };

        let left = operand(self.visit_expr(left)?)?;

        // The right side only runs when it can still change the result
        if operator.ty == Type::Or {
            if left {
                return Ok(Value::TRUE);
            }
        } else if !left {
            return Ok(Value::FALSE);
        }

        let right = operand(self.visit_expr(right)?)?;
        Ok(Value::Boolean(right))
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let right = self.visit_expr(right)?;
        match (operator.ty, right) {
            (Type::Bang, Value::Boolean(value)) => Ok(Value::Boolean(!value)),
            (Type::Minus, Value::Integer(value)) => checked(operator, value.checked_neg()),
            (Type::Bang, other) => Err(Error::runtime_error(
                operator,
                &format!("operator '!' expects a BOOLEAN but got {}", other.type_name()),
            )),
            (_, other) => Err(Error::runtime_error(
                operator,
                &format!(
                    "operator '{}' expects an INTEGER but got {}",
                    operator.lexeme,
                    other.type_name()
                ),
            )),
        }
    }

    fn visit_call(&mut self, name: &Token, args: &[Expr]) -> Result<Value, Error> {
        let callee = match self.lookup(&name.lexeme) {
            Some(callee) => callee,
            None => {
                return Err(Error::runtime_error(
                    name,
                    &format!("function '{}' is not defined", name.lexeme),
                ))
            }
        };

        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.visit_expr(arg)?);
        }

        match callee {
            Value::Function(function) => function.call(self, evaluated, name),
            Value::Builtin(native) => native.call(self, evaluated, name),
            other => Err(Error::runtime_error(
                name,
                &format!(
                    "cannot call '{}' of type {}",
                    name.lexeme,
                    other.type_name()
                ),
            )),
        }
    }
}

impl StmtVisitor for Interpreter {
    type Item = Option<Value>;

    fn visit_variable_decl(&mut self, name: &Token, scope: Scope) -> Result<Self::Item, Error> {
        self.define(name, Value::FALSE, scope, false)?;
        Ok(None)
    }

    fn visit_assignment(&mut self, name: &Token, value: &Expr) -> Result<Self::Item, Error> {
        let value = self.visit_expr(value)?;
        self.define(name, value, Scope::Private, false)?;
        Ok(None)
    }

    fn visit_function(
        &mut self,
        name: &Token,
        params: &[Token],
        body: &Rc<[Stmt]>,
    ) -> Result<Self::Item, Error> {
        let function = Value::Function(Rc::new(Function::new(
            Rc::clone(&self.env),
            name,
            params,
            body,
        )));
        self.define(name, function.clone(), Scope::Private, true)?;
        Ok(Some(function))
    }

    fn visit_do_while(
        &mut self,
        token: &Token,
        condition: &Expr,
        body: &[Stmt],
    ) -> Result<Self::Item, Error> {
        while self.condition(token, condition, "do while condition")? {
            match self.execute_block(body) {
                Ok(_) | Err(Error::Loop) => {}
                Err(Error::Exit) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    fn visit_do_case(
        &mut self,
        token: &Token,
        branches: &[CaseBranch],
        otherwise: Option<&[Stmt]>,
    ) -> Result<Self::Item, Error> {
        for branch in branches {
            if self.condition(token, &branch.condition, "case condition")? {
                return self.execute_block(&branch.body);
            }
        }

        match otherwise {
            Some(body) => self.execute_block(body),
            None => Ok(None),
        }
    }

    fn visit_if(
        &mut self,
        _: &Token,
        condition: &Expr,
        consequence: &[Stmt],
        alternative: Option<&[Stmt]>,
    ) -> Result<Self::Item, Error> {
        // Anything but .T. takes the alternative
        if self.visit_expr(condition)?.is_true() {
            self.execute_block(consequence)
        } else if let Some(alternative) = alternative {
            self.execute_block(alternative)
        } else {
            Ok(None)
        }
    }

    fn visit_return(&mut self, _: &Token, value: &Expr) -> Result<Self::Item, Error> {
        let value = self.visit_expr(value)?;
        Err(Error::Return(value))
    }

    fn visit_print(&mut self, token: &Token, arguments: &[Expr]) -> Result<Self::Item, Error> {
        let mut values = Vec::with_capacity(arguments.len());
        for arg in arguments {
            values.push(self.visit_expr(arg)?.to_string());
        }

        writeln!(self.stdout.borrow_mut(), "{}", values.join(" ")).map_err(|err| {
            Error::runtime_error(token, &format!("failed to write output: {}", err))
        })?;
        Ok(None)
    }

    fn visit_exit(&mut self, _: &Token) -> Result<Self::Item, Error> {
        Err(Error::Exit)
    }

    fn visit_loop(&mut self, _: &Token) -> Result<Self::Item, Error> {
        Err(Error::Loop)
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<Self::Item, Error> {
        Ok(Some(self.visit_expr(expression)?))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::str;

    use pretty_assertions::assert_eq;

    use crate::builtins::Builtins;
    use crate::callable::Callable;
    use crate::error::Error;
    use crate::interpreter::Interpreter;
    use crate::parser::parse;
    use crate::value::Value;

    fn run_with(
        mut interpreter: Interpreter,
        output: &Rc<RefCell<Vec<u8>>>,
        src: &str,
    ) -> (Result<Option<Value>, Error>, String) {
        let program = match parse(src) {
            Ok(program) => program,
            Err(errs) => panic!("failed to parse {:?}: {:?}", src, errs),
        };
        let result = interpreter.interpret(&program);
        let printed = String::from(str::from_utf8(&output.borrow()).unwrap());
        (result, printed)
    }

    fn run(src: &str) -> (Result<Option<Value>, Error>, String) {
        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        run_with(Interpreter::new(output.clone()), &output, src)
    }

    fn eval(src: &str) -> Value {
        match run(src).0 {
            Ok(Some(value)) => value,
            other => panic!("expected a value from {:?}, got {:?}", src, other),
        }
    }

    fn runtime_error(src: &str) -> String {
        match run(src).0 {
            Err(Error::RuntimeError { msg, .. }) => msg,
            other => panic!("expected a runtime error from {:?}, got {:?}", src, other),
        }
    }

    fn output(src: &str) -> String {
        let (result, printed) = run(src);
        if let Err(err) = result {
            panic!("{:?} failed: {}", src, err);
        }
        printed
    }

    #[test]
    fn test_expressions() {
        let tests = [
            ("5 + 5 * 2", Value::from(15)),
            ("2 * (5 + 10)", Value::from(30)),
            ("7 / 2", Value::from(3)),
            ("-7 / 2", Value::from(-3)),
            ("-(3 - 10)", Value::from(7)),
            ("7 % 3", Value::from(1)),
            ("-7 % 3", Value::from(-1)),
            ("2 ^ 10", Value::from(1024)),
            ("2 ^ 3 ^ 2", Value::from(512)),
            ("-2 ^ 2", Value::from(-4)),
            ("(-2) ^ 3", Value::from(-8)),
            ("5 ^ 0", Value::from(1)),
            ("-1 ^ 4294967297", Value::from(-1)),
            ("(-1) ^ 4294967297", Value::from(-1)),
            ("1 ^ 9223372036854775807", Value::from(1)),
            ("1 + 10 % 4 * 2 ^ 2", Value::from(9)),
            ("'fox' + 'lite'", Value::from("foxlite")),
            ("'a' == 'a'", Value::TRUE),
            ("'a' != 'a'", Value::FALSE),
            ("1 < 2", Value::TRUE),
            ("2 <= 1", Value::FALSE),
            ("3 == 3", Value::TRUE),
            (".t. > .f.", Value::TRUE),
            (".f. >= .t.", Value::FALSE),
            (".t. == .t.", Value::TRUE),
            (".null. == .null.", Value::TRUE),
            (".null. != .null.", Value::FALSE),
            ("!.f.", Value::TRUE),
            (".t. and .f.", Value::FALSE),
            (".f. or .t.", Value::TRUE),
            (".null.", Value::NULL),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), expected, "source: {:?}", src);
        }
    }

    #[test]
    fn test_runtime_errors() {
        let tests = [
            ("10 / 0", "division by zero"),
            ("9223372036854775807 + 1", "integer overflow"),
            ("10 % 0", "modulo by zero"),
            ("(-9223372036854775807 - 1) % -1", "integer overflow"),
            ("2 ^ 63", "integer overflow"),
            ("3 ^ 4294967296", "integer overflow"),
            ("2 ^ -1", "negative exponent -1"),
            ("'a' % 'b'", "operator '%' is not supported for STRING"),
            (".t. ^ .t.", "operator '^' is not supported for BOOLEAN"),
            ("1 + 'a'", "incompatible types: INTEGER + STRING"),
            ("'a' < 'b'", "operator '<' is not supported for STRING"),
            (".t. + .t.", "operator '+' is not supported for BOOLEAN"),
            (".null. == 0", "incompatible types: NULL == INTEGER"),
            ("!1", "operator '!' expects a BOOLEAN but got INTEGER"),
            ("-'a'", "operator '-' expects an INTEGER but got STRING"),
            ("1 and .t.", "operands of 'and' must be BOOLEAN but got INTEGER"),
            (".f. or 'x'", "operands of 'or' must be BOOLEAN but got STRING"),
            ("foo", "variable 'foo' is not defined"),
            ("foo()", "function 'foo' is not defined"),
            ("x = 1\nx()", "cannot call 'x' of type INTEGER"),
            ("do while 1\nenddo", "do while condition must be a BOOLEAN but got INTEGER"),
            ("do case\ncase 'x'\nendcase", "case condition must be a BOOLEAN but got STRING"),
            ("len(1)", "len() expects a STRING but got INTEGER"),
            (
                "function f(a)\nendfunc\nf(1, 2)",
                "function 'f' takes 1 arguments but 2 were given",
            ),
        ];

        for (src, expected) in tests {
            assert_eq!(runtime_error(src), expected, "source: {:?}", src);
        }
    }

    #[test]
    fn test_runtime_error_line() {
        let (result, _) = run("x = 1\n\ny = x / 0");
        assert_eq!(
            result.unwrap_err().to_string(),
            "[line 3] runtime error: division by zero"
        );
    }

    #[test]
    fn test_error_stops_evaluation() {
        let (result, printed) = run("? 1\n? 1 / 0, 2\n? 3");
        assert!(result.is_err());
        assert_eq!(printed, "1\n");
    }

    // Runs `src` with a `touch()` builtin that counts its calls and returns .T.
    fn run_counting(src: &str) -> (Result<Option<Value>, Error>, String, usize) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut builtins = Builtins::standard();
        builtins.define("touch", move |_| {
            counter.set(counter.get() + 1);
            Ok(Value::TRUE)
        });

        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let interpreter = Interpreter::with_builtins(output.clone(), builtins);
        let (result, printed) = run_with(interpreter, &output, src);
        (result, printed, calls.get())
    }

    #[test]
    fn test_short_circuit() {
        let src = "? .t. or touch()\n? .f. and touch()\n? .f. or touch()\n? .t. and touch()";
        let (result, printed, calls) = run_counting(src);

        assert!(result.is_ok());
        assert_eq!(printed, ".T.\n.F.\n.T.\n.T.\n");
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_arguments_stop_at_first_error() {
        let src = "function f(a, b, c)\nendfunc\nf(touch(), 1 / 0, touch())";
        let (result, _, calls) = run_counting(src);

        assert_eq!(
            result.unwrap_err().to_string(),
            "[line 3] runtime error: division by zero"
        );
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_loop_body_error_ends_loop() {
        let src = "i = 0\ndo while .t.\ni = i + 1\n? i\nx = 1 / 0\ntouch()\nenddo\n? 'after'";
        let (result, printed, calls) = run_counting(src);

        assert_eq!(
            result.unwrap_err().to_string(),
            "[line 5] runtime error: division by zero"
        );
        assert_eq!(printed, "1\n");
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_print() {
        let tests = [
            ("? 1, 'two', .t., .null.", "1 two .T. .NULL.\n"),
            ("?", "\n"),
            ("? len", "<builtin len>\n"),
            ("function f\nendfunc\n? f", "<function f>\n"),
            ("? type(1), type('s'), type(.f.), type(.null.), type(len)", "N C L X U\n"),
        ];

        for (src, expected) in tests {
            assert_eq!(output(src), expected, "source: {:?}", src);
        }
    }

    #[test]
    fn test_declarations_default_to_false() {
        assert_eq!(eval("local x\nx"), Value::FALSE);
        assert_eq!(eval("public g\ng"), Value::FALSE);
    }

    #[test]
    fn test_public_cannot_be_narrowed() {
        let src = "public a\nfunction f()\nlocal a\nendfunc\nf()";
        assert_eq!(runtime_error(src), "invalid redefinition of variable 'a'");
        assert_eq!(
            runtime_error("local a\npublic a"),
            "invalid redefinition of variable 'a'"
        );
    }

    #[test]
    fn test_local_shadows_enclosing_private() {
        let src = "private x\nx = 1\nfunction f\nlocal x\nx = 2\n? x\nendfunc\nf()\n? x";
        assert_eq!(output(src), "2\n1\n");
    }

    #[test]
    fn test_private_is_visible_below_but_not_above() {
        let src = "function outer()\n\
                   private p\n\
                   p = 5\n\
                   function inner()\n\
                   return p\n\
                   endfunc\n\
                   return inner()\n\
                   endfunc\n\
                   ? outer()\n\
                   ? p";
        let (result, printed) = run(src);
        assert_eq!(printed, "5\n");
        match result {
            Err(Error::RuntimeError { msg, .. }) => {
                assert_eq!(msg, "variable 'p' is not defined")
            }
            other => panic!("expected p to be undefined, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_updates_shared_variables() {
        let src = "count = 0\n\
                   function bump()\n\
                   count = count + 1\n\
                   endfunc\n\
                   bump()\n\
                   bump()\n\
                   count";
        assert_eq!(eval(src), Value::from(2));

        let src = "x = 1\n\
                   function shadow()\n\
                   local x\n\
                   x = 99\n\
                   endfunc\n\
                   shadow()\n\
                   x";
        assert_eq!(eval(src), Value::from(1));
    }

    #[test]
    fn test_do_while() {
        assert_eq!(
            eval("x = 0\ndo while x < 3\n x = x + 1\nenddo\nreturn x"),
            Value::from(3)
        );

        let src = "i = 0\n\
                   do while .t.\n\
                   i = i + 1\n\
                   if i == 2\n\
                   loop\n\
                   endif\n\
                   if i > 4\n\
                   exit\n\
                   endif\n\
                   ? i\n\
                   enddo";
        assert_eq!(output(src), "1\n3\n4\n");
    }

    #[test]
    fn test_return_from_loop() {
        let src = "function find()\n\
                   i = 0\n\
                   do while .t.\n\
                   i = i + 1\n\
                   if i == 4\n\
                   return i * 10\n\
                   endif\n\
                   enddo\n\
                   ? 'unreachable'\n\
                   endfunc\n\
                   ? find()";
        assert_eq!(output(src), "40\n");
    }

    #[test]
    fn test_do_case() {
        let src = "function name(n)\n\
                   do case\n\
                   case n == 1\n\
                   return 'one'\n\
                   case n == 2\n\
                   return 'two'\n\
                   otherwise\n\
                   return 'many'\n\
                   endcase\n\
                   endfunc\n\
                   ? name(1), name(2), name(3)";
        assert_eq!(output(src), "one two many\n");
        assert_eq!(output("do case\ncase .f.\n? 1\nendcase"), "");
    }

    #[test]
    fn test_if_takes_alternative_unless_true() {
        let tests = [
            ("if .t.\n? 'yes'\nelse\n? 'no'\nendif", "yes\n"),
            ("if .f.\n? 'yes'\nelse\n? 'no'\nendif", "no\n"),
            ("if 1\n? 'yes'\nelse\n? 'no'\nendif", "no\n"),
            ("if .null.\n? 'yes'\nendif", ""),
        ];

        for (src, expected) in tests {
            assert_eq!(output(src), expected, "source: {:?}", src);
        }
    }

    #[test]
    fn test_functions() {
        let tests = [
            ("function add(a, b)\nreturn a + b\nendfunc\nadd(2, 3)", Value::from(5)),
            ("function noop\nendfunc\nnoop()", Value::TRUE),
            ("function bare\nreturn\nendfunc\nbare()", Value::TRUE),
            ("function second(a, b)\nreturn b\nendfunc\nsecond(1)", Value::FALSE),
            (
                "function fact(n)\nif n <= 1\nreturn 1\nendif\nreturn n * fact(n - 1)\nendfunc\nfact(10)",
                Value::from(3628800),
            ),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), expected, "source: {:?}", src);
        }
    }

    #[test]
    fn test_parameters_stay_in_callee_frame() {
        let src = "n = 'outer'\n\
                   function f(n)\n\
                   n = n + 1\n\
                   return n\n\
                   endfunc\n\
                   ? f(1), n";
        assert_eq!(output(src), "2 outer\n");
    }

    #[test]
    fn test_closures_use_defining_scope() {
        let src = "x = 'global'\n\
                   function show()\n\
                   return x\n\
                   endfunc\n\
                   function caller()\n\
                   local x\n\
                   x = 'caller'\n\
                   return show()\n\
                   endfunc\n\
                   ? caller()";
        assert_eq!(output(src), "global\n");
    }

    #[test]
    fn test_function_declaration_evaluates_to_function() {
        match eval("function f\nendfunc") {
            Value::Function(function) => assert_eq!(function.name(), "f"),
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn test_call_depth_limit() {
        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let interpreter = Interpreter::new(output.clone()).max_call_depth(10);
        let src = "function down(n)\nreturn down(n + 1)\nendfunc\ndown(0)";
        let (result, _) = run_with(interpreter, &output, src);
        assert_eq!(
            result.unwrap_err().to_string(),
            "[line 2] runtime error: stack overflow: more than 10 nested calls"
        );
    }

    #[test]
    fn test_interpreter_keeps_globals() {
        let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(output.clone());

        let first = parse("x = 41\nfunction next_of(n)\nreturn n + 1\nendfunc").unwrap();
        interpreter.interpret(&first).unwrap();

        // A failing program leaves the interpreter usable
        let failing = parse("next_of(.t.)").unwrap();
        assert!(interpreter.interpret(&failing).is_err());

        let second = parse("next_of(x)").unwrap();
        assert_eq!(interpreter.interpret(&second), Ok(Some(Value::from(42))));
    }

    #[test]
    fn test_programs() {
        let tests = [
            (include_str!("../../data/fib.prg"), include_str!("../../data/fib.prg.expected")),
            (
                include_str!("../../data/counter.prg"),
                include_str!("../../data/counter.prg.expected"),
            ),
            (
                include_str!("../../data/grades.prg"),
                include_str!("../../data/grades.prg.expected"),
            ),
        ];

        for (src, expected) in tests {
            assert_eq!(output(src), expected);
        }
    }
}
