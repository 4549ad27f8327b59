use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use foxlite_core::Token;
use tracing::debug;

use crate::ast::{Scope, Stmt};
use crate::env::Environment;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(crate) trait Callable {
    fn name(&self) -> &str;

    // `token` is the callee name at the call site, used to place errors
    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        token: &Token,
    ) -> Result<Value, Error>;
}

/// Signature of a builtin. Builtins check their own arity and argument types and report
/// problems as a message, which the interpreter turns into a runtime error at the call site.
pub type NativeFunction = Box<dyn Fn(&[Value]) -> Result<Value, String>>;

// `Native` bridges rust closures and FoxLite calls. They live in the builtin registry.
pub struct Native {
    name: String,
    func: NativeFunction,
}

impl Native {
    pub(crate) fn new(name: &str, func: NativeFunction) -> Self {
        Native {
            name: String::from(name),
            func,
        }
    }
}

impl Debug for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

impl Callable for Native {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(
        self: Rc<Self>,
        _: &mut Interpreter,
        args: Vec<Value>,
        token: &Token,
    ) -> Result<Value, Error> {
        (self.func)(&args).map_err(|msg| Error::runtime_error(token, &msg))
    }
}

pub struct Function {
    name: String,
    params: Vec<String>,
    body: Rc<[Stmt]>,
    closure: Rc<RefCell<Environment>>,
}

impl Function {
    // The closure keeps the defining frame alive. Since the function is also stored in that
    // frame the two form a cycle and are only freed with the interpreter's process.
    pub(crate) fn new(
        closure: Rc<RefCell<Environment>>,
        name: &Token,
        params: &[Token],
        body: &Rc<[Stmt]>,
    ) -> Self {
        Function {
            name: name.lexeme.clone(),
            params: params.iter().map(|param| param.lexeme.clone()).collect(),
            body: Rc::clone(body),
            closure,
        }
    }
}

// Printing the closure would walk back into this function through the environment
impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        token: &Token,
    ) -> Result<Value, Error> {
        if args.len() > self.params.len() {
            return Err(Error::runtime_error(
                token,
                &format!(
                    "function '{}' takes {} arguments but {} were given",
                    self.name,
                    self.params.len(),
                    args.len()
                ),
            ));
        }

        if interpreter.depth >= interpreter.max_depth {
            return Err(Error::runtime_error(
                token,
                &format!(
                    "stack overflow: more than {} nested calls",
                    interpreter.max_depth
                ),
            ));
        }

        // Parameters always land in the new frame, unpassed ones start as .F.
        let mut env = Environment::with(Rc::clone(&self.closure));
        let mut args = args.into_iter();
        for param in &self.params {
            let value = args.next().unwrap_or(Value::FALSE);
            // A fresh frame only ever holds other parameters, all local
            let _ = env.set(param, value, Scope::Local, true);
        }

        debug!(
            function = %self.name,
            depth = interpreter.depth + 1,
            "calling function"
        );

        interpreter.depth += 1;
        let result = interpreter.execute_block_with_env(&self.body, Rc::new(RefCell::new(env)));
        interpreter.depth -= 1;

        // Falling off the end of a function returns .T.
        match result {
            Ok(_) => Ok(Value::TRUE),
            Err(Error::Return(value)) => Ok(value),
            Err(err) => Err(err),
        }
    }
}
