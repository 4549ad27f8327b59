use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::callable::{Callable, Function, Native};

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Str(Rc<str>),
    Boolean(bool),
    Null,
    Function(Rc<Function>),
    Builtin(Rc<Native>),
}

impl Value {
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);
    pub const NULL: Value = Value::Null;

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Str(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    /// Control flow only proceeds on a logical true, every other value counts as not true.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(lhs), Value::Integer(rhs)) => lhs == rhs,
            (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
            (Value::Boolean(lhs), Value::Boolean(rhs)) => lhs == rhs,
            (Value::Null, Value::Null) => true,
            (Value::Function(lhs), Value::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Builtin(lhs), Value::Builtin(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(val) => write!(f, "{}", val),
            Value::Str(val) => f.write_str(val),
            Value::Boolean(true) => f.write_str(".T."),
            Value::Boolean(false) => f.write_str(".F."),
            Value::Null => f.write_str(".NULL."),
            Value::Function(fun) => write!(f, "<function {}>", fun.name()),
            Value::Builtin(native) => write!(f, "<builtin {}>", native.name()),
        }
    }
}
