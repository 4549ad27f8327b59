use std::rc::Rc;

use ahash::AHashMap;

use crate::callable::Native;
use crate::value::Value;

/// Name to native function table consulted when a call target is not found in the
/// environment. Every interpreter owns its own registry.
pub struct Builtins {
    functions: AHashMap<String, Rc<Native>>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    /// An empty registry.
    pub fn new() -> Self {
        Builtins {
            functions: AHashMap::new(),
        }
    }

    /// The registry every interpreter starts with: `len`, `type`, `alltrim`, `upper`,
    /// `lower` and `str`.
    pub fn standard() -> Self {
        let mut builtins = Self::new();
        builtins.define("len", len);
        builtins.define("type", type_of);
        builtins.define("alltrim", alltrim);
        builtins.define("upper", upper);
        builtins.define("lower", lower);
        builtins.define("str", to_str);
        builtins
    }

    pub fn define<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + 'static,
    {
        self.functions
            .insert(String::from(name), Rc::new(Native::new(name, Box::new(func))));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<Rc<Native>> {
        self.functions.get(name).cloned()
    }
}

fn single_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, String> {
    match args {
        [value] => Ok(value),
        _ => Err(format!(
            "{}() expects 1 argument but {} were given",
            name,
            args.len()
        )),
    }
}

fn string_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a str, String> {
    match single_arg(name, args)? {
        Value::Str(text) => Ok(text),
        other => Err(format!(
            "{}() expects a STRING but got {}",
            name,
            other.type_name()
        )),
    }
}

fn len(args: &[Value]) -> Result<Value, String> {
    let text = string_arg("len", args)?;
    Ok(Value::Integer(text.chars().count() as i64))
}

// FoxPro type letters
fn type_of(args: &[Value]) -> Result<Value, String> {
    let letter = match single_arg("type", args)? {
        Value::Str(_) => "C",
        Value::Integer(_) => "N",
        Value::Boolean(_) => "L",
        Value::Null => "X",
        Value::Function(_) | Value::Builtin(_) => "U",
    };
    Ok(Value::from(letter))
}

fn alltrim(args: &[Value]) -> Result<Value, String> {
    Ok(Value::from(string_arg("alltrim", args)?.trim()))
}

fn upper(args: &[Value]) -> Result<Value, String> {
    Ok(Value::from(string_arg("upper", args)?.to_uppercase()))
}

fn lower(args: &[Value]) -> Result<Value, String> {
    Ok(Value::from(string_arg("lower", args)?.to_lowercase()))
}

fn to_str(args: &[Value]) -> Result<Value, String> {
    match single_arg("str", args)? {
        Value::Integer(val) => Ok(Value::from(val.to_string())),
        other => Err(format!("str() expects an INTEGER but got {}", other.type_name())),
    }
}
