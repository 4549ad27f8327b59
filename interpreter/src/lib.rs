pub mod ast;
pub mod builtins;
pub mod callable;
pub mod error;
pub mod interpreter;
pub mod limits;
pub mod parser;
pub mod repl;
pub mod value;

pub(crate) mod env;

pub use builtins::Builtins;
pub use error::Error;
pub use interpreter::Interpreter;
pub use parser::{parse, Parser};
pub use repl::Repl;
pub use value::Value;
