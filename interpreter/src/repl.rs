use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use tracing::warn;

use crate::interpreter::Interpreter;
use crate::parser::parse;

const PROMPT: &str = ">> ";
const CONTINUATION_PROMPT: &str = ".. ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive read-loop. Lines ending in `;` are buffered and joined with the next line,
/// anything else runs the buffered source as one program. Prompts, results and errors go
/// to the same writer the interpreter prints to.
pub struct Repl {
    interpreter: Interpreter,
    output: Rc<RefCell<dyn Write>>,
    buffer: String,
}

impl Repl {
    pub fn new(output: Rc<RefCell<dyn Write>>) -> Self {
        Self::with_interpreter(Interpreter::new(Rc::clone(&output)), output)
    }

    pub fn with_interpreter(interpreter: Interpreter, output: Rc<RefCell<dyn Write>>) -> Self {
        Repl {
            interpreter,
            output,
            buffer: String::new(),
        }
    }

    /// Reads lines until the input ends or the user types `quit`.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        self.prompt()?;
        for line in input.lines() {
            if self.feed(&line?)? == Flow::Quit {
                break;
            }
            self.prompt()?;
        }
        Ok(())
    }

    pub fn feed(&mut self, line: &str) -> io::Result<Flow> {
        let line = line.trim_end();

        if self.buffer.is_empty() {
            if line.trim().eq_ignore_ascii_case("quit") {
                return Ok(Flow::Quit);
            }
            if line.trim().is_empty() {
                return Ok(Flow::Continue);
            }
        }

        if let Some(line) = line.strip_suffix(';') {
            self.buffer.push_str(line);
            self.buffer.push('\n');
            return Ok(Flow::Continue);
        }

        self.buffer.push_str(line);
        let src = std::mem::take(&mut self.buffer);
        self.evaluate(&src)?;
        Ok(Flow::Continue)
    }

    fn evaluate(&mut self, src: &str) -> io::Result<()> {
        let program = match parse(src) {
            Ok(program) => program,
            Err(errs) => {
                warn!(errors = errs.len(), "discarding input");
                let mut output = self.output.borrow_mut();
                for err in errs {
                    writeln!(output, "{}", err)?;
                }
                return Ok(());
            }
        };

        match self.interpreter.interpret(&program) {
            Ok(Some(value)) => writeln!(self.output.borrow_mut(), "{}", value),
            Ok(None) => Ok(()),
            Err(err) => writeln!(self.output.borrow_mut(), "{}", err),
        }
    }

    fn prompt(&mut self) -> io::Result<()> {
        let prompt = if self.buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };

        let mut output = self.output.borrow_mut();
        output.write_all(prompt.as_bytes())?;
        output.flush()
    }
}
