use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::ast::Scope;
use crate::value::Value;

#[derive(Debug, Clone)]
struct Symbol {
    value: Value,
    scope: Scope,
}

/// One frame of the scope chain. The root frame belongs to the interpreter, every function
/// call gets a fresh frame whose parent is the function's closure, not the caller's frame.
#[derive(Debug)]
pub(crate) struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: AHashMap<String, Symbol>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct InvalidRedefinition;

impl Environment {
    pub(crate) fn new() -> Self {
        Environment {
            enclosing: None,
            values: AHashMap::new(),
        }
    }

    pub(crate) fn with(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            enclosing: Some(enclosing),
            values: AHashMap::new(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Value> {
        if let Some(symbol) = self.values.get(name) {
            Some(symbol.value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub(crate) fn scope_of(&self, name: &str) -> Option<Scope> {
        if let Some(symbol) = self.values.get(name) {
            Some(symbol.scope)
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().scope_of(name)
        } else {
            None
        }
    }

    /// Binds `name` to `value`.
    ///
    /// A name already present in this frame is updated in place; it can't be widened to
    /// public when it was declared local or private, and a public name can't be narrowed to
    /// local. Otherwise, unless `restrict` is set, the nearest enclosing frame that holds the
    /// name as public or private is updated. Asking for a local binding never updates an
    /// outer frame but still fails when the outer name is public. Anything else creates a new
    /// entry in this frame.
    pub(crate) fn set(
        &mut self,
        name: &str,
        value: Value,
        scope: Scope,
        restrict: bool,
    ) -> Result<(), InvalidRedefinition> {
        if let Some(symbol) = self.values.get_mut(name) {
            return match (symbol.scope, scope) {
                (Scope::Local | Scope::Private, Scope::Public) => Err(InvalidRedefinition),
                (Scope::Public, Scope::Local) => Err(InvalidRedefinition),
                _ => {
                    symbol.value = value;
                    Ok(())
                }
            };
        }

        if !restrict {
            if let Some(enclosing) = &self.enclosing {
                if enclosing.borrow_mut().update_shared(name, &value, scope)? {
                    return Ok(());
                }
            }
        }

        self.values.insert(String::from(name), Symbol { value, scope });
        Ok(())
    }

    // Walks the chain looking for the nearest frame holding `name`. Returns whether the value
    // was stored there.
    fn update_shared(
        &mut self,
        name: &str,
        value: &Value,
        scope: Scope,
    ) -> Result<bool, InvalidRedefinition> {
        if let Some(symbol) = self.values.get_mut(name) {
            return match (symbol.scope, scope) {
                (Scope::Public, Scope::Local) => Err(InvalidRedefinition),
                (Scope::Local, _) | (_, Scope::Local) => Ok(false),
                _ => {
                    symbol.value = value.clone();
                    Ok(true)
                }
            };
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().update_shared(name, value, scope),
            None => Ok(false),
        }
    }
}
