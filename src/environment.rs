use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Value;

/// A lexically scoped mapping from names to values. Environments form a
/// parent-linked chain: lookups walk outwards, writes stay in the innermost
/// scope. They are shared by reference so that closures keep their defining
/// scope alive.
#[derive(Debug, Default)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    variables: HashMap<String, Value>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment {
            enclosing,
            variables: HashMap::new(),
        }
    }

    /// Resolves a name, walking the enclosing chain until found or exhausted.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        None
    }

    /// Binds a name in the current scope only and returns the bound value.
    pub fn set(&mut self, name: &str, value: Value) -> Value {
        self.variables.insert(name.to_string(), value.clone());
        value
    }
}
