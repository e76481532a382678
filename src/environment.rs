use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of the scope chain: a local map plus an optional link to the
/// enclosing frame.  The chain is acyclic; frames are shared (`Rc`) because
/// closures keep their defining frame alive past block exit.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look up `name`, walking the enclosing chain.  `None` means undefined.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Overwrite an existing binding, walking the enclosing chain.  Returns
    /// whether a binding was found.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Walk exactly `distance` enclosing links.  The resolver only records a
    /// distance when the frame exists, so the chain cannot run out here.
    pub fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut environment: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = environment
                .borrow()
                .enclosing
                .clone()
                .expect("resolved distance exceeds environment chain");

            environment = enclosing;
        }

        environment
    }

    /// Read `name` in the frame exactly `distance` links up, without falling
    /// back to outer frames.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        Self::ancestor(env, distance).borrow().values.get(name).cloned()
    }

    /// Write `name` in the frame exactly `distance` links up.  Returns whether
    /// the binding existed.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        let frame: Rc<RefCell<Environment>> = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        if frame.values.contains_key(name) {
            frame.values.insert(name.to_string(), value);
            true
        } else {
            false
        }
    }
}
