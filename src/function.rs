use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::interpreter::{Interpreter, Unwind};
use crate::stmt::Stmt;
use crate::token::Token;
use crate::value::Value;

/// A user-declared function or method, carrying the environment that was
/// active at its declaration.  Binding a method produces a fresh copy whose
/// closure gains a one-entry `this` frame.
pub struct LoxFunction {
    name: Token,
    params: Vec<Token>,
    body: Rc<Vec<Stmt>>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        name: Token,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            name,
            params,
            body,
            closure,
            is_initializer,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name.lexeme
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Produce a copy whose closure has an extra scope defining `this` as the
    /// given instance.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        debug!("Binding method '{}'", self.name.lexeme);

        let mut environment: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            name: self.name.clone(),
            params: self.params.clone(),
            body: Rc::clone(&self.body),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invoke with already-evaluated arguments.  The caller has checked arity.
    ///
    /// A `return` inside the body unwinds to here; an initializer always
    /// yields `this` regardless of how the body exited.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'_, W>,
        arguments: Vec<Value>,
    ) -> Result<Value, Unwind> {
        let mut environment: Environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.body, environment) {
            Ok(()) => {
                if self.is_initializer {
                    Ok(self.bound_this())
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    Ok(self.bound_this())
                } else {
                    Ok(value)
                }
            }

            Err(unwind) => Err(unwind),
        }
    }

    /// The `this` binding installed by `bind`.  Initializers are only ever
    /// invoked bound, so the frame is always present.
    fn bound_this(&self) -> Value {
        Environment::get_at(&self.closure, 0, "this")
            .expect("initializer invoked without a bound 'this'")
    }
}

impl fmt::Debug for LoxFunction {
    // Shallow on purpose: the closure chain can reach back to this function.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name.lexeme)
            .field("arity", &self.params.len())
            .finish()
    }
}
