use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::function::LoxFunction;
use crate::interpreter::{Interpreter, Unwind};
use crate::value::Value;

/// A class: a name, an optional superclass and a method table.  Method lookup
/// walks up the superclass chain; the first hit wins.
#[derive(Debug)]
pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        if let Some(superclass) = &self.superclass {
            return superclass.find_method(name);
        }

        None
    }

    /// Calling a class constructs an instance: arity is the initializer's, or
    /// zero when the class declares none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Instantiate, running `init` bound to the fresh instance when present.
    /// The instance is returned regardless of what `init` evaluates to.
    pub fn construct<W: Write>(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter<'_, W>,
        arguments: Vec<Value>,
    ) -> Result<Value, Unwind> {
        debug!("Constructing instance of '{}'", class.name);

        let instance: Rc<RefCell<LoxInstance>> =
            Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method("init") {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// An instance: a back-reference to its class plus a field map grown
/// dynamically by assignment.
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    #[inline]
    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Property lookup: fields shadow methods; a found method is bound to the
    /// receiver.  `None` means undefined property.
    pub fn get(this: &Rc<RefCell<LoxInstance>>, name: &str) -> Option<Value> {
        if let Some(field) = this.borrow().fields.get(name) {
            return Some(field.clone());
        }

        let method: Option<Rc<LoxFunction>> = this.borrow().class.find_method(name);

        method.map(|m| Value::Function(Rc::new(m.bind(Rc::clone(this)))))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl fmt::Debug for LoxInstance {
    // Shallow on purpose: fields can hold this very instance.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .finish()
    }
}
