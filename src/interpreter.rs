//! Tree-walk evaluator.
//!
//! Holds the globals frame (pre-populated with the native `clock`), the
//! current environment, and the resolver's binding-distance table.  Program
//! output goes to an injected `Write` sink so the interpreter can be driven
//! entirely in-memory by tests.
//!
//! Two conditions unwind through the evaluator as [`Unwind`] values rather
//! than ordinary results threaded by hand: `return`, caught at the
//! function-call boundary, and runtime errors, caught at the top of
//! [`Interpreter::interpret`].  Every block restores the enclosing
//! environment pointer on all exit paths; nothing else is allowed to touch it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::Expr;
use crate::function::LoxFunction;
use crate::stmt::Stmt;
use crate::token::{Literal, Token, TokenType};
use crate::value::Value;

/// Non-local exit crossing arbitrarily many AST nodes.
#[derive(Debug)]
pub enum Unwind {
    /// A `return` statement; caught at the function-call boundary.
    Return(Value),

    /// A runtime error; caught only at the top of `interpret`.
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(e: LoxError) -> Self {
        Unwind::Error(e)
    }
}

impl From<io::Error> for Unwind {
    fn from(e: io::Error) -> Self {
        Unwind::Error(LoxError::Io(e))
    }
}

pub struct Interpreter<'o, W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<usize, usize>,
    output: &'o mut W,
}

impl<'o, W: Write> Interpreter<'o, W> {
    pub fn new(output: &'o mut W) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        info!("Interpreter initialized; globals populated");

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record that the expression with the given id binds `depth` scopes up.
    /// Called by the resolver; absence of an entry means "global".
    pub fn note_local(&mut self, id: usize, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Execute top-level statements in order.  Runtime errors unwind to here;
    /// the resolver has already rejected top-level `return`.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(e)) => return Err(e),

                Err(Unwind::Return(_)) => return Ok(()),
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Function { name, params, body } => {
                let function = LoxFunction::new(
                    name.clone(),
                    params.clone(),
                    Rc::new(body.clone()),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Block(statements) => self.execute_block(
                statements,
                Environment::with_enclosing(Rc::clone(&self.environment)),
            ),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Return { keyword: _, value } => {
                let value: Value = if let Some(expr) = value {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` in a fresh frame.  The current-environment pointer is
    /// restored on every exit path: normal completion, return, or error.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> Result<(), Unwind> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = Rc::new(RefCell::new(environment));

        let mut result: Result<(), Unwind> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Stmt],
    ) -> Result<(), Unwind> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let culprit: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };

                    return Err(LoxError::runtime(culprit, "Superclass must be a class.").into());
                }
            },

            None => None,
        };

        // Two-stage definition so methods can close over the class name.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        if let Some(sc) = &superclass_value {
            let mut super_env: Environment =
                Environment::with_enclosing(Rc::clone(&self.environment));
            super_env.define("super", Value::Class(Rc::clone(sc)));

            self.environment = Rc::new(RefCell::new(super_env));
        }

        let mut method_table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for method in methods {
            if let Stmt::Function {
                name: method_name,
                params,
                body,
            } = method
            {
                let is_initializer: bool = method_name.lexeme == "init";

                let function = LoxFunction::new(
                    method_name.clone(),
                    params.clone(),
                    Rc::new(body.clone()),
                    Rc::clone(&self.environment),
                    is_initializer,
                );

                method_table.insert(method_name.lexeme.clone(), Rc::new(function));
            }
        }

        self.environment = previous;

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_table);

        debug!("Defined class '{}'", name.lexeme);

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::None => Value::Nil,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::String(s.clone()),
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                match operator.token_type {
                    TokenType::OR if left_val.is_truthy() => Ok(left_val),

                    TokenType::AND if !left_val.is_truthy() => Ok(left_val),

                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { name, id } => self.look_up_variable(name, *id),

            Expr::This { keyword, id } => self.look_up_variable(keyword, *id),

            Expr::Assign { name, value, id } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),

                    None => self.globals.borrow_mut().assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(LoxError::runtime(
                        name,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                    .into());
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, &name.lexeme)
                    .ok_or_else(|| {
                        Unwind::from(LoxError::runtime(
                            name,
                            format!("Undefined property '{}'.", name.lexeme),
                        ))
                    }),

                _ => Err(LoxError::runtime(name, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;

                    instance.borrow_mut().set(&name.lexeme, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name, "Only instances have fields.").into()),
            },

            Expr::Super {
                keyword,
                method,
                id,
            } => self.evaluate_super(keyword, method, *id),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Unwind> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(LoxError::runtime(operator, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Unwind> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(LoxError::runtime(operator, "Cannot divide by zero.").into())
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
            },

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        arguments: &[Expr],
    ) -> Result<Value, Unwind> {
        let callee_val: Value = self.evaluate(callee)?;

        let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());

        for arg in arguments {
            arg_values.push(self.evaluate(arg)?);
        }

        match callee_val {
            Value::Function(function) => {
                self.check_arity(function.arity(), arg_values.len(), paren)?;

                function.call(self, arg_values)
            }

            Value::Class(class) => {
                self.check_arity(class.arity(), arg_values.len(), paren)?;

                LoxClass::construct(&class, self, arg_values)
            }

            Value::NativeFunction { arity, func, .. } => {
                self.check_arity(arity, arg_values.len(), paren)?;

                func(&arg_values).map_err(|msg| LoxError::runtime(paren, msg).into())
            }

            _ => Err(LoxError::runtime(paren, "Can only call functions and classes.").into()),
        }
    }

    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> Result<(), Unwind> {
        if expected != got {
            return Err(LoxError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", expected, got),
            )
            .into());
        }

        Ok(())
    }

    /// `super.method`: the superclass sits at the resolved distance, the
    /// receiver one frame below it.
    fn evaluate_super(
        &mut self,
        keyword: &Token,
        method: &Token,
        id: usize,
    ) -> Result<Value, Unwind> {
        let distance: usize = *self
            .locals
            .get(&id)
            .expect("resolver records every reachable 'super'");

        let superclass: Rc<LoxClass> =
            match Environment::get_at(&self.environment, distance, "super") {
                Some(Value::Class(class)) => class,

                _ => {
                    return Err(
                        LoxError::runtime(keyword, "Could not resolve 'super'.").into()
                    )
                }
            };

        let instance: Value = Environment::get_at(&self.environment, distance - 1, "this")
            .expect("'this' is bound one frame below 'super'");

        let function: Rc<LoxFunction> =
            superclass.find_method(&method.lexeme).ok_or_else(|| {
                Unwind::from(LoxError::runtime(
                    method,
                    format!("Undefined property '{}'.", method.lexeme),
                ))
            })?;

        match instance {
            Value::Instance(instance) => Ok(Value::Function(Rc::new(function.bind(instance)))),

            _ => Err(LoxError::runtime(keyword, "Could not resolve 'this'.").into()),
        }
    }

    fn look_up_variable(&self, name: &Token, id: usize) -> Result<Value, Unwind> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme),

            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            Unwind::from(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        })
    }
}

fn clock_native(_args: &[Value]) -> Result<Value, String> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
