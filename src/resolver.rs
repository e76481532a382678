//! Static resolution pass for the Lox interpreter.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<String,bool>`
//!    tracking declared (false) and fully defined (true) names in each nested
//!    block, function or class body.
//! 2. **Enforce static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, invalid `return` placement, and illegal
//!    use of `this`/`super` outside their classes.
//! 3. **Record binding distances**: for every `Variable`, `Assign`, `This` and
//!    `Super` occurrence, calls back into the interpreter to note how many
//!    frames up the binding lives.  Occurrences with no recorded distance
//!    resolve against the globals at runtime.
//!
//! Static errors are sent to the [`ErrorReporter`] and the walk continues, so
//! a single pass surfaces every violation it can find.  Evaluation must not
//! run when the reporter's compile flag is set afterwards.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::error::{ErrorReporter, LoxError};
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::stmt::Stmt;
use crate::token::Token;

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'a, 'o, W: Write> {
    interpreter: &'a mut Interpreter<'o, W>,
    reporter: &'a mut ErrorReporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'o, W: Write> Resolver<'a, 'o, W> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'a mut Interpreter<'o, W>, reporter: &'a mut ErrorReporter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top-level statements.  Errors are reported, not returned.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                // 1. Self-inheritance guard (by lexeme equality).
                if let Some(Expr::Variable {
                    name: super_name, ..
                }) = superclass
                {
                    if super_name.lexeme == name.lexeme {
                        let err =
                            LoxError::resolve(super_name, "A class can't inherit from itself.");
                        self.reporter.error(&err);
                    }
                }

                // 2. Declare & define the class name so methods can refer to it.
                self.declare(name);
                self.define(name);

                // 3. Save and enter the class context.
                let enclosing_class: ClassType = self.current_class;

                self.current_class = if superclass.is_some() {
                    ClassType::Subclass
                } else {
                    ClassType::Class
                };

                // 4. If there is a superclass, resolve it and bind `super`.
                if let Some(super_expr) = superclass {
                    self.resolve_expr(super_expr);

                    self.begin_scope();
                    self.scope_insert("super", true);
                }

                // 5. Open the implicit `this` scope for methods.
                self.begin_scope();
                self.scope_insert("this", true);

                // 6. Resolve each method in its own function context.
                for method in methods {
                    if let Stmt::Function {
                        name: method_name,
                        params,
                        body,
                    } = method
                    {
                        let kind: FunctionType = if method_name.lexeme == "init" {
                            FunctionType::Initializer
                        } else {
                            FunctionType::Method
                        };

                        self.resolve_function(kind, params, body);
                    }
                }

                // 7. Close the `this` scope, then the `super` scope if opened.
                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                // 8. Restore the outer class context.
                self.current_class = enclosing_class;
            }

            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declare first so the initializer sees the name as
                // "declared but unusable".
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // Declare & define eagerly to allow recursion.
                self.declare(name);
                self.define(name);

                self.resolve_function(FunctionType::Function, params, body);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    let err = LoxError::resolve(keyword, "'return' used outside of function");
                    self.reporter.error(&err);
                }

                if let Some(expr) = value {
                    // In an initializer, only bare `return;` is allowed.
                    if self.current_function == FunctionType::Initializer {
                        let err = LoxError::resolve(
                            keyword,
                            "Can't return a value from an initializer.",
                        );
                        self.reporter.error(&err);
                    }

                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {
                // Literals have no sub-expressions.
            }

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { name, id } => {
                // Prevent reading a variable in its own initializer.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        let err = LoxError::resolve(
                            name,
                            "Cannot read local variable in its own initializer",
                        );
                        self.reporter.error(&err);
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { name, value, id } => {
                // Resolve the right-hand side first, then bind the target.
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { keyword, id } => {
                if self.current_class == ClassType::None {
                    let err = LoxError::resolve(keyword, "Cannot use 'this' outside of a class");
                    self.reporter.error(&err);
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { keyword, id, .. } => {
                if self.current_class == ClassType::None {
                    let err = LoxError::resolve(keyword, "Cannot use 'super' outside of a class.");
                    self.reporter.error(&err);
                    return;
                }

                if self.current_class != ClassType::Subclass {
                    let err = LoxError::resolve(
                        keyword,
                        "Cannot use 'super' in a class with no superclass.",
                    );
                    self.reporter.error(&err);
                    return;
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, kind: FunctionType, params: &[Token], body: &[Stmt]) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in params {
            self.declare(param);
            self.define(param);
        }

        for stmt in body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn scope_insert(&mut self, name: &str, defined: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), defined);
        }
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                let err = LoxError::resolve(name, "Variable already declared in this scope");
                self.reporter.error(&err);
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it for the
    /// globals when no scope defines the name.
    fn resolve_local(&mut self, id: usize, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
