use crate::expr::Expr;
use crate::token::Token;

/// Statement nodes.
///
/// There is no `For` variant: the parser desugars `for` loops into an
/// initializer block wrapping a `While`.  Class methods are stored as
/// `Stmt::Function` nodes inside `Stmt::Class`.
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Stmt>),

    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Stmt>,
    },

    Expression(Expr),

    Function {
        name: Token,
        params: Vec<Token>,
        body: Vec<Stmt>,
    },

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Print(Expr),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}
