use std::fmt::{self, Display};

use crate::expr::Expr;
use crate::token::Token;

/// Represents a let statement's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LetData {
    pub token: Token,
    pub name: Token,
    pub value: Expr,
}

/// Represents a return statement's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReturnData {
    pub token: Token,
    pub value: Expr,
}

/// Represents an expression statement's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExpressionData {
    pub expr: Expr,
}

/// Represents a block's data in the language. Blocks only occur as the
/// branches of an if expression and the body of a function literal.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BlockData {
    pub token: Token,
    pub statements: Vec<Stmt>,
}

impl Display for BlockData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

/// Represents a statement in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Stmt {
    Let(LetData),
    Return(ReturnData),
    Expression(ExpressionData),
}

impl Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Let(data) => write!(f, "let {} = {};", data.name.lexeme, data.value),
            Stmt::Return(data) => write!(f, "return {};", data.value),
            Stmt::Expression(data) => write!(f, "{}", data.expr),
        }
    }
}

/// The compilation unit: an ordered sequence of statements.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}
