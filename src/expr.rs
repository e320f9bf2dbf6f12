use std::fmt::{self, Display};

use crate::stmt::BlockData;
use crate::token::Token;

/// Represents an identifier's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IdentifierData {
    pub name: Token,
}

/// Represents an integer literal's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IntegerData {
    pub token: Token,
    pub value: i64,
}

/// Represents a boolean literal's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BooleanData {
    pub token: Token,
    pub value: bool,
}

/// Represents a string literal's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct StringData {
    pub token: Token,
    pub value: String,
}

/// Represents a prefix expression's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PrefixData {
    pub operator: Token,
    pub right: Box<Expr>,
}

/// Represents an infix expression's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InfixData {
    pub operator: Token,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// Represents an if expression's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IfData {
    pub token: Token,
    pub condition: Box<Expr>,
    pub consequence: BlockData,
    pub alternative: Option<BlockData>,
}

/// Represents a function literal's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FunctionData {
    pub token: Token,
    pub parameters: Vec<Token>,
    pub body: BlockData,
}

/// Represents a call expression's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CallData {
    pub token: Token,
    pub function: Box<Expr>,
    pub arguments: Vec<Expr>,
}

/// Represents an array literal's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ArrayData {
    pub token: Token,
    pub elements: Vec<Expr>,
}

/// Represents a hash literal's data in the language.
/// Pairs keep their source order so the string form is deterministic.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HashData {
    pub token: Token,
    pub pairs: Vec<(Expr, Expr)>,
}

/// Represents an index expression's data in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IndexData {
    pub token: Token,
    pub left: Box<Expr>,
    pub index: Box<Expr>,
}

/// Represents an expression in the language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expr {
    Identifier(IdentifierData),
    Integer(IntegerData),
    Boolean(BooleanData),
    String(StringData),
    Prefix(PrefixData),
    Infix(InfixData),
    If(IfData),
    Function(FunctionData),
    Call(CallData),
    Array(ArrayData),
    Hash(HashData),
    Index(IndexData),
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Identifier(data) => write!(f, "{}", data.name.lexeme),
            Expr::Integer(data) => write!(f, "{}", data.value),
            Expr::Boolean(data) => write!(f, "{}", data.value),
            Expr::String(data) => write!(f, "{}", data.value),
            Expr::Prefix(data) => write!(f, "({}{})", data.operator.lexeme, data.right),
            Expr::Infix(data) => {
                write!(f, "({} {} {})", data.left, data.operator.lexeme, data.right)
            },
            Expr::If(data) => {
                write!(f, "if {} {}", data.condition, data.consequence)?;
                if let Some(alternative) = &data.alternative {
                    write!(f, " else {alternative}")?;
                }
                Ok(())
            },
            Expr::Function(data) => {
                let parameters = data.parameters.iter()
                    .map(|parameter| parameter.lexeme.clone())
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "fn({parameters}) {}", data.body)
            },
            Expr::Call(data) => {
                let arguments = data.arguments.iter()
                    .map(Expr::to_string)
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "{}({arguments})", data.function)
            },
            Expr::Array(data) => {
                let elements = data.elements.iter()
                    .map(Expr::to_string)
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "[{elements}]")
            },
            Expr::Hash(data) => {
                let pairs = data.pairs.iter()
                    .map(|(key, value)| format!("{key}:{value}"))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "{{{pairs}}}")
            },
            Expr::Index(data) => write!(f, "({}[{}])", data.left, data.index),
        }
    }
}
