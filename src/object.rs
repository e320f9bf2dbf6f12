use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::environment::Environment;
use crate::evaluator::Evaluator;
use crate::stmt::BlockData;
use crate::token::Token;

pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);
pub const NULL: Value = Value::Null;

/// Represents a value produced by evaluation.
/// This is an enum that wraps all the possible kinds of values in the
/// language, plus the two internal wrappers that steer evaluation:
/// `Return` unwinds out of blocks and `Error` short-circuits everything.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(String),
    Array(Rc<Vec<Value>>),
    Hash(Rc<IndexMap<HashKey, Value>>),
    Null,
    Function(Function),
    Builtin(Builtin),
    Return(Box<Value>),
    Error(String),
}

impl Value {
    /// The kind name used in diagnostics.
    pub fn type_str(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Null => "NULL",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Return(_) => "RETURN",
            Value::Error(_) => "ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Null)
    }

    /// Returns the hash key of the value, if it is a hashable kind.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(value) => Some(HashKey::Integer(*value)),
            Value::Boolean(value) => Some(HashKey::Boolean(*value)),
            Value::String(value) => Some(HashKey::String(value.clone())),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        if value { TRUE } else { FALSE }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl Display for Value {
    /// The canonical external textual form of a value.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::Array(elements) => {
                let elements = elements.iter()
                    .map(Value::to_string)
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "[{elements}]")
            },
            Value::Hash(pairs) => {
                let pairs = pairs.iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "{{{pairs}}}")
            },
            Value::Null => write!(f, "null"),
            Value::Function(function) => write!(f, "{function}"),
            Value::Builtin(builtin) => write!(f, "{builtin}"),
            Value::Return(value) => write!(f, "{value}"),
            Value::Error(message) => write!(f, "ERROR: {message}"),
        }
    }
}

/// A key of a hash value. Restricted to the kinds with a stable,
/// equality-respecting hash: two values map to the same key iff their kinds
/// match and their payloads compare equal.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HashKey::Integer(value) => write!(f, "{value}"),
            HashKey::Boolean(value) => write!(f, "{value}"),
            HashKey::String(value) => write!(f, "{value}"),
        }
    }
}

/// A function value: parameter names, a body block and the environment that
/// was current at the definition site (the closure).
#[derive(Clone)]
pub struct Function {
    pub parameters: Vec<Token>,
    pub body: BlockData,
    pub env: Rc<RefCell<Environment>>,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.parameters == other.parameters
            && self.body == other.body
            && Rc::ptr_eq(&self.env, &other.env)
    }
}

impl Debug for Function {
    // The captured environment is skipped: scope chains can be cyclic
    // through closures and recursing into them would not terminate.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parameters = self.parameters.iter()
            .map(|parameter| parameter.lexeme.clone())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "fn({parameters}) {{\n{}\n}}", self.body)
    }
}

/// A host-provided function exposed to the language.
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: fn(&mut Evaluator<'_>, Vec<Value>) -> Value,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.func == other.func
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<builtin fn {}>", self.name)
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<builtin fn {}>", self.name)
    }
}
