use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::builtins;
use crate::environment::Environment;
use crate::expr::{Expr, HashData, IdentifierData, IfData};
use crate::object::{Function, Value, FALSE, NULL, TRUE};
use crate::stmt::{BlockData, Program, Stmt};
use crate::token::{Token, Type};

/// Walks the AST and produces a [`Value`] under an [`Environment`].
///
/// The evaluator owns the output sink that effectful builtins (`puts`) write
/// to, so callers can capture interpreted output. Everything else it needs is
/// passed per call: the environment travels with the evaluation because
/// function calls switch to the scope captured by the closure.
pub struct Evaluator<'a> {
    pub out: &'a mut dyn Write,
}

impl<'a> Evaluator<'a> {
    pub fn new(out: &'a mut dyn Write) -> Evaluator<'a> {
        Evaluator { out }
    }

    /// Evaluates a program. A `Return` produced by a top level statement is
    /// unwrapped, an `Error` is returned as is. An empty program is `null`.
    pub fn eval(&mut self, program: &Program, env: &Rc<RefCell<Environment>>) -> Value {
        let mut result = NULL;

        for statement in &program.statements {
            match self.eval_statement(statement, env) {
                Value::Return(value) => return *value,
                error @ Value::Error(_) => return error,
                value => result = value,
            }
        }

        result
    }

    /// Evaluates a block. Unlike [`Evaluator::eval`], a `Return` is not
    /// unwrapped here: it bubbles out through nested blocks so the enclosing
    /// call (or the program top level) can unwrap it.
    fn eval_block(&mut self, block: &BlockData, env: &Rc<RefCell<Environment>>) -> Value {
        let mut result = NULL;

        for statement in &block.statements {
            match self.eval_statement(statement, env) {
                signal @ (Value::Return(_) | Value::Error(_)) => return signal,
                value => result = value,
            }
        }

        result
    }

    fn eval_statement(&mut self, statement: &Stmt, env: &Rc<RefCell<Environment>>) -> Value {
        match statement {
            Stmt::Let(data) => {
                let value = self.eval_expression(&data.value, env);
                if value.is_error() {
                    return value;
                }

                env.borrow_mut().set(&data.name.lexeme, value);
                NULL
            },
            Stmt::Return(data) => {
                let value = self.eval_expression(&data.value, env);
                if value.is_error() {
                    return value;
                }

                Value::Return(Box::new(value))
            },
            Stmt::Expression(data) => self.eval_expression(&data.expr, env),
        }
    }

    fn eval_expression(&mut self, expr: &Expr, env: &Rc<RefCell<Environment>>) -> Value {
        match expr {
            Expr::Integer(data) => Value::Integer(data.value),
            Expr::Boolean(data) => Value::from(data.value),
            Expr::String(data) => Value::from(data.value.as_str()),
            Expr::Identifier(data) => self.eval_identifier(data, env),
            Expr::Prefix(data) => {
                let right = self.eval_expression(&data.right, env);
                if right.is_error() {
                    return right;
                }

                Self::eval_prefix(&data.operator, right)
            },
            Expr::Infix(data) => {
                let left = self.eval_expression(&data.left, env);
                if left.is_error() {
                    return left;
                }

                let right = self.eval_expression(&data.right, env);
                if right.is_error() {
                    return right;
                }

                Self::eval_infix(&data.operator, left, right)
            },
            Expr::If(data) => self.eval_if(data, env),
            Expr::Function(data) => Value::Function(Function {
                parameters: data.parameters.clone(),
                body: data.body.clone(),
                env: Rc::clone(env),
            }),
            Expr::Call(data) => {
                let function = self.eval_expression(&data.function, env);
                if function.is_error() {
                    return function;
                }

                let arguments = match self.eval_expressions(&data.arguments, env) {
                    Ok(arguments) => arguments,
                    Err(error) => return error,
                };

                self.apply_function(function, arguments)
            },
            Expr::Array(data) => match self.eval_expressions(&data.elements, env) {
                Ok(elements) => Value::Array(Rc::new(elements)),
                Err(error) => error,
            },
            Expr::Hash(data) => self.eval_hash_literal(data, env),
            Expr::Index(data) => {
                let left = self.eval_expression(&data.left, env);
                if left.is_error() {
                    return left;
                }

                let index = self.eval_expression(&data.index, env);
                if index.is_error() {
                    return index;
                }

                Self::eval_index(left, index)
            },
        }
    }

    /// Resolves an identifier in the environment chain, falling back to the
    /// builtin table before failing.
    fn eval_identifier(&mut self, data: &IdentifierData, env: &Rc<RefCell<Environment>>) -> Value {
        let name = &data.name.lexeme;

        if let Some(value) = env.borrow().get(name) {
            return value;
        }

        if let Some(builtin) = builtins::lookup(name) {
            return Value::Builtin(builtin);
        }

        Value::Error(format!("identifier not found: `{name}`"))
    }

    /// Evaluates an expression list left to right, stopping at the first
    /// error and returning just that error value.
    fn eval_expressions(
        &mut self,
        exprs: &[Expr],
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Vec<Value>, Value> {
        let mut values = Vec::with_capacity(exprs.len());

        for expr in exprs {
            let value = self.eval_expression(expr, env);
            if value.is_error() {
                return Err(value);
            }

            values.push(value);
        }

        Ok(values)
    }

    fn eval_prefix(operator: &Token, right: Value) -> Value {
        match operator.r#type {
            Type::Bang => match right {
                Value::Boolean(value) => Value::from(!value),
                Value::Null => TRUE,
                _ => FALSE,
            },
            Type::Minus => match right {
                Value::Integer(value) => Value::Integer(value.wrapping_neg()),
                other => Value::Error(format!("unknown operation: -{}", other.type_str())),
            },
            _ => unreachable!("parser only builds ! and - prefix expressions"),
        }
    }

    fn eval_infix(operator: &Token, left: Value, right: Value) -> Value {
        match (left, right) {
            (Value::Integer(left), Value::Integer(right)) => {
                Self::eval_integer_infix(operator, left, right)
            },
            (Value::String(left), Value::String(right)) => {
                Self::eval_string_infix(operator, left, right)
            },
            (left, right) => match operator.r#type {
                // Mixed kinds never compare equal. Same-kind values compare
                // structurally, which coincides with singleton identity for
                // booleans and null.
                Type::EqualEqual => Value::from(left == right),
                Type::BangEqual => Value::from(left != right),
                _ if left.type_str() != right.type_str() => Value::Error(format!(
                    "type missmatch: {} {} {}",
                    left.type_str(),
                    operator.lexeme,
                    right.type_str(),
                )),
                _ => Value::Error(format!(
                    "unknown operation: {} {} {}",
                    left.type_str(),
                    operator.lexeme,
                    right.type_str(),
                )),
            },
        }
    }

    /// Integer arithmetic wraps per two's-complement 64-bit semantics.
    /// Division by zero traps like any host integer division.
    fn eval_integer_infix(operator: &Token, left: i64, right: i64) -> Value {
        match operator.r#type {
            Type::Plus => Value::Integer(left.wrapping_add(right)),
            Type::Minus => Value::Integer(left.wrapping_sub(right)),
            Type::Star => Value::Integer(left.wrapping_mul(right)),
            Type::Slash => Value::Integer(left.wrapping_div(right)),
            Type::Less => Value::from(left < right),
            Type::Greater => Value::from(left > right),
            Type::EqualEqual => Value::from(left == right),
            Type::BangEqual => Value::from(left != right),
            _ => Value::Error(format!(
                "unknown operation: INTEGER {} INTEGER",
                operator.lexeme,
            )),
        }
    }

    fn eval_string_infix(operator: &Token, left: String, right: String) -> Value {
        match operator.r#type {
            Type::Plus => Value::String(left + &right),
            Type::EqualEqual => Value::from(left == right),
            Type::BangEqual => Value::from(left != right),
            _ => Value::Error(format!(
                "unknown operation: STRING {} STRING",
                operator.lexeme,
            )),
        }
    }

    fn eval_if(&mut self, data: &IfData, env: &Rc<RefCell<Environment>>) -> Value {
        let condition = self.eval_expression(&data.condition, env);
        if condition.is_error() {
            return condition;
        }

        if condition.is_truthy() {
            self.eval_block(&data.consequence, env)
        } else if let Some(alternative) = &data.alternative {
            self.eval_block(alternative, env)
        } else {
            NULL
        }
    }

    fn apply_function(&mut self, function: Value, arguments: Vec<Value>) -> Value {
        match function {
            Value::Function(function) => {
                // A fresh scope per call, enclosed by the environment that was
                // captured at the definition site. Recursive calls therefore
                // never collide.
                let mut env = Environment::new(Some(Rc::clone(&function.env)));
                for (parameter, argument) in function.parameters.iter().zip(arguments) {
                    env.set(&parameter.lexeme, argument);
                }

                let env = Rc::new(RefCell::new(env));
                match self.eval_block(&function.body, &env) {
                    Value::Return(value) => *value,
                    value => value,
                }
            },
            Value::Builtin(builtin) => (builtin.func)(self, arguments),
            other => Value::Error(format!("not a function: {}", other.type_str())),
        }
    }

    fn eval_hash_literal(&mut self, data: &HashData, env: &Rc<RefCell<Environment>>) -> Value {
        let mut pairs = IndexMap::with_capacity(data.pairs.len());

        for (key_expr, value_expr) in &data.pairs {
            let key = self.eval_expression(key_expr, env);
            if key.is_error() {
                return key;
            }

            let Some(key) = key.hash_key() else {
                return Value::Error(format!("unusable as hash key: {}", key.type_str()));
            };

            let value = self.eval_expression(value_expr, env);
            if value.is_error() {
                return value;
            }

            pairs.insert(key, value);
        }

        Value::Hash(Rc::new(pairs))
    }

    fn eval_index(left: Value, index: Value) -> Value {
        match (left, index) {
            (Value::Array(elements), Value::Integer(index)) => usize::try_from(index)
                .ok()
                .and_then(|index| elements.get(index).cloned())
                .unwrap_or(NULL),
            (Value::Hash(pairs), index) => match index.hash_key() {
                Some(key) => pairs.get(&key).cloned().unwrap_or(NULL),
                None => Value::Error(format!("unusable as hash key: {}", index.type_str())),
            },
            (left, _) => Value::Error(format!(
                "index operator not supported: {}",
                left.type_str(),
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::Lexer;
    use crate::object::HashKey;
    use crate::parser::Parser;

    fn run(input: &str) -> Value {
        let mut out = Vec::new();
        run_with_output(input, &mut out)
    }

    fn run_with_output(input: &str, out: &mut Vec<u8>) -> Value {
        let mut parser = Parser::new(Lexer::new(input));
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "parser errors: {:?}", parser.errors());

        let env = Rc::new(RefCell::new(Environment::default()));
        Evaluator::new(out).eval(&program, &env)
    }

    fn error(message: &str) -> Value {
        Value::Error(message.to_string())
    }

    #[test]
    fn integer_expressions() {
        let tests = [
            ("5", 5),
            ("10", 10),
            ("-5", -5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("5 * 2 + 10", 20),
            ("5 + 2 * 10", 25),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), Value::Integer(expected), "for input {input}");
        }
    }

    #[test]
    fn integer_arithmetic_wraps() {
        assert_eq!(run("9223372036854775807 + 1"), Value::Integer(i64::MIN));
        assert_eq!(run("-9223372036854775807 - 2"), Value::Integer(i64::MAX));
    }

    #[test]
    fn boolean_expressions() {
        let tests = [
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 < 1", false),
            ("1 > 1", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("1 == 2", false),
            ("1 != 2", true),
            ("true == true", true),
            ("false == false", true),
            ("true == false", false),
            ("true != false", true),
            ("false != true", true),
            ("(1 < 2) == true", true),
            ("(1 < 2) == false", false),
            ("(1 > 2) == true", false),
            ("(1 > 2) == false", true),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), Value::from(expected), "for input {input}");
        }
    }

    #[test]
    fn equality_across_kinds_is_false() {
        // Mixed kinds are unequal rather than a type mismatch error. Only
        // the arithmetic and ordering operators raise for mixed kinds.
        assert_eq!(run("5 == true"), FALSE);
        assert_eq!(run("5 != true"), TRUE);
        assert_eq!(run("\"5\" == 5"), FALSE);
    }

    #[test]
    fn bang_operator() {
        let tests = [
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!0", false),
            ("!\"\"", false),
            ("!!true", true),
            ("!!false", false),
            ("!!5", true),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), Value::from(expected), "for input {input}");
        }
    }

    #[test]
    fn if_else_expressions() {
        let tests = [
            ("if (true) { 10 }", Value::Integer(10)),
            ("if (false) { 10 }", NULL),
            ("if (1) { 10 }", Value::Integer(10)),
            ("if (1 < 2) { 10 }", Value::Integer(10)),
            ("if (1 > 2) { 10 }", NULL),
            ("if (1 > 2) { 10 } else { 20 }", Value::Integer(20)),
            ("if (1 < 2) { 10 } else { 20 }", Value::Integer(10)),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), expected, "for input {input}");
        }
    }

    #[test]
    fn return_statements() {
        let tests = [
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("return 2 * 5; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
            ("if (10 > 1) { if (10 > 1) { return 10; } return 1; }", 10),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), Value::Integer(expected), "for input {input}");
        }
    }

    #[test]
    fn error_handling() {
        let tests = [
            ("5 + true;", "type missmatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type missmatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operation: -BOOLEAN"),
            ("true + false;", "unknown operation: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operation: BOOLEAN + BOOLEAN"),
            ("if (10 > 1) { true + false; }", "unknown operation: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                "unknown operation: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: `foobar`"),
            ("\"Hello\" - \"World\"", "unknown operation: STRING - STRING"),
            ("{\"name\": \"Monkey\"}[fn(x) { x }];", "unusable as hash key: FUNCTION"),
            ("{fn(x) { x }: \"Monkey\"}", "unusable as hash key: FUNCTION"),
            ("5[0]", "index operator not supported: INTEGER"),
            ("[1, 2, 3][\"one\"]", "index operator not supported: ARRAY"),
            ("let f = 5; f();", "not a function: INTEGER"),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), error(expected), "for input {input}");
        }
    }

    #[test]
    fn errors_propagate_through_let() {
        assert_eq!(run("let a = 5 + true; a;"), error("type missmatch: INTEGER + BOOLEAN"));
    }

    #[test]
    fn errors_propagate_through_arguments() {
        assert_eq!(run("len(foobar)"), error("identifier not found: `foobar`"));
    }

    #[test]
    fn let_statements() {
        let tests = [
            ("let a = 5; a;", 5),
            ("let a = 5 * 5; a;", 25),
            ("let a = 5; let b = a; b;", 5),
            ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), Value::Integer(expected), "for input {input}");
        }
    }

    #[test]
    fn function_values() {
        let Value::Function(function) = run("fn(x) { x + 2; };") else {
            panic!("expected function value");
        };

        assert_eq!(function.parameters.len(), 1);
        assert_eq!(function.parameters[0].lexeme, "x");
        assert_eq!(function.body.to_string(), "(x + 2)");
        assert_eq!(
            Value::Function(function).to_string(),
            "fn(x) {\n(x + 2)\n}",
        );
    }

    #[test]
    fn function_application() {
        let tests = [
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("fn(x) { x; }(5)", 5),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), Value::Integer(expected), "for input {input}");
        }
    }

    #[test]
    fn closures() {
        let input = "
            let newAdder = fn(x) { fn(y) { x + y }; };
            let addTwo = newAdder(3);
            addTwo(2);
        ";
        assert_eq!(run(input), Value::Integer(5));

        // The inner function captures its definition environment, not the
        // environment of the call site.
        assert_eq!(run("let f = fn(x) { fn(y) { x } }; f(1)(2)"), Value::Integer(1));
    }

    #[test]
    fn recursion() {
        let input = "
            let counter = fn(x) {
                if (x > 100) {
                    return true;
                } else {
                    counter(x + 1);
                }
            };
            counter(0);
        ";
        assert_eq!(run(input), TRUE);
    }

    #[test]
    fn string_literals() {
        assert_eq!(run("\"Hello World!\""), Value::from("Hello World!"));
    }

    #[test]
    fn string_operations() {
        assert_eq!(run("\"Hello\" + \" \" + \"World!\""), Value::from("Hello World!"));
        assert_eq!(run("\"a\" == \"a\""), TRUE);
        assert_eq!(run("\"a\" == \"b\""), FALSE);
        assert_eq!(run("\"a\" != \"b\""), TRUE);
    }

    #[test]
    fn builtin_len() {
        let tests = [
            ("len(\"\")", Value::Integer(0)),
            ("len(\"four\")", Value::Integer(4)),
            ("len(\"hello world\")", Value::Integer(11)),
            ("len([1, 2, 3])", Value::Integer(3)),
            ("len([])", Value::Integer(0)),
            ("len(1)", error("argument to `len` not supported, got INTEGER")),
            ("len(\"one\", \"two\")", error("wrong number of arguments. got=2, want=1")),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), expected, "for input {input}");
        }
    }

    #[test]
    fn builtin_array_functions() {
        let tests = [
            ("first([1, 2, 3])", Value::Integer(1)),
            ("first([])", NULL),
            ("first(1)", error("argument to `first` must be ARRAY, got INTEGER")),
            ("last([1, 2, 3])", Value::Integer(3)),
            ("last([])", NULL),
            ("rest([1, 2, 3])", Value::Array(Rc::new(vec![
                Value::Integer(2),
                Value::Integer(3),
            ]))),
            ("rest([])", NULL),
            ("push([], 1)", Value::Array(Rc::new(vec![Value::Integer(1)]))),
            ("push(1, 1)", error("argument to `push` must be ARRAY, got INTEGER")),
            ("push([])", error("wrong number of arguments. got=1, want=2")),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), expected, "for input {input}");
        }
    }

    #[test]
    fn push_does_not_mutate_the_original() {
        assert_eq!(
            run("let a = [1]; push(a, 2); a;"),
            Value::Array(Rc::new(vec![Value::Integer(1)])),
        );
    }

    #[test]
    fn array_literals() {
        assert_eq!(run("[1, 2 * 2, 3 + 3]"), Value::Array(Rc::new(vec![
            Value::Integer(1),
            Value::Integer(4),
            Value::Integer(6),
        ])));
    }

    #[test]
    fn array_index_expressions() {
        let tests = [
            ("[1, 2, 3][0]", Value::Integer(1)),
            ("[1, 2, 3][1]", Value::Integer(2)),
            ("[1, 2, 3][2]", Value::Integer(3)),
            ("let i = 0; [1][i];", Value::Integer(1)),
            ("[1, 2, 3][1 + 1];", Value::Integer(3)),
            ("let myArray = [1, 2, 3]; myArray[2];", Value::Integer(3)),
            (
                "let myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];",
                Value::Integer(6),
            ),
            ("let a = [1, 2, 3]; a[1] + a[2];", Value::Integer(5)),
            ("[1, 2, 3][3]", NULL),
            ("[1, 2, 3][-1]", NULL),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), expected, "for input {input}");
        }
    }

    #[test]
    fn hash_literals() {
        let input = "
            let two = \"two\";
            {
                \"one\": 10 - 9,
                two: 1 + 1,
                \"thr\" + \"ee\": 6 / 2,
                4: 4,
                true: 5,
                false: 6
            }
        ";

        let Value::Hash(pairs) = run(input) else {
            panic!("expected hash value");
        };

        let expected = [
            (HashKey::String("one".to_string()), 1),
            (HashKey::String("two".to_string()), 2),
            (HashKey::String("three".to_string()), 3),
            (HashKey::Integer(4), 4),
            (HashKey::Boolean(true), 5),
            (HashKey::Boolean(false), 6),
        ];

        assert_eq!(pairs.len(), expected.len());
        for (key, value) in expected {
            assert_eq!(pairs.get(&key), Some(&Value::Integer(value)), "for key {key}");
        }
    }

    #[test]
    fn hash_index_expressions() {
        let tests = [
            ("{\"foo\": 5}[\"foo\"]", Value::Integer(5)),
            ("{\"foo\": 5}[\"bar\"]", NULL),
            ("let key = \"foo\"; {\"foo\": 5}[key];", Value::Integer(5)),
            ("{}[\"foo\"]", NULL),
            ("{5: 5}[5]", Value::Integer(5)),
            ("{true: 5}[true]", Value::Integer(5)),
            ("{false: 5}[false]", Value::Integer(5)),
            ("{\"one\": 1, \"two\": 2}[\"two\"]", Value::Integer(2)),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input), expected, "for input {input}");
        }
    }

    #[test]
    fn puts_writes_to_the_output_sink() {
        let mut out = Vec::new();
        let result = run_with_output("puts(\"hello\", 42); puts(true)", &mut out);

        assert_eq!(result, NULL);
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n42\ntrue\n");
    }

    #[test]
    fn evaluation_order_is_left_to_right() {
        let mut out = Vec::new();
        run_with_output("let a = [puts(1), puts(2), puts(3)]; puts(4);", &mut out);

        assert_eq!(String::from_utf8(out).unwrap(), "1\n2\n3\n4\n");
    }
}
