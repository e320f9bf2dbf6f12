use crate::expr::*;
use crate::lexer::Lexer;
use crate::stmt::*;
use crate::token::{Token, Type};

/// Binding power of an operator, from weakest to strongest.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // add(x)
    Index,       // array[0]
}

impl Precedence {
    /// Returns the infix binding power of the given token type.
    fn of(r#type: Type) -> Precedence {
        match r#type {
            Type::EqualEqual | Type::BangEqual => Precedence::Equals,
            Type::Less | Type::Greater => Precedence::LessGreater,
            Type::Plus | Type::Minus => Precedence::Sum,
            Type::Star | Type::Slash => Precedence::Product,
            Type::LeftParen => Precedence::Call,
            Type::LeftBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

/// Parses the token stream into a [`Program`] using top-down operator
/// precedence (Pratt) parsing.
///
/// - Program    -> Statement* EOF ;
/// - Statement  -> LetStmt | ReturnStmt | ExprStmt ;
/// - LetStmt    -> "let" IDENT "=" Expression ";" ;
/// - ReturnStmt -> "return" Expression ";" ;
/// - ExprStmt   -> Expression ";"? ;
/// - Block      -> "{" Statement* "}" ;
///
/// Expressions are parsed by precedence climbing: every token type may have a
/// prefix handler and an infix handler, and `parse_expression` keeps folding
/// infix handlers into the left-hand side while the next operator binds
/// tighter than the current context.
///
/// The parser keeps two tokens of lookahead and collects error strings
/// instead of failing fast. A statement that cannot be parsed is dropped so
/// the rest of the input still surfaces its own errors. A program parsed with
/// a non-empty error list is not fit for evaluation.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Parser<'a> {
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();

        Parser {
            lexer,
            cur_token,
            peek_token,
            errors: Vec::new(),
        }
    }

    /// Parses the whole input and returns the resulting program.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.cur_token_is(Type::EOF) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }

        Program { statements }
    }

    /// Returns the errors collected while parsing.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Advances both lookahead tokens.
    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    /// Returns if the current token is of the given type.
    fn cur_token_is(&self, r#type: Type) -> bool {
        self.cur_token.r#type == r#type
    }

    /// Returns if the next token is of the given type.
    fn peek_token_is(&self, r#type: Type) -> bool {
        self.peek_token.r#type == r#type
    }

    /// Consumes the next token if it is of the given type. Otherwise records
    /// an error and leaves the cursor untouched.
    fn expect_peek(&mut self, r#type: Type) -> bool {
        if self.peek_token_is(r#type) {
            self.next_token();
            return true;
        }

        self.errors.push(format!(
            "Expect token to be {}, got {} instead",
            r#type, self.peek_token.r#type,
        ));
        false
    }

    fn cur_precedence(&self) -> Precedence {
        Precedence::of(self.cur_token.r#type)
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek_token.r#type)
    }

    /// Parses a statement.
    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur_token.r#type {
            Type::Let => self.parse_let_statement(),
            Type::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Parses a let statement.
    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();

        if !self.expect_peek(Type::Identifier) {
            return None;
        }
        let name = self.cur_token.clone();

        if !self.expect_peek(Type::Equal) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(Type::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Let(LetData { token, name, value }))
    }

    /// Parses a return statement.
    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(Type::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Return(ReturnData { token, value }))
    }

    /// Parses an expression statement. The trailing semicolon is optional
    /// and consumed even when the expression was malformed, so recovery
    /// resumes at the next statement.
    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest);

        if self.peek_token_is(Type::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Expression(ExpressionData { expr: expr? }))
    }

    /// Parses an expression with the given binding context: starts from the
    /// prefix handler of the current token and folds in infix handlers while
    /// the upcoming operator binds tighter.
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_token_is(Type::Semicolon) && precedence < self.peek_precedence() {
            left = match self.peek_token.r#type {
                Type::Plus | Type::Minus | Type::Star | Type::Slash
                | Type::EqualEqual | Type::BangEqual | Type::Less | Type::Greater => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                },
                Type::LeftParen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                },
                Type::LeftBracket => {
                    self.next_token();
                    self.parse_index_expression(left)?
                },
                _ => return Some(left),
            };
        }

        Some(left)
    }

    /// Dispatches on the prefix handler of the current token.
    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur_token.r#type {
            Type::Identifier => Some(Expr::Identifier(IdentifierData {
                name: self.cur_token.clone(),
            })),
            Type::Integer => self.parse_integer_literal(),
            Type::True | Type::False => Some(Expr::Boolean(BooleanData {
                value: self.cur_token_is(Type::True),
                token: self.cur_token.clone(),
            })),
            Type::String => Some(Expr::String(StringData {
                value: self.cur_token.lexeme.clone(),
                token: self.cur_token.clone(),
            })),
            Type::Bang | Type::Minus => self.parse_prefix_expression(),
            Type::LeftParen => self.parse_grouped_expression(),
            Type::If => self.parse_if_expression(),
            Type::Function => self.parse_function_literal(),
            Type::LeftBracket => self.parse_array_literal(),
            Type::LeftBrace => self.parse_hash_literal(),
            _ => {
                self.errors.push(format!(
                    "no prefix parse function for {}",
                    self.cur_token.r#type,
                ));
                None
            },
        }
    }

    /// Parses an integer literal.
    fn parse_integer_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();

        match token.lexeme.parse::<i64>() {
            Ok(value) => Some(Expr::Integer(IntegerData { token, value })),
            Err(_) => {
                self.errors.push(format!("could not parse {} as integer", token.lexeme));
                None
            },
        }
    }

    /// Parses a prefix expression.
    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let operator = self.cur_token.clone();
        self.next_token();

        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expr::Prefix(PrefixData {
            operator,
            right: Box::new(right),
        }))
    }

    /// Parses an infix expression with the given left operand. All infix
    /// operators are left-associative.
    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let operator = self.cur_token.clone();
        let precedence = self.cur_precedence();
        self.next_token();

        let right = self.parse_expression(precedence)?;

        Some(Expr::Infix(InfixData {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// Parses a parenthesized expression.
    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();

        let expr = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(Type::RightParen) {
            return None;
        }

        Some(expr)
    }

    /// Parses an if expression with an optional else branch.
    fn parse_if_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();

        if !self.expect_peek(Type::LeftParen) {
            return None;
        }
        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(Type::RightParen) {
            return None;
        }
        if !self.expect_peek(Type::LeftBrace) {
            return None;
        }

        let consequence = self.parse_block_statement();

        let alternative = if self.peek_token_is(Type::Else) {
            self.next_token();

            if !self.expect_peek(Type::LeftBrace) {
                return None;
            }

            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expr::If(IfData {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    /// Parses a block of statements until the closing brace.
    fn parse_block_statement(&mut self) -> BlockData {
        let token = self.cur_token.clone();
        let mut statements = Vec::new();

        self.next_token();

        while !self.cur_token_is(Type::RightBrace) && !self.cur_token_is(Type::EOF) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }

        BlockData { token, statements }
    }

    /// Parses a function literal.
    fn parse_function_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();

        if !self.expect_peek(Type::LeftParen) {
            return None;
        }

        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(Type::LeftBrace) {
            return None;
        }

        let body = self.parse_block_statement();

        Some(Expr::Function(FunctionData { token, parameters, body }))
    }

    /// Parses a comma separated parameter list.
    fn parse_function_parameters(&mut self) -> Option<Vec<Token>> {
        let mut parameters = Vec::new();

        if self.peek_token_is(Type::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        self.next_token();
        parameters.push(self.cur_token.clone());

        while self.peek_token_is(Type::Comma) {
            self.next_token();
            self.next_token();
            parameters.push(self.cur_token.clone());
        }

        if !self.expect_peek(Type::RightParen) {
            return None;
        }

        Some(parameters)
    }

    /// Parses a call expression with the given callee.
    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let arguments = self.parse_expression_list(Type::RightParen)?;

        Some(Expr::Call(CallData {
            token,
            function: Box::new(function),
            arguments,
        }))
    }

    /// Parses an index expression with the given container.
    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        self.next_token();

        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(Type::RightBracket) {
            return None;
        }

        Some(Expr::Index(IndexData {
            token,
            left: Box::new(left),
            index: Box::new(index),
        }))
    }

    /// Parses an array literal.
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let elements = self.parse_expression_list(Type::RightBracket)?;

        Some(Expr::Array(ArrayData { token, elements }))
    }

    /// Parses a comma separated expression list terminated by `end`.
    fn parse_expression_list(&mut self, end: Type) -> Option<Vec<Expr>> {
        let mut list = Vec::new();

        if self.peek_token_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(Type::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    /// Parses a hash literal. Pairs keep their source order.
    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let mut pairs = Vec::new();

        while !self.peek_token_is(Type::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(Type::Colon) {
                return None;
            }
            self.next_token();

            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_token_is(Type::RightBrace) && !self.expect_peek(Type::Comma) {
                return None;
            }
        }

        if !self.expect_peek(Type::RightBrace) {
            return None;
        }

        Some(Expr::Hash(HashData { token, pairs }))
    }
}
