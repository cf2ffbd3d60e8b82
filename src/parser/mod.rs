//! Recursive-descent / precedence-climbing parser.
//!
//! The statement dispatcher looks at the leading token(s) to pick a
//! production (see the table in the design doc); expressions are parsed by
//! a cascade of one function per precedence tier, from `or` (loosest) down
//! to atoms (tightest). Declarations and assignments share one entry point
//! with expression statements: an lvalue-shaped expression (`ident`,
//! `obj.field`, `arr[i]`) is parsed first via the ordinary expression
//! grammar, and only *after* that do we look at the next token to decide
//! whether this was actually a declaration, an assignment, or just an
//! expression statement. `:=`, `=`, `,`, and the compound-assignment
//! operators never appear inside expression grammar, so this never
//! over-consumes.

pub mod ast;

use crate::lexer::{Lexer, Token, TokenKind};
use ast::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.message, self.line, self.column)
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

const STATEMENT_LEADERS: &[TokenKind] = &[
    TokenKind::Fn,
    TokenKind::Return,
    TokenKind::If,
    TokenKind::For,
    TokenKind::Break,
    TokenKind::Continue,
    TokenKind::Nop,
    TokenKind::Class,
    TokenKind::Impl,
    TokenKind::SpecKw,
    TokenKind::Enum,
    TokenKind::Import,
    TokenKind::Assert,
    TokenKind::Unsafe,
    TokenKind::Mut,
];

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source).lex_all())
    }

    pub fn parse_program(mut self) -> (Program, Vec<ParseError>) {
        let mut statements = Vec::new();
        while !self.at_eof() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        (Program { statements }, self.errors)
    }

    // ---- token stream primitives -------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn at_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error(format!("expected {what}, found {}", self.current()));
            None
        }
    }

    fn error(&mut self, message: String) {
        let tok = self.current();
        self.errors.push(ParseError {
            message,
            line: tok.line,
            column: tok.column,
        });
    }

    fn synchronize(&mut self) {
        // Guarantee forward progress even when nothing recognizable follows.
        if !self.at_eof() {
            self.advance();
        }
        while !self.at_eof() && !self.check(TokenKind::RBrace) {
            if STATEMENT_LEADERS.contains(&self.kind()) || self.kind() == TokenKind::Ident {
                return;
            }
            self.advance();
        }
    }

    // ---- statements ---------------------------------------------------------

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.kind() {
            TokenKind::Mut => self.parse_declaration(),
            TokenKind::Fn => self.parse_function_decl().map(Statement::FunctionDecl),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if().map(Statement::If),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => Some(Statement::Break(self.advance())),
            TokenKind::Continue => Some(Statement::Continue(self.advance())),
            TokenKind::Nop => Some(Statement::Nop(self.advance())),
            TokenKind::Class => self.parse_class(),
            TokenKind::Impl => self.parse_impl(),
            TokenKind::SpecKw => self.parse_spec(),
            TokenKind::Enum => self.parse_enum(),
            TokenKind::Import => self.parse_import(),
            TokenKind::Assert => self.parse_assert(),
            TokenKind::Unsafe => self.parse_unsafe(),
            _ => self.parse_expr_or_assignment_statement(),
        }
    }

    fn parse_block(&mut self) -> Block {
        let mut statements = Vec::new();
        if self.expect(TokenKind::LBrace, "'{'").is_none() {
            return Block { statements };
        }
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        self.expect(TokenKind::RBrace, "'}'");
        Block { statements }
    }

    fn parse_declaration(&mut self) -> Option<Statement> {
        self.advance(); // `mut`
        let name_tok = self.expect(TokenKind::Ident, "identifier")?;
        let token = self.expect(TokenKind::Declare, "':='")?;
        let value = self.parse_expression();
        Some(Statement::Declaration(Declaration {
            token,
            name: name_tok.literal,
            value,
            mutable: true,
        }))
    }

    fn parse_expr_or_assignment_statement(&mut self) -> Option<Statement> {
        let first = self.parse_expression();

        if self.check(TokenKind::Declare) {
            let token = self.advance();
            let Expression::Ident { name, .. } = first else {
                self.error("left-hand side of ':=' must be an identifier".into());
                return None;
            };
            let value = self.parse_expression();
            return Some(Statement::Declaration(Declaration {
                token,
                name,
                value,
                mutable: false,
            }));
        }

        if let Some(op) = compound_assign_op(self.kind()) {
            let token = self.advance();
            let target = self.expr_to_assign_target(first.clone())?;
            let rhs = self.parse_expression();
            let current = assign_target_to_expr(&target, &token);
            let desugared = Expression::Binary {
                token: token.clone(),
                op,
                left: Box::new(current),
                right: Box::new(rhs),
            };
            return Some(Statement::Assignment(Assignment {
                token,
                targets: vec![target],
                values: vec![desugared],
            }));
        }

        if self.check(TokenKind::Comma) || self.check(TokenKind::Assign) {
            let mut targets = vec![self.expr_to_assign_target(first)?];
            while self.match_kind(TokenKind::Comma) {
                let next = self.parse_expression();
                targets.push(self.expr_to_assign_target(next)?);
            }
            let token = self.expect(TokenKind::Assign, "'='")?;
            let mut values = vec![self.parse_expression()];
            while self.match_kind(TokenKind::Comma) {
                values.push(self.parse_expression());
            }
            return Some(Statement::Assignment(Assignment { token, targets, values }));
        }

        Some(Statement::Expression(first))
    }

    fn expr_to_assign_target(&mut self, expr: Expression) -> Option<AssignTarget> {
        match expr {
            Expression::Ident { name, .. } => Some(AssignTarget::Ident(name)),
            Expression::Member { object, property, .. } => Some(AssignTarget::Member {
                object: *object,
                property,
            }),
            Expression::Index { collection, index, .. } => Some(AssignTarget::Index {
                collection: *collection,
                index: *index,
            }),
            other => {
                self.error(format!("invalid assignment target: {:?}", other.token()));
                None
            }
        }
    }

    fn parse_function_decl(&mut self) -> Option<FunctionDecl> {
        let token = self.advance(); // `fn`
        let name = self.expect(TokenKind::Ident, "function name")?.literal;
        let params = self.parse_params();
        let return_type = self.parse_return_type_opt();
        let body = self.parse_block();
        Some(FunctionDecl {
            token,
            name,
            params,
            return_type,
            body,
        })
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.expect(TokenKind::LParen, "'('").is_none() {
            return params;
        }
        if !self.check(TokenKind::RParen) {
            loop {
                let Some(name_tok) = self.expect(TokenKind::Ident, "parameter name") else {
                    break;
                };
                let type_annotation = if self.match_kind(TokenKind::Colon) {
                    self.parse_type_annotation()
                } else {
                    None
                };
                let default = if self.match_kind(TokenKind::Assign) {
                    Some(self.parse_expression())
                } else {
                    None
                };
                params.push(Param {
                    name: name_tok.literal,
                    type_annotation,
                    default,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'");
        params
    }

    fn parse_type_annotation(&mut self) -> Option<TypeAnnotation> {
        // Type annotations are parsed, never enforced; a bare identifier-like
        // token (including `Self`) is enough.
        let tok = self.advance();
        Some(TypeAnnotation { name: tok.literal })
    }

    fn parse_return_type_opt(&mut self) -> Option<TypeAnnotation> {
        if self.match_kind(TokenKind::Arrow) {
            self.parse_type_annotation()
        } else {
            None
        }
    }

    fn parse_return(&mut self) -> Option<Statement> {
        let token = self.advance();
        let value = if self.starts_expression() {
            Some(self.parse_expression())
        } else {
            None
        };
        Some(Statement::Return(ReturnStmt { token, value }))
    }

    fn starts_expression(&self) -> bool {
        !matches!(
            self.kind(),
            TokenKind::RBrace | TokenKind::Eof | TokenKind::Comma
        )
    }

    fn parse_if(&mut self) -> Option<IfStmt> {
        let token = self.advance();
        let condition = self.parse_expression();
        let then_block = self.parse_block();
        let else_block = if self.match_kind(TokenKind::Else) {
            if self.check(TokenKind::If) {
                self.parse_if().map(|s| ElseBranch::If(Box::new(s)))
            } else {
                Some(ElseBranch::Block(self.parse_block()))
            }
        } else {
            None
        };
        Some(IfStmt {
            token,
            condition,
            then_block,
            else_block,
        })
    }

    fn parse_for(&mut self) -> Option<Statement> {
        let token = self.advance();
        // `for IDENT in expr { }` vs `for [cond] { }`.
        if self.check(TokenKind::Ident) && self.peek_is(1, TokenKind::In) {
            let var = self.advance().literal;
            self.advance(); // `in`
            let iterable = self.parse_expression();
            let body = self.parse_block();
            return Some(Statement::ForIn(ForInStmt {
                token,
                var,
                iterable,
                body,
            }));
        }
        let condition = if self.check(TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_expression())
        };
        let body = self.parse_block();
        Some(Statement::ForCond(ForCondStmt { token, condition, body }))
    }

    fn peek_is(&self, offset: usize, kind: TokenKind) -> bool {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind == kind)
            .unwrap_or(false)
    }

    fn parse_class(&mut self) -> Option<Statement> {
        let token = self.advance();
        let name = self.expect(TokenKind::Ident, "class name")?.literal;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let public = self.match_kind(TokenKind::Pub);
            let mutable = self.match_kind(TokenKind::Mut);
            let Some(name_tok) = self.expect(TokenKind::Ident, "field name") else {
                self.synchronize();
                continue;
            };
            let type_annotation = if self.match_kind(TokenKind::Colon) {
                self.parse_type_annotation()
            } else {
                None
            };
            let default = if self.match_kind(TokenKind::Assign) {
                Some(self.parse_expression())
            } else {
                None
            };
            fields.push(FieldDecl {
                name: name_tok.literal,
                public,
                mutable,
                default,
                type_annotation,
            });
        }
        self.expect(TokenKind::RBrace, "'}'");
        Some(Statement::ClassDecl(ClassDecl { token, name, fields }))
    }

    fn parse_impl(&mut self) -> Option<Statement> {
        let token = self.advance();
        let class_name = self.expect(TokenKind::Ident, "class name")?.literal;
        let spec_name = if self.match_kind(TokenKind::For) {
            Some(self.expect(TokenKind::Ident, "spec name")?.literal)
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let mut public = false;
            let mut is_static = false;
            let mut mut_receiver = false;
            loop {
                match self.kind() {
                    TokenKind::Pub => {
                        public = true;
                        self.advance();
                    }
                    TokenKind::Static => {
                        is_static = true;
                        self.advance();
                    }
                    TokenKind::Mut => {
                        mut_receiver = true;
                        self.advance();
                    }
                    _ => break,
                }
            }
            if self.expect(TokenKind::Fn, "'fn'").is_none() {
                self.synchronize();
                continue;
            }
            let name = self.expect(TokenKind::Ident, "method name")?.literal;
            let params = self.parse_params();
            let return_type = self.parse_return_type_opt();
            let body = self.parse_block();
            methods.push(MethodDecl {
                name,
                params,
                return_type,
                body,
                public,
                is_static,
                mut_receiver,
            });
        }
        self.expect(TokenKind::RBrace, "'}'");
        Some(Statement::ImplDecl(ImplDecl {
            token,
            class_name,
            spec_name,
            methods,
        }))
    }

    fn parse_spec(&mut self) -> Option<Statement> {
        let token = self.advance();
        let name = self.expect(TokenKind::Ident, "spec name")?.literal;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut signatures = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            if self.expect(TokenKind::Fn, "'fn'").is_none() {
                self.synchronize();
                continue;
            }
            let name = self.expect(TokenKind::Ident, "method name")?.literal;
            let params = self.parse_params();
            let return_type = self.parse_return_type_opt();
            signatures.push(MethodSignature {
                name,
                params,
                return_type,
            });
        }
        self.expect(TokenKind::RBrace, "'}'");
        Some(Statement::SpecDecl(SpecDecl { token, name, signatures }))
    }

    fn parse_enum(&mut self) -> Option<Statement> {
        let token = self.advance();
        let name = self.expect(TokenKind::Ident, "enum name")?.literal;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            variants.push(self.expect(TokenKind::Ident, "variant name")?.literal);
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'");
        Some(Statement::EnumDecl(EnumDecl { token, name, variants }))
    }

    fn parse_import(&mut self) -> Option<Statement> {
        let token = self.advance();
        let path_tok = self.expect(TokenKind::Str, "import path string")?;
        let alias = if self.match_kind(TokenKind::As) {
            Some(self.expect(TokenKind::Ident, "import alias")?.literal)
        } else {
            None
        };
        Some(Statement::Import(ImportStmt {
            token,
            path: path_tok.literal,
            alias,
        }))
    }

    fn parse_assert(&mut self) -> Option<Statement> {
        let token = self.advance();
        let condition = self.parse_expression();
        let message = if self.match_kind(TokenKind::Comma) {
            Some(self.parse_expression())
        } else {
            None
        };
        Some(Statement::Assert(AssertStmt {
            token,
            condition,
            message,
        }))
    }

    fn parse_unsafe(&mut self) -> Option<Statement> {
        let token = self.advance();
        let body = self.parse_block();
        Some(Statement::Unsafe(UnsafeBlock { token, body }))
    }

    // ---- expressions ----------------------------------------------------------

    pub fn parse_expression(&mut self) -> Expression {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Expression {
        let mut left = self.parse_and();
        while self.check(TokenKind::Or) {
            let token = self.advance();
            let right = self.parse_and();
            left = Expression::Binary {
                token,
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_and(&mut self) -> Expression {
        let mut left = self.parse_not();
        while self.check(TokenKind::And) {
            let token = self.advance();
            let right = self.parse_not();
            left = Expression::Binary {
                token,
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_not(&mut self) -> Expression {
        if self.check(TokenKind::Not) {
            let token = self.advance();
            let operand = self.parse_not();
            return Expression::Unary {
                token,
                op: UnaryOp::Not,
                operand: Box::new(operand),
            };
        }
        self.parse_is()
    }

    fn parse_is(&mut self) -> Expression {
        let mut left = self.parse_equality();
        while self.check(TokenKind::Is) {
            self.advance();
            let type_name = self.advance().literal;
            left = Expression::Is {
                token: left.token().clone(),
                value: Box::new(left),
                type_name,
            };
        }
        left
    }

    fn parse_equality(&mut self) -> Expression {
        let mut left = self.parse_comparison();
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_comparison();
            left = Expression::Binary {
                token,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_comparison(&mut self) -> Expression {
        let mut left = self.parse_range();
        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_range();
            left = Expression::Binary {
                token,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_range(&mut self) -> Expression {
        let left = self.parse_additive();
        let inclusive = match self.kind() {
            TokenKind::DotDot => false,
            TokenKind::DotDotEq => true,
            _ => return left,
        };
        let token = self.advance();
        let right = self.parse_additive();
        Expression::Range {
            token,
            start: Box::new(left),
            end: Box::new(right),
            inclusive,
        }
    }

    fn parse_additive(&mut self) -> Expression {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_multiplicative();
            left = Expression::Binary {
                token,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Expression {
        let mut left = self.parse_power();
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_power();
            left = Expression::Binary {
                token,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_power(&mut self) -> Expression {
        let left = self.parse_unary();
        if self.check(TokenKind::StarStar) {
            let token = self.advance();
            let right = self.parse_power(); // right-associative
            return Expression::Binary {
                token,
                op: BinaryOp::Pow,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_unary(&mut self) -> Expression {
        match self.kind() {
            TokenKind::Minus => {
                let token = self.advance();
                let operand = self.parse_unary();
                Expression::Unary {
                    token,
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                }
            }
            TokenKind::Amp => {
                let token = self.advance();
                let operand = self.parse_unary();
                Expression::Unary {
                    token,
                    op: UnaryOp::Ref,
                    operand: Box::new(operand),
                }
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expression {
        let mut expr = self.parse_atom();
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    let token = self.advance();
                    let args = self.parse_call_args();
                    expr = Expression::Call {
                        token,
                        callee: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    let token = self.advance();
                    let index = self.parse_expression();
                    self.expect(TokenKind::RBracket, "']'");
                    expr = Expression::Index {
                        token,
                        collection: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    let token = self.advance();
                    let property = self.advance().literal;
                    expr = Expression::Member {
                        token,
                        object: Box::new(expr),
                        property,
                    };
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call_args(&mut self) -> Vec<Expression> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression());
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'");
        args
    }

    fn parse_atom(&mut self) -> Expression {
        match self.kind() {
            TokenKind::Int => {
                let token = self.advance();
                let digits: String = token.literal.chars().filter(|c| *c != '_').collect();
                let value = digits.parse().unwrap_or_else(|_| {
                    0 // a malformed literal is reported separately below
                });
                if digits.parse::<i64>().is_err() {
                    self.error(format!("invalid integer literal: {}", token.literal));
                }
                Expression::Integer { token, value }
            }
            TokenKind::Float => {
                let token = self.advance();
                let digits: String = token.literal.chars().filter(|c| *c != '_').collect();
                let value = digits.parse().unwrap_or(0.0);
                Expression::Float { token, value }
            }
            TokenKind::Str => {
                let token = self.advance();
                let value = token.literal.clone();
                Expression::Str { token, value }
            }
            TokenKind::InterpStart => self.parse_interpolated_string(),
            TokenKind::True => {
                let token = self.advance();
                Expression::Boolean { token, value: true }
            }
            TokenKind::False => {
                let token = self.advance();
                Expression::Boolean { token, value: false }
            }
            TokenKind::Nil => Expression::Nil { token: self.advance() },
            TokenKind::This => Expression::This { token: self.advance() },
            TokenKind::SelfTy => {
                let token = self.advance();
                Expression::Ident {
                    name: token.literal.clone(),
                    token,
                }
            }
            TokenKind::Ident if self.current().literal == "Ok" => self.parse_result_ctor(true),
            TokenKind::Ident if self.current().literal == "Err" => self.parse_result_ctor(false),
            TokenKind::Ident => {
                let token = self.advance();
                Expression::Ident {
                    name: token.literal.clone(),
                    token,
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression();
                self.expect(TokenKind::RParen, "')'");
                expr
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::LBrace => self.parse_map_literal(),
            TokenKind::Fn => self.parse_function_literal(),
            TokenKind::Match => self.parse_match_expr(),
            TokenKind::Asm => self.parse_asm(),
            _ => {
                let token = self.advance();
                self.error(format!("unexpected token {token}"));
                Expression::Nil { token }
            }
        }
    }

    fn parse_result_ctor(&mut self, is_ok: bool) -> Expression {
        let token = self.advance(); // `Ok` / `Err`
        if !self.check(TokenKind::LParen) {
            // Bare `Ok`/`Err` identifier (e.g. as a match pattern head leaking
            // into expression position); treat as a plain identifier.
            return Expression::Ident {
                name: token.literal.clone(),
                token,
            };
        }
        self.advance(); // '('
        let value = self.parse_expression();
        self.expect(TokenKind::RParen, "')'");
        if is_ok {
            Expression::Ok {
                token,
                value: Box::new(value),
            }
        } else {
            Expression::Err {
                token,
                value: Box::new(value),
            }
        }
    }

    fn parse_interpolated_string(&mut self) -> Expression {
        let token = self.advance(); // INTERP_START
        let mut parts = vec![StringPart::Literal(token.literal.clone())];
        loop {
            parts.push(StringPart::Expr(self.parse_expression()));
            match self.kind() {
                TokenKind::InterpMid => {
                    let tok = self.advance();
                    parts.push(StringPart::Literal(tok.literal));
                }
                TokenKind::InterpEnd => {
                    let tok = self.advance();
                    parts.push(StringPart::Literal(tok.literal));
                    break;
                }
                _ => {
                    self.error("unterminated string interpolation".into());
                    break;
                }
            }
        }
        Expression::InterpolatedString { token, parts }
    }

    fn parse_list_literal(&mut self) -> Expression {
        let token = self.advance(); // '['
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expression());
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket, "']'");
        Expression::List { token, elements }
    }

    fn parse_map_literal(&mut self) -> Expression {
        let token = self.advance(); // '{'
        let mut pairs = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let key = self.parse_expression();
                self.expect(TokenKind::Colon, "':'");
                let value = self.parse_expression();
                pairs.push((key, value));
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}'");
        Expression::Map { token, pairs }
    }

    fn parse_function_literal(&mut self) -> Expression {
        let token = self.advance(); // 'fn'
        let params = self.parse_params();
        let return_type = self.parse_return_type_opt();
        let body = self.parse_block();
        Expression::FunctionLit {
            token,
            params,
            return_type,
            body,
        }
    }

    fn parse_match_expr(&mut self) -> Expression {
        let token = self.advance(); // 'match'
        let scrutinee = Box::new(self.parse_expression());
        self.expect(TokenKind::LBrace, "'{'");
        let mut arms = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let pattern = self.parse_pattern();
            let guard = if self.match_kind(TokenKind::If) {
                Some(self.parse_expression())
            } else {
                None
            };
            self.expect(TokenKind::FatArrow, "'=>'");
            let body = self.parse_block();
            arms.push(MatchArm { pattern, guard, body });
        }
        self.expect(TokenKind::RBrace, "'}'");
        Expression::Match {
            token,
            scrutinee,
            arms,
        }
    }

    fn parse_pattern(&mut self) -> Pattern {
        let mut alts = vec![self.parse_pattern_term()];
        while self.match_kind(TokenKind::Pipe) {
            alts.push(self.parse_pattern_term());
        }
        if alts.len() == 1 {
            alts.into_iter().next().unwrap()
        } else {
            Pattern::Alternative(alts)
        }
    }

    fn parse_pattern_term(&mut self) -> Pattern {
        match self.kind() {
            TokenKind::Underscore => {
                self.advance();
                Pattern::Wildcard
            }
            TokenKind::Int => {
                let tok = self.advance();
                let digits: String = tok.literal.chars().filter(|c| *c != '_').collect();
                Pattern::Literal(LiteralPattern::Int(digits.parse().unwrap_or(0)))
            }
            TokenKind::Float => {
                let tok = self.advance();
                let digits: String = tok.literal.chars().filter(|c| *c != '_').collect();
                Pattern::Literal(LiteralPattern::Float(digits.parse().unwrap_or(0.0)))
            }
            TokenKind::Str => Pattern::Literal(LiteralPattern::Str(self.advance().literal)),
            TokenKind::True => {
                self.advance();
                Pattern::Literal(LiteralPattern::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Pattern::Literal(LiteralPattern::Bool(false))
            }
            TokenKind::Nil => {
                self.advance();
                Pattern::Literal(LiteralPattern::Nil)
            }
            TokenKind::Ident => {
                let name = self.advance().literal;
                if self.match_kind(TokenKind::Dot) {
                    let variant = self.advance().literal;
                    Pattern::Variant {
                        enum_name: Some(name),
                        variant,
                    }
                } else {
                    Pattern::Variant {
                        enum_name: None,
                        variant: name,
                    }
                }
            }
            _ => {
                let token = self.advance();
                self.error(format!("invalid pattern starting at {token}"));
                Pattern::Wildcard
            }
        }
    }

    fn parse_asm(&mut self) -> Expression {
        let token = self.advance(); // 'asm'
        self.expect(TokenKind::LParen, "'('");
        let args = self.parse_call_args_inner();
        Expression::Asm { token, args }
    }

    fn parse_call_args_inner(&mut self) -> Vec<Expression> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression());
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'");
        args
    }
}

fn compound_assign_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::PlusEq => BinaryOp::Add,
        TokenKind::MinusEq => BinaryOp::Sub,
        TokenKind::StarEq => BinaryOp::Mul,
        TokenKind::SlashEq => BinaryOp::Div,
        TokenKind::PercentEq => BinaryOp::Mod,
        _ => return None,
    })
}

fn assign_target_to_expr(target: &AssignTarget, token: &Token) -> Expression {
    match target {
        AssignTarget::Ident(name) => Expression::Ident {
            token: token.clone(),
            name: name.clone(),
        },
        AssignTarget::Member { object, property } => Expression::Member {
            token: token.clone(),
            object: Box::new(object.clone()),
            property: property.clone(),
        },
        AssignTarget::Index { collection, index } => Expression::Index {
            token: token.clone(),
            collection: Box::new(collection.clone()),
            index: Box::new(index.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (Program, Vec<ParseError>) {
        Parser::from_source(src).parse_program()
    }

    #[test]
    fn parses_declaration() {
        let (program, errors) = parse("x := 5");
        assert!(errors.is_empty());
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Statement::Declaration(_)));
    }

    #[test]
    fn parses_mutable_declaration() {
        let (program, errors) = parse("mut x := 5");
        assert!(errors.is_empty());
        let Statement::Declaration(decl) = &program.statements[0] else {
            panic!("expected declaration");
        };
        assert!(decl.mutable);
    }

    #[test]
    fn parses_multi_target_assignment() {
        let (program, errors) = parse("a, b = b, a");
        assert!(errors.is_empty());
        let Statement::Assignment(assign) = &program.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(assign.targets.len(), 2);
        assert_eq!(assign.values.len(), 2);
    }

    #[test]
    fn desugars_compound_assignment() {
        let (program, errors) = parse("x += 1");
        assert!(errors.is_empty());
        let Statement::Assignment(assign) = &program.statements[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(
            assign.values[0],
            Expression::Binary { op: BinaryOp::Add, .. }
        ));
    }

    #[test]
    fn respects_precedence_of_arithmetic() {
        let (program, errors) = parse("1 + 2 * 3");
        assert!(errors.is_empty());
        let Statement::Expression(Expression::Binary { op: BinaryOp::Add, right, .. }) =
            &program.statements[0]
        else {
            panic!("expected add at top level");
        };
        assert!(matches!(**right, Expression::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn power_is_right_associative() {
        let (program, _) = parse("2 ** 3 ** 2");
        let Statement::Expression(Expression::Binary {
            op: BinaryOp::Pow,
            right,
            ..
        }) = &program.statements[0]
        else {
            panic!("expected power expression");
        };
        assert!(matches!(**right, Expression::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn range_does_not_chain() {
        let (program, errors) = parse("1..5");
        assert!(errors.is_empty());
        assert!(matches!(
            program.statements[0],
            Statement::Expression(Expression::Range { inclusive: false, .. })
        ));
    }

    #[test]
    fn inclusive_range() {
        let (program, _) = parse("1..=5");
        assert!(matches!(
            program.statements[0],
            Statement::Expression(Expression::Range { inclusive: true, .. })
        ));
    }

    #[test]
    fn parses_function_and_call() {
        let (program, errors) = parse("fn add(a, b) { return a + b } add(1, 2)");
        assert!(errors.is_empty());
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[0], Statement::FunctionDecl(_)));
        assert!(matches!(
            program.statements[1],
            Statement::Expression(Expression::Call { .. })
        ));
    }

    #[test]
    fn parses_class_and_impl() {
        let src = "class Point{ pub mut x=0; pub mut y=0 } impl Point{ fn init(a,b){ this.x=a; this.y=b } fn sum(){ return this.x+this.y } }";
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn parses_match_with_alternatives_and_guard() {
        let src = "match x { 1 | 2 => { \"small\" } n if n > 10 => { \"big\" } _ => { \"other\" } }";
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "{errors:?}");
        let Statement::Expression(Expression::Match { arms, .. }) = &program.statements[0] else {
            panic!("expected match expression");
        };
        assert_eq!(arms.len(), 3);
        assert!(matches!(arms[0].pattern, Pattern::Alternative(_)));
        assert!(arms[1].guard.is_some());
    }

    #[test]
    fn parses_interpolated_string() {
        let (program, errors) = parse("\"Hello, {name}!\"");
        assert!(errors.is_empty());
        let Statement::Expression(Expression::InterpolatedString { parts, .. }) =
            &program.statements[0]
        else {
            panic!("expected interpolated string");
        };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn recovers_after_syntax_error() {
        let (program, errors) = parse("x := \n y := 2");
        // the first declaration is malformed (newline isn't a token, so this
        // actually just continues the expression) but parsing should still
        // make progress rather than looping.
        assert!(!program.statements.is_empty() || !errors.is_empty());
    }
}
