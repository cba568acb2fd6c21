//! Expression Parser
//!
//! Parses tokens into AST. A program is a `;`-separated list of
//! expression statements; the value of the last one is the result.

use super::lexer::Lexer;
use super::ast::{
    Ast, AstNode, AstNodeKind, NodeId, LiteralValue, BinaryOp, UnaryOp, UpdateOp, LogicalOp,
    AssignOp, MemberProperty,
};
use super::token::{Token, TokenKind, Span};

/// Parser error
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

/// Expression parser
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
    ast: Ast,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current: current.clone(),
            previous: current,
            ast: Ast::new(),
        }
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn consume(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected {:?}, got {:?}", kind, self.current.kind)))
        }
    }

    fn error(&self, message: String) -> ParseError {
        let message = match &self.current.kind {
            TokenKind::Error(lex) => lex.to_string(),
            _ => message,
        };
        ParseError { message, span: self.current.span }
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.ast.get(id).map(|n| n.span).unwrap_or_default()
    }

    fn add(&mut self, kind: AstNodeKind, span: Span) -> NodeId {
        self.ast.add_node(AstNode::new(kind, span))
    }

    /// Parse a complete program
    pub fn parse(mut self) -> Result<Ast, ParseError> {
        let start = self.current.span;
        let mut body = Vec::new();

        while !matches!(self.current.kind, TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }

        let span = start.merge(self.previous.span);
        let root = self.add(AstNodeKind::Program { body }, span);
        self.ast.set_root(root);
        Ok(self.ast)
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current.span;
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            return Ok(self.add(AstNodeKind::EmptyStatement, start));
        }

        let expr = self.parse_expression()?;
        match self.current.kind {
            TokenKind::Semicolon => self.advance(),
            TokenKind::Eof => {}
            _ => {
                return Err(self.error(format!("Unexpected token {:?}", self.current.kind)));
            }
        }
        let span = start.merge(self.previous.span);
        Ok(self.add(AstNodeKind::ExpressionStatement { expr }, span))
    }

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.check(&TokenKind::Comma) {
            self.advance();
            expressions.push(self.parse_assignment()?);
        }
        let span = self.span_of(first).merge(self.previous.span);
        Ok(self.add(AstNodeKind::SequenceExpression { expressions }, span))
    }

    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let target = self.parse_conditional()?;

        let op = match self.current.kind {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::AddAssign,
            TokenKind::MinusEq => AssignOp::SubAssign,
            TokenKind::StarEq => AssignOp::MulAssign,
            TokenKind::SlashEq => AssignOp::DivAssign,
            _ => return Ok(target),
        };
        if !self.is_assignable(target) {
            return Err(self.error("Invalid left-hand side in assignment".to_string()));
        }
        self.advance();
        let value = self.parse_assignment()?;
        let span = self.span_of(target).merge(self.span_of(value));
        Ok(self.add(AstNodeKind::AssignmentExpression { op, target, value }, span))
    }

    fn is_assignable(&self, id: NodeId) -> bool {
        matches!(
            self.ast.get(id).map(|n| &n.kind),
            Some(AstNodeKind::Identifier { .. } | AstNodeKind::MemberExpression { .. })
        )
    }

    fn parse_conditional(&mut self) -> Result<NodeId, ParseError> {
        let test = self.parse_logical_or()?;
        if !self.check(&TokenKind::Question) {
            return Ok(test);
        }

        self.advance();
        let consequent = self.parse_assignment()?;
        self.consume(TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = self.span_of(test).merge(self.span_of(alternate));
        Ok(self.add(AstNodeKind::ConditionalExpression { test, consequent, alternate }, span))
    }

    fn parse_logical_or(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_logical_and()?;

        while matches!(self.current.kind, TokenKind::PipePipe | TokenKind::QuestionQuestion) {
            let op = if self.check(&TokenKind::PipePipe) { LogicalOp::Or } else { LogicalOp::Nullish };
            self.advance();
            let right = self.parse_logical_and()?;
            let span = self.span_of(left).merge(self.span_of(right));
            left = self.add(AstNodeKind::LogicalExpression { op, left, right }, span);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AmpAmp) {
            self.advance();
            let right = self.parse_equality()?;
            let span = self.span_of(left).merge(self.span_of(right));
            left = self.add(AstNodeKind::LogicalExpression { op: LogicalOp::And, left, right }, span);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                TokenKind::NotEqEq => BinaryOp::StrictNotEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            let span = self.span_of(left).merge(self.span_of(right));
            left = self.add(AstNodeKind::BinaryExpression { op, left, right }, span);
        }
    }

    fn parse_comparison(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            let span = self.span_of(left).merge(self.span_of(right));
            left = self.add(AstNodeKind::BinaryExpression { op, left, right }, span);
        }
    }

    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = self.span_of(left).merge(self.span_of(right));
            left = self.add(AstNodeKind::BinaryExpression { op, left, right }, span);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = self.span_of(left).merge(self.span_of(right));
            left = self.add(AstNodeKind::BinaryExpression { op, left, right }, span);
        }
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current.span;

        let op = match self.current.kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.check(&TokenKind::PlusPlus) { UpdateOp::Increment } else { UpdateOp::Decrement };
                self.advance();
                let argument = self.parse_unary()?;
                if !self.is_assignable(argument) {
                    return Err(ParseError {
                        message: "Invalid left-hand side expression in prefix operation".to_string(),
                        span: self.span_of(argument),
                    });
                }
                let span = start.merge(self.span_of(argument));
                return Ok(self.add(AstNodeKind::UpdateExpression { op, prefix: true, argument }, span));
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let argument = self.parse_unary()?;
        let span = start.merge(self.span_of(argument));
        Ok(self.add(AstNodeKind::UnaryExpression { op, argument }, span))
    }

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let argument = self.parse_member()?;

        let op = match self.current.kind {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(argument),
        };
        if !self.is_assignable(argument) {
            return Err(self.error("Invalid left-hand side expression in postfix operation".to_string()));
        }
        self.advance();
        let span = self.span_of(argument).merge(self.previous.span);
        Ok(self.add(AstNodeKind::UpdateExpression { op, prefix: false, argument }, span))
    }

    fn parse_member(&mut self) -> Result<NodeId, ParseError> {
        let mut object = self.parse_primary()?;

        loop {
            let property = if self.check(&TokenKind::Dot) {
                self.advance();
                match &self.current.kind {
                    TokenKind::Identifier(name) => {
                        let name = name.clone();
                        self.advance();
                        MemberProperty::Named(name)
                    }
                    // Keywords are valid property names
                    TokenKind::Boolean(b) => {
                        let name: Box<str> = b.to_string().into();
                        self.advance();
                        MemberProperty::Named(name)
                    }
                    TokenKind::Null | TokenKind::Undefined | TokenKind::Typeof => {
                        let name: Box<str> = match self.current.kind {
                            TokenKind::Null => "null".into(),
                            TokenKind::Undefined => "undefined".into(),
                            _ => "typeof".into(),
                        };
                        self.advance();
                        MemberProperty::Named(name)
                    }
                    _ => return Err(self.error("Expected property name after '.'".to_string())),
                }
            } else if self.check(&TokenKind::LBracket) {
                self.advance();
                let property = self.parse_expression()?;
                self.consume(TokenKind::RBracket)?;
                MemberProperty::Computed(property)
            } else {
                return Ok(object);
            };

            let span = self.span_of(object).merge(self.previous.span);
            object = self.add(AstNodeKind::MemberExpression { object, property }, span);
        }
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let span = self.current.span;
        let kind = match &self.current.kind {
            TokenKind::Number(n) => AstNodeKind::Literal { value: LiteralValue::Number(*n) },
            TokenKind::String(s) => AstNodeKind::Literal { value: LiteralValue::String(s.clone()) },
            TokenKind::Boolean(b) => AstNodeKind::Literal { value: LiteralValue::Boolean(*b) },
            TokenKind::Null => AstNodeKind::Literal { value: LiteralValue::Null },
            TokenKind::Undefined => AstNodeKind::Literal { value: LiteralValue::Undefined },
            TokenKind::Identifier(name) => AstNodeKind::Identifier { name: name.clone() },
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                return Ok(expr);
            }
            TokenKind::LBrace => return self.parse_object_literal(),
            other => return Err(self.error(format!("Unexpected token {:?}", other))),
        };
        self.advance();
        Ok(self.add(kind, span))
    }

    fn parse_object_literal(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current.span;
        self.consume(TokenKind::LBrace)?;
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            let key: Box<str> = match &self.current.kind {
                TokenKind::Identifier(name) | TokenKind::String(name) => name.clone(),
                TokenKind::Number(n) => crate::JsValue::Number(*n).to_js_string().into(),
                _ => return Err(self.error("Expected property key".to_string())),
            };
            let key_span = self.current.span;
            self.advance();

            let value = if self.check(&TokenKind::Colon) {
                self.advance();
                self.parse_assignment()?
            } else {
                // Shorthand `{ foo }`
                self.add(AstNodeKind::Identifier { name: key.clone() }, key_span)
            };
            properties.push((key, value));

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.consume(TokenKind::RBrace)?;
        Ok(self.add(AstNodeKind::ObjectExpression { properties }, start.merge(self.previous.span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Ast {
        Parser::new(source).parse().unwrap()
    }

    fn statement_count(ast: &Ast) -> usize {
        match ast.root().and_then(|r| ast.get(r)).map(|n| &n.kind) {
            Some(AstNodeKind::Program { body }) => body.len(),
            _ => 0,
        }
    }

    #[test]
    fn test_assignment() {
        let ast = parse("foo = 'baz'");
        assert_eq!(statement_count(&ast), 1);
    }

    #[test]
    fn test_multiple_statements() {
        let ast = parse("count++; nested.foo = 'baz';");
        assert_eq!(statement_count(&ast), 2);
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(statement_count(&parse("")), 0);
        assert_eq!(statement_count(&parse("  ")), 0);
    }

    #[test]
    fn test_object_literal_and_ternary() {
        parse("open = open ? false : { a: 1, 'b': 2, c }");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = Parser::new("1 = 2").parse().unwrap_err();
        assert!(err.message.contains("left-hand side"));
        assert!(Parser::new("(a + b)++").parse().is_err());
    }

    #[test]
    fn test_unexpected_token() {
        assert!(Parser::new("foo bar").parse().is_err());
        assert!(Parser::new("foo = ").parse().is_err());
        assert!(Parser::new("a & b").parse().is_err());
    }
}
