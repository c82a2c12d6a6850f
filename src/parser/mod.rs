mod error;
pub mod formatter;
mod operator;

use crate::{
    lexer::{unescape, Lexer, LineBreaks, Span, Token, TokenKind},
    script::{
        expression::{self, BinaryOperator, LogicalOperator, UnaryOperator},
        statement::{self, AssignOperator, AssignTarget},
        ExpressionRef, Script, StatementRef,
    },
    value::Value,
};
use compact_str::CompactString;
pub use error::{ParserError, ParserErrorKind};
use operator::POSTFIX_BINDING_POWER;
use std::rc::Rc;

/// What a parsed expression looks like, as far as assignments care.
#[derive(Debug)]
enum Shape {
    Name(CompactString),
    Member {
        object: ExpressionRef,
        name: CompactString,
    },
    Index {
        object: ExpressionRef,
        index: ExpressionRef,
    },
    Other,
}

#[derive(Debug)]
struct Parsed {
    node: ExpressionRef,
    span: Span,
    shape: Shape,
}

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

impl Infix {
    fn get_binding_power(&self) -> (u8, u8) {
        match self {
            Infix::Binary(operator) => operator.get_binding_power(),
            Infix::Logical(operator) => operator.get_binding_power(),
        }
    }
}

/// Builds a [`Script`] from source text.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Result<Token, ParserError>>,
    script: Script,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: None,
            script: Script::new(),
        }
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.lexer.get_line_breaks()
    }

    fn peek(&mut self) -> Result<Token, ParserError> {
        match self.lookahead {
            Some(ref token_or_error) => token_or_error.clone(),
            None => {
                let next_token = self.next_token();
                self.lookahead = Some(next_token.clone());
                next_token
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParserError> {
        match self.lookahead.take() {
            Some(token_or_error) => token_or_error,
            None => Ok(self.lexer.next_token()?),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let next_token = self.next_token()?;
        if next_token.kind != expected {
            Err(ParserError {
                span: next_token.span,
                kind: ParserErrorKind::UnexpectedToken {
                    actual: next_token.kind,
                    expected,
                },
            })
        } else {
            Ok(next_token)
        }
    }

    fn eat_if(&mut self, next: TokenKind) -> Result<Option<Token>, ParserError> {
        let next_token = self.peek()?;
        if next_token.kind != next {
            Ok(None)
        } else {
            let _ = self.next_token().expect("Just peeked.");
            Ok(Some(next_token))
        }
    }

    fn lexeme(&self, token: &Token) -> &'src str {
        self.lexer
            .get_lexeme(&token.span)
            .expect("Lexed token has a valid span")
    }

    fn name(&mut self) -> Result<(CompactString, Span), ParserError> {
        let token = self.expect(TokenKind::Ident)?;
        Ok((self.lexeme(&token).into(), token.span))
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    pub fn parse_expression(&mut self) -> Result<ExpressionRef, ParserError> {
        Ok(self.parse_expression_pratt(0)?.node)
    }

    fn peek_infix_operator(&mut self) -> Result<Option<Infix>, ParserError> {
        let token = self.peek()?;
        let operator = match token.kind {
            TokenKind::Plus => Infix::Binary(BinaryOperator::Add),
            TokenKind::Minus => Infix::Binary(BinaryOperator::Subtract),
            TokenKind::Star => Infix::Binary(BinaryOperator::Multiply),
            TokenKind::Slash => Infix::Binary(BinaryOperator::Divide),
            TokenKind::Percent => Infix::Binary(BinaryOperator::Modulo),
            TokenKind::EqualEqual => Infix::Binary(BinaryOperator::Equal),
            TokenKind::BangEqual => Infix::Binary(BinaryOperator::NotEqual),
            TokenKind::LessThan => Infix::Binary(BinaryOperator::LessThan),
            TokenKind::LessThanEqual => Infix::Binary(BinaryOperator::LessThanOrEqual),
            TokenKind::GreaterThan => Infix::Binary(BinaryOperator::GreaterThan),
            TokenKind::GreaterThanEqual => Infix::Binary(BinaryOperator::GreaterThanOrEqual),
            TokenKind::KeywordIn => Infix::Binary(BinaryOperator::In),
            TokenKind::KeywordAnd => Infix::Logical(LogicalOperator::And),
            TokenKind::KeywordOr => Infix::Logical(LogicalOperator::Or),
            _ => return Ok(None),
        };
        Ok(Some(operator))
    }

    fn expect_left_expression(&mut self) -> Result<Parsed, ParserError> {
        let token = self.next_token()?;
        let lexeme = self.lexeme(&token);
        let span = token.span;

        let constant = |value: Value| expression::Constant { value, span };
        let (node, shape) = match token.kind {
            TokenKind::Eof => {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedEof,
                    span,
                })
            }
            TokenKind::NumericLiteral => {
                let value: f64 = lexeme
                    .parse()
                    .expect("Numeric literal tokens are valid `f64`");
                (self.script.push_expression(constant(Value::Number(value))), Shape::Other)
            }
            TokenKind::StringLiteral => {
                let value = Value::Text(unescape(lexeme));
                (self.script.push_expression(constant(value)), Shape::Other)
            }
            TokenKind::KeywordTrue => (
                self.script.push_expression(constant(Value::Bool(true))),
                Shape::Other,
            ),
            TokenKind::KeywordFalse => (
                self.script.push_expression(constant(Value::Bool(false))),
                Shape::Other,
            ),
            TokenKind::KeywordNone => (
                self.script.push_expression(constant(Value::None)),
                Shape::Other,
            ),
            TokenKind::Ident => {
                let name: CompactString = lexeme.into();
                let node = self.script.push_expression(expression::Name {
                    name: name.clone(),
                    span,
                });
                (node, Shape::Name(name))
            }
            // Unary operators
            TokenKind::Minus | TokenKind::KeywordNot => {
                let operator = match token.kind {
                    TokenKind::Minus => UnaryOperator::Minus,
                    _ => UnaryOperator::Not,
                };
                let operand = self.parse_expression_pratt(operator.get_binding_power())?;
                let span = span.merge(&operand.span);
                let node = self.script.push_expression(expression::Unary {
                    operator,
                    operand: operand.node,
                    span,
                });
                return Ok(Parsed {
                    node,
                    span,
                    shape: Shape::Other,
                });
            }
            // Bracketed expression
            TokenKind::LeftParenthesis => {
                let inner = self.parse_expression_pratt(0)?;
                let close = self.expect(TokenKind::RightParenthesis)?;
                return Ok(Parsed {
                    node: inner.node,
                    span: span.merge(&close.span),
                    shape: Shape::Other,
                });
            }
            TokenKind::LeftBracket => {
                let (elements, close) = self.parse_list(TokenKind::RightBracket)?;
                let span = span.merge(&close.span);
                let node = self
                    .script
                    .push_expression(expression::Array { elements, span });
                return Ok(Parsed {
                    node,
                    span,
                    shape: Shape::Other,
                });
            }
            kind => {
                return Err(ParserError {
                    kind: ParserErrorKind::NonExpression(kind),
                    span,
                })
            }
        };
        Ok(Parsed { node, span, shape })
    }

    /// Comma separated expressions up to `closing`, which is consumed.
    fn parse_list(
        &mut self,
        closing: TokenKind,
    ) -> Result<(Vec<ExpressionRef>, Token), ParserError> {
        let mut items = Vec::new();
        loop {
            if let Some(close) = self.eat_if(closing)? {
                return Ok((items, close));
            }
            items.push(self.parse_expression_pratt(0)?.node);
            if self.eat_if(TokenKind::Comma)?.is_none() {
                let close = self.expect(closing)?;
                return Ok((items, close));
            }
        }
    }

    fn parse_postfix(&mut self, lhs: Parsed) -> Result<Parsed, ParserError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::LeftParenthesis => {
                let (arguments, close) = self.parse_list(TokenKind::RightParenthesis)?;
                let span = lhs.span.merge(&close.span);
                let node = self.script.push_expression(expression::Call {
                    callee: lhs.node,
                    arguments,
                    span,
                });
                Ok(Parsed {
                    node,
                    span,
                    shape: Shape::Other,
                })
            }
            TokenKind::LeftBracket => {
                let index = self.parse_expression_pratt(0)?;
                let close = self.expect(TokenKind::RightBracket)?;
                let span = lhs.span.merge(&close.span);
                let node = self.script.push_expression(expression::Index {
                    object: lhs.node,
                    index: index.node,
                    span,
                });
                Ok(Parsed {
                    node,
                    span,
                    shape: Shape::Index {
                        object: lhs.node,
                        index: index.node,
                    },
                })
            }
            TokenKind::Dot => {
                let (name, name_span) = self.name()?;
                let member = self.script.push_expression(expression::Name {
                    name: name.clone(),
                    span: name_span,
                });
                let span = lhs.span.merge(&name_span);
                let node = self.script.push_expression(expression::Member {
                    object: lhs.node,
                    member,
                    span,
                });
                Ok(Parsed {
                    node,
                    span,
                    shape: Shape::Member {
                        object: lhs.node,
                        name,
                    },
                })
            }
            _ => unreachable!("Only postfix operator tokens are dispatched here."),
        }
    }

    fn parse_expression_pratt(&mut self, min_bp: u8) -> Result<Parsed, ParserError> {
        let mut lhs = self.expect_left_expression()?;

        loop {
            let next = self.peek()?;
            if matches!(
                next.kind,
                TokenKind::LeftParenthesis | TokenKind::LeftBracket | TokenKind::Dot
            ) {
                if POSTFIX_BINDING_POWER < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs)?;
                continue;
            }

            let Some(operator) = self.peek_infix_operator()? else {
                break;
            };
            let (lbp, rbp) = operator.get_binding_power();
            if lbp < min_bp {
                break;
            }
            let _ = self.next_token()?;

            let rhs = self.parse_expression_pratt(rbp)?;
            let span = lhs.span.merge(&rhs.span);
            let node = match operator {
                Infix::Binary(operator) => self.script.push_expression(expression::Binary {
                    operator,
                    lhs: lhs.node,
                    rhs: rhs.node,
                    span,
                }),
                Infix::Logical(operator) => {
                    self.script.push_expression(expression::ShortCircuit {
                        operator,
                        lhs: lhs.node,
                        rhs: rhs.node,
                        span,
                    })
                }
            };
            lhs = Parsed {
                node,
                span,
                shape: Shape::Other,
            };
        }
        Ok(lhs)
    }
}

// Parse program/statements
impl<'src> Parser<'src> {
    pub fn parse(&mut self) -> Result<Rc<Script>, ParserError> {
        let statements = self.parse_sequence(&[TokenKind::Eof])?;
        self.expect(TokenKind::Eof)?;
        let mut script = std::mem::take(&mut self.script);
        let first = script.link(&statements);
        script.set_first(first);
        Ok(Rc::new(script))
    }

    /// Statements up to (not including) one of `terminators`.
    fn parse_sequence(
        &mut self,
        terminators: &[TokenKind],
    ) -> Result<Vec<StatementRef>, ParserError> {
        let mut statements = Vec::new();
        loop {
            while self.eat_if(TokenKind::Newline)?.is_some()
                || self.eat_if(TokenKind::Semicolon)?.is_some()
            {}
            let next = self.peek()?;
            if terminators.contains(&next.kind) {
                return Ok(statements);
            }
            if next.kind == TokenKind::Eof {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedEof,
                    span: next.span,
                });
            }
            statements.push(self.parse_statement()?);
        }
    }

    fn parse_statement(&mut self) -> Result<StatementRef, ParserError> {
        match self.peek()?.kind {
            TokenKind::KeywordIf => self.parse_if(),
            TokenKind::KeywordWhile => self.parse_while(),
            TokenKind::KeywordFor => self.parse_for(),
            TokenKind::KeywordDef => self.parse_def(),
            TokenKind::KeywordRecord => self.parse_record(),
            _ => {
                let statement = self.parse_simple()?;
                self.expect_terminator()?;
                Ok(statement)
            }
        }
    }

    fn at_terminator(&mut self) -> Result<bool, ParserError> {
        Ok(matches!(
            self.peek()?.kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
        ))
    }

    fn expect_terminator(&mut self) -> Result<(), ParserError> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Newline | TokenKind::Semicolon => {
                let _ = self.next_token()?;
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            actual => Err(ParserError {
                kind: ParserErrorKind::UnexpectedToken {
                    actual,
                    expected: TokenKind::Newline,
                },
                span: token.span,
            }),
        }
    }

    fn parse_simple(&mut self) -> Result<StatementRef, ParserError> {
        let token = self.peek()?;
        let statement = match token.kind {
            TokenKind::KeywordPrint => {
                let _ = self.next_token()?;
                let mut values = Vec::new();
                if !self.at_terminator()? {
                    values.push(self.parse_expression()?);
                    while self.eat_if(TokenKind::Comma)?.is_some() {
                        values.push(self.parse_expression()?);
                    }
                }
                self.script.push_statement(statement::Print { values })
            }
            TokenKind::KeywordPass => {
                let _ = self.next_token()?;
                self.script.push_statement(statement::Pass)
            }
            TokenKind::KeywordContinue => {
                let _ = self.next_token()?;
                self.script
                    .push_statement(statement::Continue { span: token.span })
            }
            TokenKind::KeywordBreak => {
                let _ = self.next_token()?;
                let mut span = token.span;
                let count = match self.eat_if(TokenKind::NumericLiteral)? {
                    Some(number) => {
                        span = span.merge(&number.span);
                        self.lexeme(&number)
                            .parse::<usize>()
                            .map_err(|_| ParserError {
                                kind: ParserErrorKind::InvalidBreakCount,
                                span: number.span,
                            })?
                    }
                    None => 1,
                };
                self.script
                    .push_statement(statement::Break { count, span })
            }
            TokenKind::KeywordReturn => {
                let _ = self.next_token()?;
                let value = match self.at_terminator()? {
                    true => None,
                    false => Some(self.parse_expression()?),
                };
                self.script.push_statement(statement::Return { value })
            }
            TokenKind::KeywordDel => {
                let _ = self.next_token()?;
                let (name, span) = self.name()?;
                self.script.push_statement(statement::Delete {
                    name,
                    span: token.span.merge(&span),
                })
            }
            _ => self.parse_expression_statement()?,
        };
        Ok(statement)
    }

    fn parse_expression_statement(&mut self) -> Result<StatementRef, ParserError> {
        let parsed = self.parse_expression_pratt(0)?;
        let operator = match self.peek()?.kind {
            TokenKind::Equal => AssignOperator::Set,
            TokenKind::PlusEqual => AssignOperator::Add,
            TokenKind::MinusEqual => AssignOperator::Subtract,
            _ => {
                return Ok(self.script.push_statement(statement::Expression {
                    expression: parsed.node,
                }))
            }
        };
        let _ = self.next_token()?;

        let target = match parsed.shape {
            Shape::Name(name) => AssignTarget::Name(name),
            Shape::Member { object, name } => AssignTarget::Member { object, name },
            Shape::Index { object, index } => AssignTarget::Index { object, index },
            Shape::Other => {
                return Err(ParserError {
                    kind: ParserErrorKind::InvalidAssignmentTarget,
                    span: parsed.span,
                })
            }
        };
        let value = self.parse_expression_pratt(0)?;
        Ok(self.script.push_statement(statement::Assign {
            target,
            operator,
            value: value.node,
            span: parsed.span.merge(&value.span),
        }))
    }

    /// Either `: simple` on the same line or a multi-line sequence. Returns
    /// the head of the block and whether it was the multi-line form.
    fn parse_block(&mut self) -> Result<(Option<StatementRef>, bool), ParserError> {
        if self.eat_if(TokenKind::Colon)?.is_some() {
            let statement = self.parse_simple()?;
            self.expect_terminator()?;
            return Ok((Some(statement), false));
        }
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Newline => {}
            TokenKind::Eof => {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedEof,
                    span: token.span,
                })
            }
            actual => {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedToken {
                        actual,
                        expected: TokenKind::Colon,
                    },
                    span: token.span,
                })
            }
        }
        let statements = self.parse_sequence(&[
            TokenKind::KeywordEnd,
            TokenKind::KeywordElsif,
            TokenKind::KeywordElse,
        ])?;
        Ok((self.script.link(&statements), true))
    }

    /// A compound needs `end` exactly when its last block was multi-line.
    fn finish_compound(&mut self, multi_line: bool) -> Result<(), ParserError> {
        if multi_line {
            self.expect(TokenKind::KeywordEnd)?;
            self.expect_terminator()?;
        }
        Ok(())
    }

    fn parse_if(&mut self) -> Result<StatementRef, ParserError> {
        let _ = self.expect(TokenKind::KeywordIf)?;
        let condition = self.parse_expression()?;
        let (body, mut multi_line) = self.parse_block()?;
        let mut branches = vec![(condition, body)];
        let mut otherwise = None;
        loop {
            while self.eat_if(TokenKind::Newline)?.is_some() {}
            if self.eat_if(TokenKind::KeywordElsif)?.is_some() {
                let condition = self.parse_expression()?;
                let (body, multi) = self.parse_block()?;
                branches.push((condition, body));
                multi_line = multi;
                continue;
            }
            if self.eat_if(TokenKind::KeywordElse)?.is_some() {
                let (body, multi) = self.parse_block()?;
                otherwise = Some(body);
                multi_line = multi;
            }
            break;
        }
        self.finish_compound(multi_line)?;
        Ok(self
            .script
            .push_statement(statement::If { branches, otherwise }))
    }

    fn parse_while(&mut self) -> Result<StatementRef, ParserError> {
        let _ = self.expect(TokenKind::KeywordWhile)?;
        let condition = self.parse_expression()?;
        let (body, multi_line) = self.parse_block()?;
        self.finish_compound(multi_line)?;
        Ok(self
            .script
            .push_statement(statement::While { condition, body }))
    }

    fn parse_for(&mut self) -> Result<StatementRef, ParserError> {
        let keyword = self.expect(TokenKind::KeywordFor)?;
        let (variable, _) = self.name()?;
        let _ = self.expect(TokenKind::KeywordIn)?;
        let iterable = self.parse_expression_pratt(0)?;
        let span = keyword.span.merge(&iterable.span);
        let (body, multi_line) = self.parse_block()?;
        self.finish_compound(multi_line)?;
        Ok(self.script.push_statement(statement::For {
            variable,
            iterable: iterable.node,
            body,
            span,
        }))
    }

    fn parse_def(&mut self) -> Result<StatementRef, ParserError> {
        let _ = self.expect(TokenKind::KeywordDef)?;
        let (name, _) = self.name()?;
        let _ = self.expect(TokenKind::LeftParenthesis)?;
        let mut parameters = Vec::new();
        loop {
            if self.eat_if(TokenKind::RightParenthesis)?.is_some() {
                break;
            }
            parameters.push(self.name()?.0);
            if self.eat_if(TokenKind::Comma)?.is_none() {
                let _ = self.expect(TokenKind::RightParenthesis)?;
                break;
            }
        }
        let (body, multi_line) = self.parse_block()?;
        self.finish_compound(multi_line)?;
        Ok(self.script.push_statement(statement::Function {
            name,
            parameters,
            body,
        }))
    }

    fn parse_record(&mut self) -> Result<StatementRef, ParserError> {
        let keyword = self.expect(TokenKind::KeywordRecord)?;
        let (name, name_span) = self.name()?;
        let span = keyword.span.merge(&name_span);
        // `record Name;` declares an empty record.
        let body = match self.peek()?.kind {
            TokenKind::Semicolon | TokenKind::Eof => {
                self.expect_terminator()?;
                None
            }
            _ => {
                let (body, multi_line) = self.parse_block()?;
                self.finish_compound(multi_line)?;
                body
            }
        };
        Ok(self
            .script
            .push_statement(statement::Record { name, body, span }))
    }
}
