use crate::lexer::{LexicalError, Span, TokenKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserErrorKind {
    #[error("Expected {expected} but got {actual}")]
    UnexpectedToken {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("Expected an expression but got {0}")]
    NonExpression(TokenKind),
    #[error("Invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("Expected a whole number of loops to break out of")]
    InvalidBreakCount,
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("{0}")]
    Lexical(#[from] LexicalError),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    pub span: Span,
}

impl ParserError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ParserErrorKind::UnexpectedToken { .. } => "PE001",
            ParserErrorKind::NonExpression(_) => "PE002",
            ParserErrorKind::InvalidAssignmentTarget => "PE003",
            ParserErrorKind::InvalidBreakCount => "PE004",
            ParserErrorKind::UnexpectedEof => "PE005",
            ParserErrorKind::Lexical(_) => "PE006",
        }
    }
}

impl From<LexicalError> for ParserError {
    fn from(error: LexicalError) -> Self {
        Self {
            span: error.span,
            kind: ParserErrorKind::Lexical(error),
        }
    }
}
