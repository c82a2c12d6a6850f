use super::Value;
use crate::lexer::Span;
use compact_str::CompactString;
use thiserror::Error;

/// Malformed `break`/`continue` nesting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JumpError {
    #[error("No jump targets defined for continue")]
    NoContinueTarget,
    #[error("No jump targets defined for break")]
    NoBreakTarget,
    #[error("Too few nested compounds to break out of ({remaining} more needed)")]
    TooFewCompounds { remaining: usize },
    #[error("Invalid number of nested breaks")]
    InvalidBreakCount,
}

/// Raised when a context is asked to give away a namespace it only borrows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Context does not own its namespace")]
pub struct OwnershipError;

#[derive(Debug, Error, Clone)]
pub enum RuntimeErrorKind {
    #[error("Non-Number {{Unary}}: {0}")]
    NonNumeric(Value),
    #[error("Non-Numbers {{Binary}}: [{0} , {1}]")]
    NonNumerics(Value, Value),
    #[error("Non-Numbers/Non-Texts/Non-Arrays {{Binary}}: [{0} , {1}]")]
    NonAddable(Value, Value),
    #[error("Non-Comparable {{Binary}}: [{0} , {1}]")]
    NonComparable(Value, Value),
    #[error("Invalid Access: {0}")]
    InvalidAccess(CompactString),
    #[error("Undefined Member: {0}")]
    UndefinedMember(CompactString),
    #[error("Non-Record: {0}")]
    NonRecord(Value),
    #[error("Invalid Callee: {0}")]
    InvalidCallee(Value),
    #[error("Invalid Argument Count: {actual} of {expected}")]
    InvalidArgumentCount { actual: usize, expected: usize },
    #[error("Invalid Argument: {0}")]
    InvalidArgument(Value),
    #[error("Non-Iterable: {0}")]
    NonIterable(Value),
    #[error("Non-Indexable: {0}")]
    NonIndexable(Value),
    #[error("Index Out Of Range: {index} of {length}")]
    IndexOutOfRange { index: Value, length: usize },
    #[error("Undefined Scope: `self` is not available in this call")]
    UndefinedScope,
    #[error("{0}")]
    Jump(#[from] JumpError),
    #[error("{0}")]
    Ownership(#[from] OwnershipError),
    #[error("Script exceeded the execution time limit of {0:?}")]
    Hang(std::time::Duration),
    #[error("Process is still running a script")]
    NotStopped,
    #[error("Expression left {0} results instead of one")]
    UnbalancedResults(usize),
}

#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }

    /// Attaches a source position unless a more precise one is already known.
    pub fn or_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::NonNumeric(_) => "RT001",
            RuntimeErrorKind::NonNumerics(_, _) => "RT002",
            RuntimeErrorKind::NonAddable(_, _) => "RT003",
            RuntimeErrorKind::NonComparable(_, _) => "RT004",
            RuntimeErrorKind::InvalidAccess(_) => "RT005",
            RuntimeErrorKind::UndefinedMember(_) => "RT006",
            RuntimeErrorKind::NonRecord(_) => "RT007",
            RuntimeErrorKind::InvalidCallee(_) => "RT008",
            RuntimeErrorKind::InvalidArgumentCount { .. } => "RT009",
            RuntimeErrorKind::InvalidArgument(_) => "RT010",
            RuntimeErrorKind::NonIterable(_) => "RT011",
            RuntimeErrorKind::NonIndexable(_) => "RT012",
            RuntimeErrorKind::IndexOutOfRange { .. } => "RT013",
            RuntimeErrorKind::UndefinedScope => "RT014",
            RuntimeErrorKind::Jump(_) => "RT015",
            RuntimeErrorKind::Ownership(_) => "RT016",
            RuntimeErrorKind::Hang(_) => "RT017",
            RuntimeErrorKind::NotStopped => "RT018",
            RuntimeErrorKind::UnbalancedResults(_) => "RT019",
        }
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self { kind, span: None }
    }
}

impl From<JumpError> for RuntimeError {
    fn from(error: JumpError) -> Self {
        RuntimeErrorKind::from(error).into()
    }
}

impl From<OwnershipError> for RuntimeError {
    fn from(error: OwnershipError) -> Self {
        RuntimeErrorKind::from(error).into()
    }
}
