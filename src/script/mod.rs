pub mod expression;
pub mod statement;

use crate::interpreter::{Context, Evaluator, Process};
use crate::value::{error::RuntimeError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementRef(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpressionRef(u32);

/// A node that runs against a control-flow context.
///
/// Statements never advance on their own: they either call
/// [`Context::proceed`], open a new frame with [`Context::start`] or jump.
pub trait Statement: std::fmt::Debug {
    fn execute(
        &self,
        this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError>;
}

/// A node evaluated in post-order by an [`Evaluator`].
pub trait Expression: std::fmt::Debug {
    /// Schedules this node. Nodes with children push themselves first and
    /// then their children, so that the children are evaluated beforehand.
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
    }

    /// Computes the node's value from the results of its children. Returns
    /// `None` when the node scheduled more work instead of producing a value.
    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError>;
}

#[derive(Debug)]
struct StatementSlot {
    node: Box<dyn Statement>,
    next: Option<StatementRef>,
}

/// Arena of the statements and expressions of one parsed source.
///
/// Nodes refer to each other through handles; the sequencing of statements
/// is kept in the arena rather than in the nodes.
#[derive(Debug, Default)]
pub struct Script {
    statements: Vec<StatementSlot>,
    expressions: Vec<Box<dyn Expression>>,
    first: Option<StatementRef>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_expression(&mut self, node: impl Expression + 'static) -> ExpressionRef {
        let index = self.expressions.len();
        self.expressions.push(Box::new(node));
        ExpressionRef(index as u32)
    }

    pub fn push_statement(&mut self, node: impl Statement + 'static) -> StatementRef {
        let index = self.statements.len();
        self.statements.push(StatementSlot {
            node: Box::new(node),
            next: None,
        });
        StatementRef(index as u32)
    }

    /// Chains `sequence` so that each statement is followed by the next one,
    /// returning the head of the chain.
    pub fn link(&mut self, sequence: &[StatementRef]) -> Option<StatementRef> {
        for pair in sequence.windows(2) {
            self.statements[pair[0].0 as usize].next = Some(pair[1]);
        }
        sequence.first().copied()
    }

    pub fn first(&self) -> Option<StatementRef> {
        self.first
    }

    pub fn set_first(&mut self, first: Option<StatementRef>) {
        self.first = first;
    }

    pub fn statement(&self, node: StatementRef) -> &dyn Statement {
        self.statements[node.0 as usize].node.as_ref()
    }

    pub fn next(&self, node: StatementRef) -> Option<StatementRef> {
        self.statements[node.0 as usize].next
    }

    pub fn expression(&self, node: ExpressionRef) -> &dyn Expression {
        self.expressions[node.0 as usize].as_ref()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }
}
