use super::{Expression, ExpressionRef};
use crate::interpreter::{Evaluator, Process};
use crate::lexer::Span;
use crate::value::{
    error::{RuntimeError, RuntimeErrorKind},
    Value,
};
use compact_str::CompactString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug)]
pub struct Constant {
    pub value: Value,
    pub span: Span,
}

impl Expression for Constant {
    fn evaluate(
        &self,
        _evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        Ok(Some(self.value.clone()))
    }
}

#[derive(Debug)]
pub struct Name {
    pub name: CompactString,
    pub span: Span,
}

impl Expression for Name {
    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        evaluator
            .lookup(&self.name)
            .map(Some)
            .map_err(|kind| RuntimeError::new(kind, self.span))
    }
}

#[derive(Debug)]
pub struct Unary {
    pub operator: UnaryOperator,
    pub operand: ExpressionRef,
    pub span: Span,
}

impl Expression for Unary {
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
        evaluator.push(self.operand, None);
    }

    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        let (operand, _) = evaluator.pop_result()?;
        let value = match self.operator {
            UnaryOperator::Minus => operand
                .numeric_negate()
                .map_err(|kind| RuntimeError::new(kind, self.span))?,
            UnaryOperator::Not => Value::Bool(operand.logical_not()),
        };
        Ok(Some(value))
    }
}

#[derive(Debug)]
pub struct Binary {
    pub operator: BinaryOperator,
    pub lhs: ExpressionRef,
    pub rhs: ExpressionRef,
    pub span: Span,
}

impl Expression for Binary {
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
        evaluator.push(self.rhs, None);
        evaluator.push(self.lhs, None);
    }

    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        let (rhs, _) = evaluator.pop_result()?;
        let (lhs, _) = evaluator.pop_result()?;
        let value = match self.operator {
            BinaryOperator::Add => lhs.add(&rhs),
            BinaryOperator::Subtract => lhs.subtract(&rhs),
            BinaryOperator::Multiply => lhs.multiply(&rhs),
            BinaryOperator::Divide => lhs.divide(&rhs),
            BinaryOperator::Modulo => lhs.modulo(&rhs),
            BinaryOperator::Equal => Ok(Value::Bool(lhs.is_equal(&rhs))),
            BinaryOperator::NotEqual => Ok(Value::Bool(lhs.is_not_equal(&rhs))),
            BinaryOperator::LessThan => lhs.less_than(&rhs),
            BinaryOperator::LessThanOrEqual => lhs.less_than_or_equal(&rhs),
            BinaryOperator::GreaterThan => lhs.greater_than(&rhs),
            BinaryOperator::GreaterThanOrEqual => lhs.greater_than_or_equal(&rhs),
            BinaryOperator::In => rhs.contains(&lhs),
        };
        value
            .map(Some)
            .map_err(|kind| RuntimeError::new(kind, self.span))
    }
}

/// `and`/`or`. The right operand is only scheduled once the left one has been
/// found not to decide the result; its value then stands in for this node's.
#[derive(Debug)]
pub struct ShortCircuit {
    pub operator: LogicalOperator,
    pub lhs: ExpressionRef,
    pub rhs: ExpressionRef,
    pub span: Span,
}

impl Expression for ShortCircuit {
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
        evaluator.push(self.lhs, None);
    }

    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        let (lhs, _) = evaluator.pop_result()?;
        let decided = match self.operator {
            LogicalOperator::And => !lhs.is_truthy(),
            LogicalOperator::Or => lhs.is_truthy(),
        };
        if decided {
            return Ok(Some(lhs));
        }
        evaluator.push(self.rhs, None);
        Ok(None)
    }
}

/// `object.member`: `member` is evaluated with the record produced by
/// `object` as its only namespace.
#[derive(Debug)]
pub struct Member {
    pub object: ExpressionRef,
    pub member: ExpressionRef,
    pub span: Span,
}

impl Expression for Member {
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
        evaluator.push(self.object, None);
    }

    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        let (object, _) = evaluator.pop_result()?;
        if object.member_scope().is_none() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::NonRecord(object),
                self.span,
            ));
        }
        evaluator.push(self.member, Some(object));
        Ok(None)
    }
}

#[derive(Debug)]
pub struct Index {
    pub object: ExpressionRef,
    pub index: ExpressionRef,
    pub span: Span,
}

impl Expression for Index {
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
        evaluator.push(self.index, None);
        evaluator.push(self.object, None);
    }

    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        let (index, _) = evaluator.pop_result()?;
        let (object, _) = evaluator.pop_result()?;
        object
            .element(&index)
            .map(Some)
            .map_err(|kind| RuntimeError::new(kind, self.span))
    }
}

#[derive(Debug)]
pub struct Array {
    pub elements: Vec<ExpressionRef>,
    pub span: Span,
}

impl Expression for Array {
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
        for &element in self.elements.iter().rev() {
            evaluator.push(element, None);
        }
    }

    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        _process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        let mut items = (0..self.elements.len())
            .map(|_| evaluator.pop_result().map(|(value, _)| value.duplicate()))
            .collect::<Result<Vec<_>, _>>()?;
        items.reverse();
        Ok(Some(Value::array(items)))
    }
}

/// Function call. When the callee was looked up in a record, that record is
/// passed on as the instance the function runs against.
#[derive(Debug)]
pub struct Call {
    pub callee: ExpressionRef,
    pub arguments: Vec<ExpressionRef>,
    pub span: Span,
}

impl Expression for Call {
    fn push(&self, this: ExpressionRef, evaluator: &mut Evaluator, scope: Option<Value>) {
        evaluator.push_pending(this, scope);
        for &argument in self.arguments.iter().rev() {
            evaluator.push(argument, None);
        }
        evaluator.push(self.callee, None);
    }

    fn evaluate(
        &self,
        evaluator: &mut Evaluator,
        process: &mut Process,
    ) -> Result<Option<Value>, RuntimeError> {
        let mut arguments = (0..self.arguments.len())
            .map(|_| evaluator.pop_result().map(|(value, _)| value))
            .collect::<Result<Vec<_>, _>>()?;
        arguments.reverse();
        let (callee, instance) = evaluator.pop_result()?;

        let Value::Function(function) = callee else {
            return Err(RuntimeError::new(
                RuntimeErrorKind::InvalidCallee(callee),
                self.span,
            ));
        };
        process
            .call(&function, arguments, instance)
            .map(Some)
            .map_err(|error| error.or_span(self.span))
    }
}
