use super::{ExpressionRef, Statement, StatementRef};
use crate::interpreter::{Context, Process};
use crate::lexer::Span;
use crate::value::{
    error::{RuntimeError, RuntimeErrorKind},
    Function as FunctionValue, FunctionBody, Iteration, Value,
};
use compact_str::CompactString;
use std::rc::Rc;

/// A bare expression evaluated for its side effects.
#[derive(Debug)]
pub struct Expression {
    pub expression: ExpressionRef,
}

impl Statement for Expression {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        context.evaluate(self.expression, process)?;
        context.proceed();
        Ok(())
    }
}

#[derive(Debug)]
pub struct Print {
    pub values: Vec<ExpressionRef>,
}

impl Statement for Print {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        let mut line = String::new();
        for (index, &expression) in self.values.iter().enumerate() {
            if index > 0 {
                line.push(' ');
            }
            let value = context.evaluate(expression, process)?;
            line.push_str(&value.as_text());
        }
        process.writeln(&line);
        context.proceed();
        Ok(())
    }
}

#[derive(Debug)]
pub enum AssignTarget {
    Name(CompactString),
    Member {
        object: ExpressionRef,
        name: CompactString,
    },
    Index {
        object: ExpressionRef,
        index: ExpressionRef,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    Set,
    Add,
    Subtract,
}

#[derive(Debug)]
pub struct Assign {
    pub target: AssignTarget,
    pub operator: AssignOperator,
    pub value: ExpressionRef,
    pub span: Span,
}

impl Assign {
    fn combine(
        &self,
        current: impl FnOnce() -> Result<Value, RuntimeErrorKind>,
        value: Value,
    ) -> Result<Value, RuntimeErrorKind> {
        match self.operator {
            AssignOperator::Set => Ok(value.duplicate()),
            AssignOperator::Add => current()?.add(&value),
            AssignOperator::Subtract => current()?.subtract(&value),
        }
    }
}

impl Statement for Assign {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        let error = |kind| RuntimeError::new(kind, self.span);
        match &self.target {
            AssignTarget::Name(name) => {
                let value = context.evaluate(self.value, process)?;
                let value = self
                    .combine(|| context.lookup(name), value)
                    .map_err(error)?;
                context.names().set(name, value);
            }
            AssignTarget::Member { object, name } => {
                let object = context.evaluate(*object, process)?;
                let Some(scope) = object.member_scope() else {
                    return Err(error(RuntimeErrorKind::NonRecord(object)));
                };
                let value = context.evaluate(self.value, process)?;
                let current = || {
                    scope
                        .lookup(name)
                        .ok_or_else(|| RuntimeErrorKind::UndefinedMember(name.clone()))
                };
                let value = self.combine(current, value).map_err(error)?;
                scope.set(name, value);
            }
            AssignTarget::Index { object, index } => {
                let object = context.evaluate(*object, process)?;
                let index = context.evaluate(*index, process)?;
                let value = context.evaluate(self.value, process)?;
                let value = self
                    .combine(|| object.element(&index), value)
                    .map_err(error)?;
                object.set_element(&index, value).map_err(error)?;
            }
        }
        context.proceed();
        Ok(())
    }
}

#[derive(Debug)]
pub struct If {
    /// Conditions with the bodies they guard, tested in order.
    pub branches: Vec<(ExpressionRef, Option<StatementRef>)>,
    /// `else` body; `Some(None)` for an empty one.
    pub otherwise: Option<Option<StatementRef>>,
}

impl Statement for If {
    fn execute(
        &self,
        this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        let following = context.script().next(this);
        for &(condition, body) in &self.branches {
            if context.evaluate(condition, process)?.is_truthy() {
                context.start(body, following, None, None);
                return Ok(());
            }
        }
        match self.otherwise {
            Some(body) => context.start(body, following, None, None),
            None => context.proceed(),
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct While {
    pub condition: ExpressionRef,
    pub body: Option<StatementRef>,
}

impl Statement for While {
    fn execute(
        &self,
        this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        if context.evaluate(self.condition, process)?.is_truthy() {
            context.start(self.body, Some(this), Some(this), Some(this));
        } else {
            context.proceed();
        }
        Ok(())
    }
}

/// `for name in iterable`. The cursor lives on the frame the loop itself
/// runs in, so it survives each pass through the body.
#[derive(Debug)]
pub struct For {
    pub variable: CompactString,
    pub iterable: ExpressionRef,
    pub body: Option<StatementRef>,
    pub span: Span,
}

impl Statement for For {
    fn execute(
        &self,
        this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        if context.iteration_value().is_none() {
            let source = context.evaluate(self.iterable, process)?;
            let iteration =
                Iteration::new(source).map_err(|kind| RuntimeError::new(kind, self.span))?;
            context.set_iteration_value(Some(iteration));
        }
        match context.iteration_value_mut().and_then(Iteration::next) {
            Some(item) => {
                context.names().set(&self.variable, item);
                context.start(self.body, Some(this), Some(this), Some(this));
            }
            None => {
                context.set_iteration_value(None);
                context.proceed();
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Break {
    pub count: usize,
    pub span: Span,
}

impl Statement for Break {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        _process: &mut Process,
    ) -> Result<(), RuntimeError> {
        context
            .jump_break(self.count)
            .map_err(|error| RuntimeError::new(error.into(), self.span))
    }
}

#[derive(Debug)]
pub struct Continue {
    pub span: Span,
}

impl Statement for Continue {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        _process: &mut Process,
    ) -> Result<(), RuntimeError> {
        context
            .jump_continue()
            .map_err(|error| RuntimeError::new(error.into(), self.span))
    }
}

#[derive(Debug)]
pub struct Return {
    pub value: Option<ExpressionRef>,
}

impl Statement for Return {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        let value = match self.value {
            Some(expression) => context.evaluate(expression, process)?,
            None => Value::None,
        };
        context.finish(value);
        Ok(())
    }
}

#[derive(Debug)]
pub struct Pass;

impl Statement for Pass {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        _process: &mut Process,
    ) -> Result<(), RuntimeError> {
        context.proceed();
        Ok(())
    }
}

#[derive(Debug)]
pub struct Delete {
    pub name: CompactString,
    pub span: Span,
}

impl Statement for Delete {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        _process: &mut Process,
    ) -> Result<(), RuntimeError> {
        if context.names().remove(&self.name).is_none() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::InvalidAccess(self.name.clone()),
                self.span,
            ));
        }
        context.proceed();
        Ok(())
    }
}

/// `def name(parameters)`.
#[derive(Debug)]
pub struct Function {
    pub name: CompactString,
    pub parameters: Vec<CompactString>,
    pub body: Option<StatementRef>,
}

impl Statement for Function {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        _process: &mut Process,
    ) -> Result<(), RuntimeError> {
        // Free names in the body resolve against the outermost namespace.
        let globals = context.visible().pop();
        let function = FunctionValue {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            body: FunctionBody::Script {
                script: Rc::clone(context.script()),
                entry: self.body,
            },
            globals,
        };
        context
            .names()
            .set(&self.name, Value::Function(Rc::new(function)));
        context.proceed();
        Ok(())
    }
}

/// `record name`, optionally with a block whose names become the members.
#[derive(Debug)]
pub struct Record {
    pub name: CompactString,
    pub body: Option<StatementRef>,
    pub span: Span,
}

impl Statement for Record {
    fn execute(
        &self,
        _this: StatementRef,
        context: &mut Context,
        process: &mut Process,
    ) -> Result<(), RuntimeError> {
        let mut block = Context::namespace(Rc::clone(context.script()), context.visible());
        block.start(self.body, None, None, None);
        let mut block = process.run_to_completion(block)?;
        let record = block
            .take_namespace()
            .map_err(|error| RuntimeError::from(error).or_span(self.span))?;
        context.names().set(&self.name, Value::Record(record));
        context.proceed();
        Ok(())
    }
}
