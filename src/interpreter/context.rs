use super::{Evaluator, Process};
use crate::script::{ExpressionRef, Script, StatementRef};
use crate::value::{
    error::{JumpError, OwnershipError, RuntimeError, RuntimeErrorKind},
    Iteration, Namespace, Value,
};
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Top level of a script run; names live in the process globals.
    BaseProcess,
    /// Body of a script function; names live in fresh locals.
    FunctionCall,
    /// Body of a `record` block; names become the record's members.
    Namespace,
}

/// One level of nested control flow.
#[derive(Debug, Default)]
pub struct ControlFlow {
    pub current: Option<StatementRef>,
    pub fallback: Option<StatementRef>,
    pub continue_target: Option<StatementRef>,
    pub break_target: Option<StatementRef>,
    pub iteration: Option<Iteration>,
}

/// Executes the statements of one scope: the top level of a script, one
/// function call or one record block.
#[derive(Debug)]
pub struct Context {
    kind: ContextKind,
    script: Rc<Script>,
    frames: Vec<ControlFlow>,
    evaluator: Evaluator,
    names: Namespace,
    parents: Vec<Namespace>,
    owns_namespace: bool,
    return_value: Option<Value>,
}

impl Context {
    pub fn new(
        kind: ContextKind,
        script: Rc<Script>,
        names: Namespace,
        parents: Vec<Namespace>,
        owns_namespace: bool,
    ) -> Self {
        let visible = std::iter::once(names.clone())
            .chain(parents.iter().cloned())
            .collect();
        Self {
            kind,
            evaluator: Evaluator::new(Rc::clone(&script), visible),
            script,
            frames: Vec::new(),
            names,
            parents,
            owns_namespace,
            return_value: None,
        }
    }

    pub fn base(script: Rc<Script>, globals: Namespace) -> Self {
        Self::new(ContextKind::BaseProcess, script, globals, Vec::new(), false)
    }

    pub fn function_call(script: Rc<Script>, locals: Namespace, globals: Namespace) -> Self {
        Self::new(ContextKind::FunctionCall, script, locals, vec![globals], true)
    }

    /// A record block: fresh names, with everything the caller sees still
    /// visible behind them.
    pub fn namespace(script: Rc<Script>, parents: Vec<Namespace>) -> Self {
        Self::new(ContextKind::Namespace, script, Namespace::new(), parents, true)
    }
}

// Control flow
impl Context {
    /// Opens a frame running `statement`. An empty sequence falls straight
    /// through to `fallback`.
    pub fn start(
        &mut self,
        statement: Option<StatementRef>,
        fallback: Option<StatementRef>,
        continue_target: Option<StatementRef>,
        break_target: Option<StatementRef>,
    ) {
        self.frames.push(ControlFlow {
            current: statement,
            fallback,
            continue_target,
            break_target,
            iteration: None,
        });
        self.evaluator.reset();
        if statement.is_none() {
            self.proceed();
        }
    }

    /// Runs the current statement. Returns `false` once there is nothing left
    /// to run.
    pub fn execute(&mut self, process: &mut Process) -> Result<bool, RuntimeError> {
        let Some(current) = self.current() else {
            return Ok(false);
        };
        let script = Rc::clone(&self.script);
        script.statement(current).execute(current, self, process)?;
        Ok(true)
    }

    /// Moves on to the statement after the current one, leaving every frame
    /// whose sequence is exhausted.
    pub fn proceed(&mut self) {
        let mut next = self.current().and_then(|current| self.script.next(current));
        while next.is_none() {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            next = frame.fallback;
        }
        self.set_current(next);
    }

    pub fn jump_continue(&mut self) -> Result<(), JumpError> {
        while let Some(frame) = self.frames.pop() {
            if let Some(target) = frame.continue_target {
                trace!(depth = self.frames.len(), "continue");
                self.set_current(Some(target));
                return Ok(());
            }
        }
        Err(JumpError::NoContinueTarget)
    }

    /// Leaves `count` breakable constructs and resumes after the outermost
    /// of them.
    pub fn jump_break(&mut self, count: usize) -> Result<(), JumpError> {
        if count == 0 {
            return Err(JumpError::InvalidBreakCount);
        }
        let mut remaining = count;
        let mut target = None;
        while remaining > 0 {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            if let Some(break_target) = frame.break_target {
                remaining -= 1;
                target = Some(break_target);
            }
        }
        match target {
            None => Err(JumpError::NoBreakTarget),
            Some(_) if remaining > 0 => Err(JumpError::TooFewCompounds { remaining }),
            Some(target) => {
                trace!(depth = self.frames.len(), count, "break");
                self.set_current(Some(target));
                if let Some(frame) = self.frames.last_mut() {
                    frame.iteration = None;
                }
                self.proceed();
                Ok(())
            }
        }
    }

    /// Drops every frame and any partial evaluation.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.evaluator.reset();
    }

    pub fn current(&self) -> Option<StatementRef> {
        self.frames.last().and_then(|frame| frame.current)
    }

    fn set_current(&mut self, statement: Option<StatementRef>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.current = statement;
            self.evaluator.reset();
        }
    }

    pub fn iteration_value(&self) -> Option<&Iteration> {
        self.frames.last().and_then(|frame| frame.iteration.as_ref())
    }

    pub fn iteration_value_mut(&mut self) -> Option<&mut Iteration> {
        self.frames
            .last_mut()
            .and_then(|frame| frame.iteration.as_mut())
    }

    /// Replaces the top frame's iteration cursor, dropping the previous one.
    pub fn set_iteration_value(&mut self, iteration: Option<Iteration>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.iteration = iteration;
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[ControlFlow] {
        &self.frames
    }
}

// Evaluation and names
impl Context {
    pub fn evaluate(
        &mut self,
        expression: ExpressionRef,
        process: &mut Process,
    ) -> Result<Value, RuntimeError> {
        self.evaluator.evaluate(expression, process)
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut Evaluator {
        &mut self.evaluator
    }

    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        self.evaluator.lookup(name)
    }

    /// The namespace this context writes names into.
    pub fn names(&self) -> &Namespace {
        &self.names
    }

    /// Collects every namespace visible from this context, innermost first.
    pub fn namespaces(&self, out: &mut Vec<Namespace>) {
        out.push(self.names.clone());
        out.extend(self.parents.iter().cloned());
    }

    pub fn visible(&self) -> Vec<Namespace> {
        let mut out = Vec::with_capacity(self.parents.len() + 1);
        self.namespaces(&mut out);
        out
    }

    /// Hands over the context's namespace, which must be owned by it.
    pub fn take_namespace(&mut self) -> Result<Namespace, OwnershipError> {
        if !self.owns_namespace {
            return Err(OwnershipError);
        }
        self.owns_namespace = false;
        Ok(self.names.clone())
    }

    pub fn owns_namespace(&self) -> bool {
        self.owns_namespace
    }

    /// Ends the context with a return value.
    pub fn finish(&mut self, value: Value) {
        trace!(kind = ?self.kind, "finish");
        self.return_value = Some(value);
        self.reset();
    }

    pub fn take_return_value(&mut self) -> Option<Value> {
        self.return_value.take()
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn script(&self) -> &Rc<Script> {
        &self.script
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.reset();
        debug_assert!(self.frames.is_empty());
        // Locals may reference themselves through records and functions.
        if self.owns_namespace {
            self.names.clear();
        }
    }
}
