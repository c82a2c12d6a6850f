use super::Process;
use crate::script::{ExpressionRef, Script};
use crate::value::{
    error::{RuntimeError, RuntimeErrorKind},
    Namespace, Value,
};
use std::rc::Rc;

#[derive(Debug)]
struct ScopedExpression {
    expression: ExpressionRef,
    scope: Option<Value>,
}

#[derive(Debug)]
struct ScopedResult {
    value: Value,
    scope: Option<Value>,
}

/// Post-order expression evaluator.
///
/// Every expression is scheduled together with an optional scope value. When
/// an entry is evaluated, the scope's namespace (if any) replaces the normal
/// name resolution chain, which is how `record.member` resolves `member`.
#[derive(Debug)]
pub struct Evaluator {
    script: Rc<Script>,
    visible: Vec<Namespace>,
    expressions: Vec<ScopedExpression>,
    results: Vec<ScopedResult>,
    names: Option<Namespace>,
    current: Option<ExpressionRef>,
}

impl Evaluator {
    /// `visible` lists the namespaces names resolve against, innermost first.
    pub fn new(script: Rc<Script>, visible: Vec<Namespace>) -> Self {
        Self {
            script,
            visible,
            expressions: Vec::new(),
            results: Vec::new(),
            names: None,
            current: None,
        }
    }

    pub fn evaluate(
        &mut self,
        expression: ExpressionRef,
        process: &mut Process,
    ) -> Result<Value, RuntimeError> {
        // An aborted pass may have left partial state behind.
        self.reset();
        self.push(expression, None);

        while let Some(ScopedExpression { expression, scope }) = self.expressions.pop() {
            self.names = scope.as_ref().and_then(Value::member_scope);
            self.current = Some(expression);
            let script = Rc::clone(&self.script);
            if let Some(value) = script.expression(expression).evaluate(self, process)? {
                self.results.push(ScopedResult { value, scope });
            }
        }

        self.names = None;
        self.current = None;
        if !self.has_result() {
            let count = self.results.len();
            self.reset();
            return Err(RuntimeErrorKind::UnbalancedResults(count).into());
        }
        let (value, _) = self.pop_result()?;
        Ok(value)
    }

    /// Schedules `expression`, letting the node decide how its children are
    /// scheduled.
    pub fn push(&mut self, expression: ExpressionRef, scope: Option<Value>) {
        let script = Rc::clone(&self.script);
        script.expression(expression).push(expression, self, scope);
    }

    /// Schedules `expression` itself, without visiting its children.
    pub fn push_pending(&mut self, expression: ExpressionRef, scope: Option<Value>) {
        self.expressions.push(ScopedExpression { expression, scope });
    }

    pub fn push_result(&mut self, value: Value, scope: Option<Value>) {
        self.results.push(ScopedResult { value, scope });
    }

    /// Pops the most recent result with the scope it was evaluated in.
    pub fn pop_result(&mut self) -> Result<(Value, Option<Value>), RuntimeErrorKind> {
        let result = self
            .results
            .pop()
            .ok_or(RuntimeErrorKind::UnbalancedResults(0))?;
        Ok((result.value, result.scope))
    }

    pub fn has_result(&self) -> bool {
        self.results.len() == 1
    }

    pub fn pending(&self) -> usize {
        self.expressions.len()
    }

    pub fn current(&self) -> Option<ExpressionRef> {
        self.current
    }

    /// Namespace set for the expression being evaluated, if it runs in a
    /// record scope.
    pub fn names(&self) -> Option<&Namespace> {
        self.names.as_ref()
    }

    /// Collects the namespaces that names currently resolve against,
    /// innermost first.
    pub fn namespaces(&self, out: &mut Vec<Namespace>) {
        match &self.names {
            Some(names) => out.push(names.clone()),
            None => out.extend(self.visible.iter().cloned()),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        match &self.names {
            Some(names) => names
                .lookup(name)
                .ok_or_else(|| RuntimeErrorKind::UndefinedMember(name.into())),
            None => self
                .visible
                .iter()
                .find_map(|ns| ns.lookup(name))
                .ok_or_else(|| RuntimeErrorKind::InvalidAccess(name.into())),
        }
    }

    /// Innermost namespace, the one assignments write to.
    pub fn innermost(&self) -> Option<&Namespace> {
        self.visible.first()
    }

    pub fn reset(&mut self) {
        self.expressions.clear();
        self.results.clear();
        self.names = None;
        self.current = None;
    }
}
