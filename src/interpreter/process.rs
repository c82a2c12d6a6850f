use super::{native, Context, SystemContext};
use crate::script::Script;
use crate::value::{
    error::{RuntimeError, RuntimeErrorKind},
    Function, FunctionBody, NativeCall, Namespace, Value,
};
use std::{
    rc::Rc,
    time::{Duration, Instant},
};
use tracing::{debug, trace};

/// Name under which the instance of a method call is bound.
pub const SELF_NAME: &str = "self";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Running,
    Suspended,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessConfig {
    /// Abort scripts that run longer than this.
    pub max_execution_time: Option<Duration>,
}

/// Runs scripts: owns the stack of contexts and the global namespace.
///
/// A context is taken off `stack` while one of its statements executes, so
/// that it and the process can be borrowed separately. Its visible
/// namespaces are kept in `executing` meanwhile, innermost context last.
pub struct Process {
    state: ProcessState,
    stack: Vec<Context>,
    executing: Vec<Vec<Namespace>>,
    globals: Namespace,
    output: Box<dyn SystemContext>,
    config: ProcessConfig,
    started_at: Option<Instant>,
    suspended_at: Option<Instant>,
}

impl Process {
    pub fn new(output: impl SystemContext + 'static, config: ProcessConfig) -> Self {
        let globals = Namespace::new();
        native::install(&globals);
        Self {
            state: ProcessState::Stopped,
            stack: Vec::new(),
            executing: Vec::new(),
            globals,
            output: Box::new(output),
            config,
            started_at: None,
            suspended_at: None,
        }
    }

    /// Starts running `script` from its first statement.
    pub fn run(&mut self, script: Rc<Script>) -> Result<(), RuntimeError> {
        if self.state != ProcessState::Stopped {
            return Err(RuntimeErrorKind::NotStopped.into());
        }
        self.stack.clear();
        let first = script.first();
        let mut context = Context::base(script, self.globals.clone());
        context.start(first, None, None, None);
        self.stack.push(context);
        self.started_at = Some(Instant::now());
        self.suspended_at = None;
        self.set_state(ProcessState::Running);
        Ok(())
    }

    /// Runs until the script ends, fails or the process is suspended.
    pub fn execute(&mut self) -> Result<(), RuntimeError> {
        while self.state == ProcessState::Running {
            match self.step() {
                Ok(true) => {}
                Ok(false) => self.set_state(ProcessState::Stopped),
                Err(error) => {
                    debug!(code = error.code(), "script failed: {error}");
                    self.set_state(ProcessState::Stopped);
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Executes one statement of the top context. Returns `false` when that
    /// context has nothing left to run.
    pub fn step(&mut self) -> Result<bool, RuntimeError> {
        if let (Some(limit), Some(started_at)) = (self.config.max_execution_time, self.started_at)
        {
            if started_at.elapsed() > limit {
                return Err(RuntimeErrorKind::Hang(limit).into());
            }
        }
        let Some(mut context) = self.stack.pop() else {
            return Ok(false);
        };
        self.executing.push(context.visible());
        let outcome = context.execute(self);
        self.executing.pop();
        self.stack.push(context);
        outcome
    }

    pub fn call(
        &mut self,
        function: &Function,
        arguments: Vec<Value>,
        instance: Option<Value>,
    ) -> Result<Value, RuntimeError> {
        function.check_arguments(arguments.len())?;
        match &function.body {
            FunctionBody::Native(native) => {
                let native = Rc::clone(native);
                let mut call = NativeCall::new(self, arguments, instance);
                Ok(native.call(&mut call)?)
            }
            FunctionBody::Script { script, entry } => {
                let locals = Namespace::new();
                for (name, value) in function.parameters.iter().zip(arguments) {
                    locals.set(name, value.duplicate());
                }
                if let Some(instance) = instance {
                    locals.set(SELF_NAME, instance);
                }
                let globals = function
                    .globals
                    .clone()
                    .unwrap_or_else(|| self.globals.clone());
                let mut context = Context::function_call(Rc::clone(script), locals, globals);
                context.start(*entry, None, None, None);
                trace!(name = %function.name, depth = self.depth(), "call");
                let mut context = self.run_to_completion(context)?;
                Ok(context.take_return_value().unwrap_or_default())
            }
        }
    }

    /// Runs a nested context until it has nothing left to do and hands it
    /// back. On failure the context is reset before the error is returned.
    ///
    /// Entered from outside any running statement, this is a new top-level
    /// entry and gets its own execution time budget.
    pub fn run_to_completion(&mut self, context: Context) -> Result<Context, RuntimeError> {
        let outer_clock = self.executing.is_empty().then(|| {
            let previous = self.started_at;
            self.started_at = Some(Instant::now());
            previous
        });
        let depth = self.stack.len();
        self.stack.push(context);
        let outcome = loop {
            match self.step() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(error) => break Err(error),
            }
        };
        if let Some(previous) = outer_clock {
            self.started_at = previous;
        }
        let mut context = self
            .stack
            .pop()
            .expect("Nested context is still on top of the stack.");
        debug_assert_eq!(self.stack.len(), depth);
        match outcome {
            Ok(()) => Ok(context),
            Err(error) => {
                context.reset();
                Err(error)
            }
        }
    }

    /// Collects the namespaces visible from the innermost active context,
    /// innermost first.
    pub fn namespaces(&self, out: &mut Vec<Namespace>) {
        if let Some(visible) = self.executing.last() {
            out.extend(visible.iter().cloned());
            return;
        }
        match self.stack.last() {
            Some(context) => context.namespaces(out),
            None => out.push(self.globals.clone()),
        }
    }

    /// Time spent suspended does not count against the execution time limit.
    pub fn suspend(&mut self, suspended: bool) {
        match (self.state, suspended) {
            (ProcessState::Running, true) => {
                self.suspended_at = Some(Instant::now());
                self.set_state(ProcessState::Suspended);
            }
            (ProcessState::Suspended, false) => {
                if let (Some(started_at), Some(suspended_at)) =
                    (self.started_at, self.suspended_at.take())
                {
                    self.started_at = Some(started_at + suspended_at.elapsed());
                }
                self.set_state(ProcessState::Running);
            }
            _ => {}
        }
    }

    /// Abandons the running script.
    pub fn stop(&mut self) {
        self.stack.clear();
        self.suspended_at = None;
        self.set_state(ProcessState::Stopped);
    }

    fn set_state(&mut self, state: ProcessState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "process state changed");
            self.state = state;
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Number of active contexts, including the ones executing right now.
    pub fn depth(&self) -> usize {
        self.stack.len() + self.executing.len()
    }

    pub fn globals(&self) -> &Namespace {
        &self.globals
    }

    /// The top context that is not in the middle of executing a statement.
    pub fn context(&self) -> Option<&Context> {
        self.stack.last()
    }

    pub fn context_mut(&mut self) -> Option<&mut Context> {
        self.stack.last_mut()
    }

    pub fn writeln(&mut self, text: &str) {
        self.output.writeln(text);
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        self.stack.clear();
        // Functions defined at the top level hold the globals they live in.
        self.globals.clear();
    }
}
