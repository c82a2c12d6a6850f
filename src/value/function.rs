use super::{error::RuntimeErrorKind, record::Namespace, Value};
use crate::interpreter::Process;
use crate::script::{Script, StatementRef};
use compact_str::CompactString;
use std::rc::Rc;

pub trait NativeFunction: std::fmt::Debug {
    fn get_name(&self) -> &'static str;
    fn get_parameters(&self) -> &'static [&'static str];
    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind>;
}

/// Everything a native function can see while it runs.
pub struct NativeCall<'a> {
    pub process: &'a mut Process,
    arguments: Vec<Value>,
    instance: Option<Value>,
}

impl<'a> NativeCall<'a> {
    pub fn new(process: &'a mut Process, arguments: Vec<Value>, instance: Option<Value>) -> Self {
        Self {
            process,
            arguments,
            instance,
        }
    }

    pub fn argument(&self, index: usize) -> Value {
        self.arguments.get(index).cloned().unwrap_or(Value::None)
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// The record the function was looked up in, e.g. `a` in `a.members()`.
    pub fn instance(&self) -> Result<&Value, RuntimeErrorKind> {
        self.instance.as_ref().ok_or(RuntimeErrorKind::UndefinedScope)
    }
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Script {
        script: Rc<Script>,
        entry: Option<StatementRef>,
    },
    Native(Rc<dyn NativeFunction>),
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: CompactString,
    pub parameters: Vec<CompactString>,
    pub body: FunctionBody,
    /// Namespace the function was defined in; calls resolve free names there.
    pub globals: Option<Namespace>,
}

impl Function {
    pub fn native(native: impl NativeFunction + 'static) -> Self {
        Self {
            name: native.get_name().into(),
            parameters: native.get_parameters().iter().map(|&p| p.into()).collect(),
            body: FunctionBody::Native(Rc::new(native)),
            globals: None,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.body, FunctionBody::Native(_))
    }

    pub fn check_arguments(&self, count: usize) -> Result<(), RuntimeErrorKind> {
        if count != self.parameters.len() {
            return Err(RuntimeErrorKind::InvalidArgumentCount {
                actual: count,
                expected: self.parameters.len(),
            });
        }
        Ok(())
    }
}
