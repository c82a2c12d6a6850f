use crate::value::{
    error::RuntimeErrorKind, Function, NativeCall, NativeFunction, Namespace, Value,
};
use std::{
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

/// Name of the global record holding the methods every record can inherit.
pub const OBJECT_NAME: &str = "Object";

/// Seeds `globals` with the native library.
pub fn install(globals: &Namespace) {
    let functions: [Function; 6] = [
        Function::native(NativeLen),
        Function::native(NativeTypeOf),
        Function::native(NativeText),
        Function::native(NativeNumber),
        Function::native(NativeRange),
        Function::native(NativeClock),
    ];
    for function in functions {
        let name = function.name.clone();
        globals.set(&name, Value::Function(Rc::new(function)));
    }

    let object = Namespace::new();
    for function in [Function::native(NativeMembers), Function::native(NativeHas)] {
        let name = function.name.clone();
        object.set(&name, Value::Function(Rc::new(function)));
    }
    globals.set(OBJECT_NAME, Value::Record(object));
}

#[derive(Debug)]
pub struct NativeClock;

impl NativeFunction for NativeClock {
    fn get_name(&self) -> &'static str {
        "clock"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    fn call(&self, _call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        let duration_since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Ok(Value::Number(duration_since_epoch.as_secs_f64()))
    }
}

#[derive(Debug)]
pub struct NativeLen;

impl NativeFunction for NativeLen {
    fn get_name(&self) -> &'static str {
        "len"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &["value"]
    }

    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        let length = match call.argument(0) {
            Value::Text(text) => text.chars().count(),
            Value::Array(items) => items.borrow().len(),
            Value::Record(ns) => ns.len(),
            v => return Err(RuntimeErrorKind::InvalidArgument(v)),
        };
        Ok(Value::Number(length as f64))
    }
}

#[derive(Debug)]
pub struct NativeTypeOf;

impl NativeFunction for NativeTypeOf {
    fn get_name(&self) -> &'static str {
        "typeof"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &["value"]
    }

    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        Ok(Value::from(call.argument(0).type_name()))
    }
}

#[derive(Debug)]
pub struct NativeText;

impl NativeFunction for NativeText {
    fn get_name(&self) -> &'static str {
        "text"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &["value"]
    }

    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        Ok(Value::Text(call.argument(0).as_text()))
    }
}

#[derive(Debug)]
pub struct NativeNumber;

impl NativeFunction for NativeNumber {
    fn get_name(&self) -> &'static str {
        "number"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &["value"]
    }

    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        match call.argument(0) {
            Value::Number(v) => Ok(Value::Number(v)),
            Value::Bool(v) => Ok(Value::Number(if v { 1.0 } else { 0.0 })),
            Value::Text(text) => text
                .trim()
                .parse()
                .map(Value::Number)
                .map_err(|_| RuntimeErrorKind::InvalidArgument(Value::Text(text))),
            v => Err(RuntimeErrorKind::InvalidArgument(v)),
        }
    }
}

#[derive(Debug)]
pub struct NativeRange;

impl NativeFunction for NativeRange {
    fn get_name(&self) -> &'static str {
        "range"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &["count"]
    }

    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        match call.argument(0) {
            Value::Number(count) if count >= 0.0 && count.fract() == 0.0 => {
                let items = (0..count as usize)
                    .map(|index| Value::Number(index as f64))
                    .collect();
                Ok(Value::array(items))
            }
            v => Err(RuntimeErrorKind::InvalidArgument(v)),
        }
    }
}

/// `record.members()`: names of the record's own members.
#[derive(Debug)]
pub struct NativeMembers;

impl NativeFunction for NativeMembers {
    fn get_name(&self) -> &'static str {
        "members"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        let instance = call.instance()?;
        let Some(ns) = instance.member_scope() else {
            return Err(RuntimeErrorKind::NonRecord(instance.clone()));
        };
        let names = ns.names().into_iter().map(Value::Text).collect();
        Ok(Value::array(names))
    }
}

/// `record.has(name)`: whether `name` resolves on the record, inherited
/// members included.
#[derive(Debug)]
pub struct NativeHas;

impl NativeFunction for NativeHas {
    fn get_name(&self) -> &'static str {
        "has"
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn call(&self, call: &mut NativeCall<'_>) -> Result<Value, RuntimeErrorKind> {
        let name = match call.argument(0) {
            Value::Text(name) => name,
            v => return Err(RuntimeErrorKind::InvalidArgument(v)),
        };
        let instance = call.instance()?;
        let Some(ns) = instance.member_scope() else {
            return Err(RuntimeErrorKind::NonRecord(instance.clone()));
        };
        Ok(Value::Bool(ns.lookup(&name).is_some()))
    }
}
