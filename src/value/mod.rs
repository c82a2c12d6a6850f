pub mod error;
pub mod formatter;
mod function;
mod record;

use compact_str::{CompactString, CompactStringExt, ToCompactString};
use error::RuntimeErrorKind;
pub use function::{Function, FunctionBody, NativeCall, NativeFunction};
pub use record::{Namespace, Record, SUPER_MEMBER};
use std::{cell::RefCell, cmp::Ordering, rc::Rc};

pub type Array = Rc<RefCell<Vec<Value>>>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Number(f64),
    Text(CompactString),
    Bool(bool),
    Array(Array),
    Record(Namespace),
    Function(Rc<Function>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Bool(_) => "Boolean",
            Value::Array(_) => "Array",
            Value::Record(_) => "Record",
            Value::Function(_) => "Function",
        }
    }

    /// Copy for storing elsewhere. Arrays are copied element by element;
    /// records and functions are references and stay shared.
    pub fn duplicate(&self) -> Value {
        match self {
            Value::Array(items) => Value::array(items.borrow().clone()),
            v => v.clone(),
        }
    }

    pub fn as_text(&self) -> CompactString {
        self.to_compact_string()
    }

    /// The namespace this value provides to member lookups, if any.
    pub fn member_scope(&self) -> Option<Namespace> {
        match self {
            Value::Record(ns) => Some(ns.clone()),
            _ => None,
        }
    }

    fn fmt_nested(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        const MAX_DEPTH: usize = 8;
        match self {
            Value::Text(v) if depth > 0 => write!(f, "\"{v}\""),
            Value::Array(_) | Value::Record(_) if depth > MAX_DEPTH => write!(f, "..."),
            Value::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f, depth + 1)?;
                }
                write!(f, "]")
            }
            Value::Record(_) if depth > 0 => write!(f, "{{...}}"),
            Value::Record(ns) => ns.with_record(|record| {
                write!(f, "{{")?;
                for (index, (name, value)) in record.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: ")?;
                    value.fmt_nested(f, depth + 1)?;
                }
                write!(f, "}}")
            }),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Function(function) => write!(f, "<function {}>", function.name),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_nested(f, 0)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

// Unary operators
impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None | Value::Bool(false) => false,
            Value::Number(v) => *v != 0.0,
            Value::Text(v) => !v.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            _ => true,
        }
    }

    pub fn logical_not(&self) -> bool {
        !self.is_truthy()
    }

    pub fn numeric_negate(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Number(v) => Ok(Value::Number(-v)),
            v => Err(RuntimeErrorKind::NonNumeric(v.clone())),
        }
    }
}

impl Value {
    // Arithmetic + text/array concatenation
    pub fn add(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs + rhs)),
            (Value::Text(lhs), Value::Text(rhs)) => Ok(Value::Text([lhs, rhs].concat_compact())),
            (Value::Array(lhs), Value::Array(rhs)) => {
                let mut items = lhs.borrow().clone();
                items.extend(rhs.borrow().iter().cloned());
                Ok(Value::array(items))
            }
            (lhs, rhs) => Err(RuntimeErrorKind::NonAddable(lhs.clone(), rhs.clone())),
        }
    }

    fn numeric(
        &self,
        other: &Value,
        op: impl FnOnce(f64, f64) -> f64,
    ) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(op(*lhs, *rhs))),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(other, |lhs, rhs| lhs - rhs)
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(other, |lhs, rhs| lhs * rhs)
    }

    pub fn divide(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(other, |lhs, rhs| lhs / rhs)
    }

    pub fn modulo(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric(other, |lhs, rhs| lhs % rhs)
    }

    // Comparison
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => lhs.partial_cmp(rhs),
            (Value::Text(lhs), Value::Text(rhs)) => Some(lhs.cmp(rhs)),
            _ => None,
        }
    }

    fn ordered(
        &self,
        other: &Value,
        accept: impl FnOnce(Ordering) -> bool,
    ) -> Result<Value, RuntimeErrorKind> {
        match self.compare(other) {
            Some(ordering) => Ok(Value::Bool(accept(ordering))),
            None => match (self, other) {
                // NaN never orders against anything.
                (Value::Number(_), Value::Number(_)) => Ok(Value::Bool(false)),
                (lhs, rhs) => Err(RuntimeErrorKind::NonComparable(lhs.clone(), rhs.clone())),
            },
        }
    }

    pub fn less_than(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.ordered(other, Ordering::is_lt)
    }

    pub fn less_than_or_equal(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.ordered(other, Ordering::is_le)
    }

    pub fn greater_than(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.ordered(other, Ordering::is_gt)
    }

    pub fn greater_than_or_equal(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.ordered(other, Ordering::is_ge)
    }

    // Equality
    pub fn is_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => lhs == rhs,
            (Value::Text(lhs), Value::Text(rhs)) => lhs == rhs,
            (Value::None, Value::None) => true,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Array(lhs), Value::Array(rhs)) => {
                Rc::ptr_eq(lhs, rhs) || {
                    let (lhs, rhs) = (lhs.borrow(), rhs.borrow());
                    lhs.len() == rhs.len() && lhs.iter().zip(rhs.iter()).all(|(l, r)| l.is_equal(r))
                }
            }
            (Value::Record(lhs), Value::Record(rhs)) => lhs.ptr_eq(rhs),
            (Value::Function(lhs), Value::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }

    pub fn is_not_equal(&self, other: &Value) -> bool {
        !self.is_equal(other)
    }

    /// Membership test for `item in self`.
    pub fn contains(&self, item: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, item) {
            (Value::Array(items), item) => {
                Ok(Value::Bool(items.borrow().iter().any(|v| v.is_equal(item))))
            }
            (Value::Text(text), Value::Text(part)) => Ok(Value::Bool(text.contains(part.as_str()))),
            (Value::Record(ns), Value::Text(name)) => Ok(Value::Bool(ns.lookup(name).is_some())),
            (container, _) => Err(RuntimeErrorKind::NonIterable(container.clone())),
        }
    }
}

// Indexing
impl Value {
    fn position(index: &Value, length: usize) -> Result<usize, RuntimeErrorKind> {
        let out_of_range = || RuntimeErrorKind::IndexOutOfRange {
            index: index.clone(),
            length,
        };
        let Value::Number(v) = index else {
            return Err(RuntimeErrorKind::InvalidArgument(index.clone()));
        };
        if v.fract() != 0.0 {
            return Err(RuntimeErrorKind::InvalidArgument(index.clone()));
        }
        // Negative positions count from the end.
        let position = if *v < 0.0 {
            (length as f64) + v
        } else {
            *v
        };
        if position < 0.0 || position >= length as f64 {
            return Err(out_of_range());
        }
        Ok(position as usize)
    }

    pub fn element(&self, index: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, index) {
            (Value::Array(items), _) => {
                let items = items.borrow();
                let position = Self::position(index, items.len())?;
                Ok(items[position].clone())
            }
            (Value::Text(text), _) => {
                let length = text.chars().count();
                let position = Self::position(index, length)?;
                let c = text
                    .chars()
                    .nth(position)
                    .expect("Position was checked against the character count.");
                Ok(Value::Text(c.to_compact_string()))
            }
            (Value::Record(ns), Value::Text(name)) => ns
                .lookup(name)
                .ok_or_else(|| RuntimeErrorKind::UndefinedMember(name.clone())),
            (v, _) => Err(RuntimeErrorKind::NonIndexable(v.clone())),
        }
    }

    pub fn set_element(&self, index: &Value, value: Value) -> Result<(), RuntimeErrorKind> {
        match (self, index) {
            (Value::Array(items), _) => {
                let mut items = items.borrow_mut();
                let position = Self::position(index, items.len())?;
                items[position] = value;
                Ok(())
            }
            (Value::Record(ns), Value::Text(name)) => {
                ns.set(name, value);
                Ok(())
            }
            (v, _) => Err(RuntimeErrorKind::NonIndexable(v.clone())),
        }
    }
}

/// Cursor over the items of an iterable value, owned by a control-flow frame
/// while a `for` loop runs.
#[derive(Debug)]
pub struct Iteration {
    source: Value,
    position: usize,
}

impl Iteration {
    pub fn new(source: Value) -> Result<Self, RuntimeErrorKind> {
        match source {
            Value::Array(_) | Value::Text(_) | Value::Record(_) => Ok(Self {
                source,
                position: 0,
            }),
            v => Err(RuntimeErrorKind::NonIterable(v)),
        }
    }

    pub fn source(&self) -> &Value {
        &self.source
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Advances the cursor, yielding the next item if there is one.
    pub fn next(&mut self) -> Option<Value> {
        let item = match &self.source {
            Value::Array(items) => items.borrow().get(self.position).cloned(),
            Value::Text(text) => text
                .chars()
                .nth(self.position)
                .map(|c| Value::Text(c.to_compact_string())),
            Value::Record(ns) => ns.names().into_iter().nth(self.position).map(Value::Text),
            _ => None,
        }?;
        self.position += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_display_without_fraction() {
        assert_eq!(Value::Number(14.0).to_string(), "14");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::None.to_string(), "None");
    }

    #[test]
    fn containers_display_nested_values() {
        let array = Value::array(vec![Value::from(1.0), Value::from("a")]);
        assert_eq!(array.to_string(), "[1, \"a\"]");

        let ns = Namespace::new();
        ns.set("x", Value::from(2.0));
        ns.set("inner", Value::Record(Namespace::new()));
        assert_eq!(Value::Record(ns).to_string(), "{inner: {...}, x: 2}");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::array(vec![]).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Record(Namespace::new()).is_truthy());
    }

    #[test]
    fn addition_concatenates_texts_and_arrays() {
        let text = Value::from("ab").add(&Value::from("cd")).unwrap();
        assert_eq!(text.to_string(), "abcd");

        let lhs = Value::array(vec![Value::from(1.0)]);
        let rhs = Value::array(vec![Value::from(2.0)]);
        assert_eq!(lhs.add(&rhs).unwrap().to_string(), "[1, 2]");

        assert!(matches!(
            Value::from(1.0).add(&Value::from("x")),
            Err(RuntimeErrorKind::NonAddable(_, _))
        ));
    }

    #[test]
    fn equality_is_structural_for_arrays_and_identity_for_records() {
        let a = Value::array(vec![Value::from(1.0), Value::from("x")]);
        let b = Value::array(vec![Value::from(1.0), Value::from("x")]);
        assert!(a.is_equal(&b));

        let r1 = Value::Record(Namespace::new());
        let r2 = Value::Record(Namespace::new());
        assert!(r1.is_equal(&r1.clone()));
        assert!(!r1.is_equal(&r2));
    }

    #[test]
    fn duplicate_copies_arrays() {
        let original = Value::array(vec![Value::from(1.0)]);
        let copy = original.duplicate();
        copy.set_element(&Value::from(0.0), Value::from(9.0)).unwrap();
        assert_eq!(original.to_string(), "[1]");
        assert_eq!(copy.to_string(), "[9]");
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let array = Value::array(vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]);
        assert!(matches!(array.element(&Value::from(-1.0)), Ok(Value::Number(v)) if v == 3.0));
        assert!(matches!(
            array.element(&Value::from(3.0)),
            Err(RuntimeErrorKind::IndexOutOfRange { length: 3, .. })
        ));
    }

    #[test]
    fn iteration_walks_arrays_texts_and_records() {
        let mut it = Iteration::new(Value::from("ab")).unwrap();
        assert_eq!(it.next().unwrap().to_string(), "a");
        assert_eq!(it.next().unwrap().to_string(), "b");
        assert!(it.next().is_none());

        let ns = Namespace::new();
        ns.set("b", Value::None);
        ns.set("a", Value::None);
        let mut it = Iteration::new(Value::Record(ns)).unwrap();
        assert_eq!(it.next().unwrap().to_string(), "a");
        assert_eq!(it.next().unwrap().to_string(), "b");
        assert!(it.next().is_none());

        assert!(matches!(
            Iteration::new(Value::from(1.0)),
            Err(RuntimeErrorKind::NonIterable(_))
        ));
    }
}
