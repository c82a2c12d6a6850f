use super::Value;
use compact_str::{CompactString, ToCompactString};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

/// Name of the member listing the records a record inherits from.
pub const SUPER_MEMBER: &str = "__super__";

/// A mapping from names to values; members are kept sorted by name.
#[derive(Debug, Default)]
pub struct Record {
    members: BTreeMap<CompactString, Value>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.members.insert(name.to_compact_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.members.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &CompactString> {
        self.members.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompactString, &Value)> {
        self.members.iter()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

/// Shared handle to a record, used both as a record value and as a scope for
/// identifier lookup.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    inner: Rc<RefCell<Record>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Looks up a member of this record only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.inner.borrow().get(name).cloned()
    }

    /// Looks up a member, falling back to the records listed in `__super__`.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.lookup_with_depth(name, 0)
    }

    fn lookup_with_depth(&self, name: &str, depth: usize) -> Option<Value> {
        // Guards against records that inherit from themselves.
        const MAX_INHERITANCE_DEPTH: usize = 32;

        let supers = {
            let inner = self.inner.borrow();
            if let Some(value) = inner.get(name) {
                return Some(value.clone());
            }
            inner.get(SUPER_MEMBER).cloned()?
        };
        if depth >= MAX_INHERITANCE_DEPTH {
            return None;
        }
        match supers {
            Value::Record(parent) => parent.lookup_with_depth(name, depth + 1),
            Value::Array(parents) => parents.borrow().iter().find_map(|parent| match parent {
                Value::Record(parent) => parent.lookup_with_depth(name, depth + 1),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn set(&self, name: &str, value: Value) {
        self.inner.borrow_mut().set(name, value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.inner.borrow_mut().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().contains(name)
    }

    pub fn names(&self) -> Vec<CompactString> {
        self.inner.borrow().names().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn clear(&self) {
        // Take the members out first so that dropping them cannot observe a
        // borrowed record.
        let members = std::mem::take(&mut self.inner.borrow_mut().members);
        drop(members);
    }

    pub fn with_record<R>(&self, f: impl FnOnce(&Record) -> R) -> R {
        f(&self.inner.borrow())
    }
}
