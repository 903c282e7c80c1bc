//! Dynamic values of the managed runtime
//!
//! Heap variants are `Rc`-based, so a `Value` can never leave the logical
//! thread that created it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use objwrap_sdk::NativeHandle;

use super::Runtime;

/// Shared, mutable byte container
pub type BufferRef = Rc<RefCell<Vec<u8>>>;

/// Insertion-ordered string-keyed map
pub type ObjectRef = Rc<RefCell<IndexMap<String, Value>>>;

/// Callable dynamic function
pub type FunctionRef = Rc<dyn Fn(&Runtime, &[Value]) -> Value>;

/// A native object reference held by the dynamic side.
///
/// Compared by identity: two `NativeRef`s are equal when they point at the
/// same native object.
#[derive(Clone)]
pub struct NativeRef(NativeHandle);

impl NativeRef {
    pub fn new(handle: NativeHandle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> &NativeHandle {
        &self.0
    }
}

impl PartialEq for NativeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NativeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0.type_name())
    }
}

/// Dynamic value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    /// Integer outside the exactly-representable `Number` range
    BigInt(i128),
    String(Rc<str>),
    Buffer(BufferRef),
    Object(ObjectRef),
    Function(FunctionRef),
    Native(NativeRef),
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Buffer(Rc::new(RefCell::new(bytes.into())))
    }

    pub fn empty_object() -> Self {
        Value::Object(Rc::new(RefCell::new(IndexMap::new())))
    }

    pub fn object(map: IndexMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(map)))
    }

    pub fn function(f: impl Fn(&Runtime, &[Value]) -> Value + 'static) -> Self {
        Value::Function(Rc::new(f))
    }

    pub fn native(handle: NativeHandle) -> Self {
        Value::Native(NativeRef::new(handle))
    }

    /// Type name as reported to script code
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Buffer(_) => "buffer",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Native(_) => "native",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeHandle> {
        match self {
            Value::Native(n) => Some(n.handle()),
            _ => None,
        }
    }

    /// Copy of a buffer's bytes
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Buffer(b) => Some(b.borrow().clone()),
            _ => None,
        }
    }

    /// Field of an object; `Undefined` for missing keys and non-objects
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.borrow().get(key).cloned().unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Keys of an object in insertion order
    pub fn keys(&self) -> Vec<String> {
        match self {
            Value::Object(map) => map.borrow().keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

impl PartialEq for Value {
    /// Primitives compare by value, heap values by identity
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::BigInt(i) => write!(f, "{}n", i),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Buffer(b) => write!(f, "<buffer {} bytes>", b.borrow().len()),
            Value::Object(map) => f.debug_map().entries(map.borrow().iter()).finish(),
            Value::Function(_) => f.write_str("<function>"),
            Value::Native(n) => write!(f, "{:?}", n),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_equality() {
        assert_eq!(Value::from(1.5), Value::Number(1.5));
        assert_eq!(Value::from("a"), Value::string("a"));
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::from(0), Value::Bool(false));
    }

    #[test]
    fn test_heap_values_compare_by_identity() {
        let a = Value::buffer(vec![1, 2]);
        let b = Value::buffer(vec![1, 2]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_object_access() {
        let mut map = IndexMap::new();
        map.insert("width".to_string(), Value::from(320));
        map.insert("format".to_string(), Value::from("I420"));
        let obj = Value::object(map);
        assert_eq!(obj.get("width"), Value::Number(320.0));
        assert!(obj.get("height").is_undefined());
        assert_eq!(obj.keys(), vec!["width", "format"]);
        assert!(Value::Null.get("width").is_undefined());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::default().type_name(), "undefined");
        assert_eq!(Value::BigInt(1).type_name(), "bigint");
        assert_eq!(Value::empty_object().type_name(), "object");
        assert_eq!(Value::function(|_, _| Value::Null).type_name(), "function");
    }
}
