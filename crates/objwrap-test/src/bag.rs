//! Property storage shared by all test doubles

use std::sync::atomic::{AtomicUsize, Ordering};

use objwrap_sdk::{canonical_name, NativeError, NativeResult, NativeValue, ParamSpec};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Typed property table behaving like a native object's property storage.
///
/// Reads copy the stored value into the caller's container; writes are
/// type-checked against the declared type and counted.
pub struct PropertyBag {
    type_name: &'static str,
    specs: Vec<ParamSpec>,
    values: Mutex<FxHashMap<String, NativeValue>>,
    sets: AtomicUsize,
}

impl PropertyBag {
    /// Empty bag for objects of `type_name`
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            specs: Vec::new(),
            values: Mutex::new(FxHashMap::default()),
            sets: AtomicUsize::new(0),
        }
    }

    /// Declare a property with its initial value
    pub fn with(mut self, spec: ParamSpec, initial: impl Into<NativeValue>) -> Self {
        self.install(spec, initial.into());
        self
    }

    /// Declare a property holding the zero value of its type
    pub fn with_default(mut self, spec: ParamSpec) -> Self {
        let initial = NativeValue::new(spec.value_type);
        self.install(spec, initial);
        self
    }

    fn install(&mut self, spec: ParamSpec, initial: NativeValue) {
        assert_eq!(
            spec.value_type,
            initial.value_type(),
            "initial value of '{}' does not match its declared type",
            spec.name
        );
        self.values.get_mut().insert(spec.name.clone(), initial);
        self.specs.retain(|existing| existing.name != spec.name);
        self.specs.push(spec);
    }

    /// Registered type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Property specifications in declaration order
    pub fn specs(&self) -> Vec<ParamSpec> {
        self.specs.clone()
    }

    fn spec(&self, name: &str) -> NativeResult<&ParamSpec> {
        let name = canonical_name(name);
        self.specs
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| NativeError::UnknownProperty {
                type_name: self.type_name.to_string(),
                property: name,
            })
    }

    /// `get_property` semantics
    pub fn get(&self, name: &str, out: &mut NativeValue) -> NativeResult<()> {
        let spec = self.spec(name)?;
        if !spec.flags.is_readable() {
            return Err(NativeError::NotReadable(spec.name.clone()));
        }
        let values = self.values.lock();
        match values.get(&spec.name) {
            Some(stored) => out.copy_from(stored),
            None => Err(NativeError::NotReadable(spec.name.clone())),
        }
    }

    /// `set_property` semantics
    pub fn set(&self, name: &str, value: &NativeValue) -> NativeResult<()> {
        let spec = self.spec(name)?;
        if !spec.flags.is_writable() {
            return Err(NativeError::NotWritable(spec.name.clone()));
        }
        if value.value_type() != spec.value_type {
            return Err(NativeError::mismatch(spec.value_type, value.value_type()));
        }
        self.values.lock().insert(spec.name.clone(), value.clone());
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Overwrite a value from the native side, bypassing access flags
    pub fn store(&self, name: &str, value: NativeValue) {
        self.values.lock().insert(canonical_name(name), value);
    }

    /// Current value of a property, for assertions
    pub fn value(&self, name: &str) -> Option<NativeValue> {
        self.values.lock().get(&canonical_name(name)).cloned()
    }

    /// Number of successful `set` calls
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objwrap_sdk::ValueType;

    fn bag() -> PropertyBag {
        PropertyBag::new("TestThing")
            .with(ParamSpec::read_write("level", ValueType::Int), 3i32)
            .with(ParamSpec::read_only("locked", ValueType::Boolean), true)
    }

    #[test]
    fn test_get_copies_into_container() {
        let bag = bag();
        let mut out = NativeValue::new(ValueType::Int);
        bag.get("level", &mut out).unwrap();
        assert_eq!(out.as_int(), Some(3));
    }

    #[test]
    fn test_set_checks_type_and_flags() {
        let bag = bag();
        assert!(bag.set("level", &NativeValue::from("x")).is_err());
        assert!(bag.set("locked", &NativeValue::from(false)).is_err());
        bag.set("level", &NativeValue::from(9i32)).unwrap();
        assert_eq!(bag.value("level").unwrap().as_int(), Some(9));
        assert_eq!(bag.set_count(), 1);
    }

    #[test]
    fn test_unknown_property() {
        let bag = bag();
        let mut out = NativeValue::new(ValueType::Int);
        assert!(matches!(
            bag.get("missing", &mut out),
            Err(NativeError::UnknownProperty { .. })
        ));
    }
}
