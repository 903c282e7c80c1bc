//! Object proxy
//!
//! An `ObjectProxy` binds one native object for its whole lifetime. At wrap
//! time it reads the object's property specifications into a descriptor
//! table and evaluates the capability table; afterwards every property access
//! and method call is a table lookup.

use std::fmt;

use objwrap_sdk::{canonical_name, NativeHandle, NativeObject, NativeValue, ParamSpec, ValueType};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::capability::{self, Capabilities, Method};
use crate::error::{BridgeError, BridgeResult};
use crate::marshal;
use crate::runtime::{Runtime, Value};

type Getter = fn(&dyn NativeObject, &ParamSpec) -> Value;
type Setter = fn(&dyn NativeObject, &ParamSpec, &Value);

/// Accessor pair for one native property, synthesized once at wrap time
#[derive(Clone)]
pub struct PropertyDescriptor {
    spec: ParamSpec,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl PropertyDescriptor {
    fn from_spec(spec: ParamSpec) -> Self {
        let getter: Option<Getter> = spec.flags.is_readable().then_some(read_property as Getter);
        let setter: Option<Setter> = spec.flags.is_writable().then_some(write_property as Setter);
        Self {
            spec,
            getter,
            setter,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn value_type(&self) -> ValueType {
        self.spec.value_type
    }

    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.spec.name)
            .field("type", &self.spec.value_type)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

fn read_property(obj: &dyn NativeObject, spec: &ParamSpec) -> Value {
    let mut value = NativeValue::default();
    if let Err(err) = value.init(spec.value_type) {
        warn!(property = %spec.name, error = %err, "cannot initialize property container");
        return Value::Undefined;
    }
    match obj.get_property(&spec.name, &mut value) {
        Ok(()) => marshal::from_native(&value),
        Err(err) => {
            warn!(
                class = obj.type_name(),
                property = %spec.name,
                error = %err,
                "native property read failed"
            );
            Value::Undefined
        }
    }
}

fn write_property(obj: &dyn NativeObject, spec: &ParamSpec, value: &Value) {
    let native = match marshal::try_to_native(value, spec.value_type) {
        Ok(native) => native,
        Err(err) => {
            warn!(
                class = obj.type_name(),
                property = %spec.name,
                got = value.type_name(),
                error = %err,
                "value does not fit the property type, write skipped"
            );
            return;
        }
    };
    if let Err(err) = obj.set_property(&spec.name, &native) {
        warn!(
            class = obj.type_name(),
            property = %spec.name,
            error = %err,
            "native property write failed"
        );
    }
}

/// Dynamic view of one native object.
///
/// The proxy holds a strong reference: the native object stays alive at
/// least as long as the proxy, and as long as any pull it started is still
/// running.
pub struct ObjectProxy {
    handle: NativeHandle,
    properties: FxHashMap<String, PropertyDescriptor>,
    /// Property names in the order the native type declares them
    order: Vec<String>,
    methods: FxHashMap<&'static str, Method>,
    capabilities: Capabilities,
}

impl ObjectProxy {
    /// Wrap a native object
    pub fn wrap(handle: NativeHandle) -> Self {
        let specs = handle.list_properties();
        let mut properties = FxHashMap::default();
        let mut order = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = spec.name.clone();
            if properties
                .insert(name.clone(), PropertyDescriptor::from_spec(spec))
                .is_none()
            {
                order.push(name);
            }
        }

        let (capabilities, methods) = capability::detect(handle.as_ref());
        debug!(
            class = handle.type_name(),
            properties = order.len(),
            pull = capabilities.pull,
            push = capabilities.push,
            "wrapped native object"
        );

        Self {
            handle,
            properties,
            order,
            methods,
            capabilities,
        }
    }

    /// Wrap the native object referenced by a dynamic value
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_native().map(|handle| Self::wrap(handle.clone()))
    }

    pub fn handle(&self) -> &NativeHandle {
        &self.handle
    }

    /// Registered type name of the wrapped object
    pub fn class_name(&self) -> &str {
        self.handle.type_name()
    }

    pub fn property_names(&self) -> &[String] {
        &self.order
    }

    pub fn descriptor(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(&canonical_name(name))
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Read a property; `Undefined` if the type declares no such property or
    /// it cannot be read
    pub fn get(&self, name: &str) -> Value {
        let Some(descriptor) = self.descriptor(name) else {
            trace!(class = self.class_name(), property = name, "get of unknown property");
            return Value::Undefined;
        };
        match descriptor.getter {
            Some(getter) => {
                let value = getter(self.handle.as_ref(), &descriptor.spec);
                trace!(property = %descriptor.spec.name, ?value, "property read");
                value
            }
            None => {
                trace!(property = %descriptor.spec.name, "property is not readable");
                Value::Undefined
            }
        }
    }

    /// Write a property; a no-op if the type declares no such property or it
    /// cannot be written
    pub fn set(&self, name: &str, value: &Value) {
        let Some(descriptor) = self.descriptor(name) else {
            trace!(class = self.class_name(), property = name, "set of unknown property ignored");
            return;
        };
        match descriptor.setter {
            Some(setter) => {
                trace!(property = %descriptor.spec.name, ?value, "property write");
                setter(self.handle.as_ref(), &descriptor.spec, value);
            }
            None => debug!(
                class = self.class_name(),
                property = %descriptor.spec.name,
                "write to read-only property ignored"
            ),
        }
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Installed method names, sorted
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Invoke an installed method
    pub fn call(&self, rt: &Runtime, method: &str, args: &[Value]) -> BridgeResult<Value> {
        match self.methods.get(method) {
            Some(f) => f(self, rt, args),
            None => Err(BridgeError::NoSuchMethod {
                class: self.class_name().to_string(),
                method: method.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ObjectProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProxy")
            .field("class", &self.class_name())
            .field("properties", &self.order)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objwrap_sdk::ParamFlags;
    use objwrap_test::FakeElement;
    use std::sync::Arc;

    fn element() -> Arc<FakeElement> {
        Arc::new(
            FakeElement::new("Volume", "vol0")
                .with(ParamSpec::read_write("volume", ValueType::Double), 1.0f64)
                .with(ParamSpec::read_write("mute", ValueType::Boolean), false)
                .with(ParamSpec::read_only("peak", ValueType::Float), 0.5f32)
                .with_default(ParamSpec::write_only("secret", ValueType::String))
                .with_default(ParamSpec::new(
                    "mode",
                    ValueType::Int,
                    ParamFlags::READWRITE | ParamFlags::CONSTRUCT_ONLY,
                )),
        )
    }

    #[test]
    fn test_descriptors_follow_flags() {
        let proxy = ObjectProxy::wrap(element());
        assert_eq!(proxy.class_name(), "Volume");
        assert_eq!(
            proxy.property_names(),
            &["name", "volume", "mute", "peak", "secret", "mode"]
        );
        let peak = proxy.descriptor("peak").unwrap();
        assert!(peak.is_readable() && !peak.is_writable());
        let secret = proxy.descriptor("secret").unwrap();
        assert!(!secret.is_readable() && secret.is_writable());
        assert!(!proxy.descriptor("mode").unwrap().is_writable());
    }

    #[test]
    fn test_get_and_set_round_trip() {
        let el = element();
        let proxy = ObjectProxy::wrap(el.clone());
        proxy.set("volume", &Value::from(0.25));
        proxy.set("mute", &Value::Bool(true));
        assert_eq!(proxy.get("volume"), Value::Number(0.25));
        assert_eq!(proxy.get("mute"), Value::Bool(true));
        assert_eq!(proxy.get("name"), Value::from("vol0"));
        assert_eq!(el.props().set_count(), 2);
    }

    #[test]
    fn test_underscore_names_resolve() {
        let el = Arc::new(
            FakeElement::new("Queue", "q0")
                .with(ParamSpec::read_write("max-size-buffers", ValueType::UInt), 200u32),
        );
        let proxy = ObjectProxy::wrap(el);
        assert_eq!(proxy.get("max_size_buffers"), Value::Number(200.0));
    }

    #[test]
    fn test_access_gated_by_flags() {
        let el = element();
        let proxy = ObjectProxy::wrap(el.clone());
        proxy.set("peak", &Value::from(0.9));
        proxy.set("mode", &Value::from(3));
        assert_eq!(el.props().set_count(), 0);
        assert_eq!(proxy.get("peak"), Value::Number(0.5));
        assert!(proxy.get("secret").is_undefined());
    }

    #[test]
    fn test_mistyped_write_keeps_old_value() {
        let el = Arc::new(
            FakeElement::new("FileSrc", "src0")
                .with(ParamSpec::read_write("volume", ValueType::Double), 1.0f64)
                .with(ParamSpec::read_write("location", ValueType::String), "/tmp/in")
                .with(ParamSpec::read_write("blocksize", ValueType::UInt), 4096u32),
        );
        let proxy = ObjectProxy::wrap(el.clone());
        proxy.set("volume", &Value::from("loud"));
        proxy.set("location", &Value::from(42));
        proxy.set("blocksize", &Value::from("big"));
        assert_eq!(proxy.get("volume"), Value::Number(1.0));
        assert_eq!(proxy.get("location"), Value::from("/tmp/in"));
        assert_eq!(proxy.get("blocksize"), Value::Number(4096.0));
        assert_eq!(el.props().set_count(), 0);
    }

    #[test]
    fn test_unknown_method() {
        let rt = Runtime::new().unwrap();
        let proxy = ObjectProxy::wrap(element());
        assert!(!proxy.has_method("pull"));
        assert!(matches!(
            proxy.call(&rt, "pull", &[]),
            Err(BridgeError::NoSuchMethod { .. })
        ));
    }
}
