//! Plain element with properties and no data-flow capability

use objwrap_sdk::{NativeObject, NativeResult, NativeValue, ParamSpec, ValueType};

use crate::bag::PropertyBag;

/// Generic native object whose only surface is its property table
pub struct FakeElement {
    props: PropertyBag,
}

impl FakeElement {
    /// Element of `type_name` with a writable `name` property
    pub fn new(type_name: &'static str, name: &str) -> Self {
        Self {
            props: PropertyBag::new(type_name)
                .with(ParamSpec::read_write("name", ValueType::String), name),
        }
    }

    /// Declare an additional property
    pub fn with(mut self, spec: ParamSpec, initial: impl Into<NativeValue>) -> Self {
        self.props = self.props.with(spec, initial);
        self
    }

    /// Declare an additional property with a zero initial value
    pub fn with_default(mut self, spec: ParamSpec) -> Self {
        self.props = self.props.with_default(spec);
        self
    }

    /// Underlying property storage
    pub fn props(&self) -> &PropertyBag {
        &self.props
    }
}

impl NativeObject for FakeElement {
    fn type_name(&self) -> &str {
        self.props.type_name()
    }

    fn list_properties(&self) -> Vec<ParamSpec> {
        self.props.specs()
    }

    fn get_property(&self, name: &str, value: &mut NativeValue) -> NativeResult<()> {
        self.props.get(name, value)
    }

    fn set_property(&self, name: &str, value: &NativeValue) -> NativeResult<()> {
        self.props.set(name, value)
    }
}
