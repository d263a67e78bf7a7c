use crate::error::Result;
use crate::reflect::factory::ReflectionFactory;
use crate::reflect::scalar::LazySlot;
use crate::value::Value;

/// Declared type hint of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    Array,
    Callable,
    /// Fully-qualified class or interface name.
    ClassName(String),
}

/// A declared parameter of a function or method.
#[derive(Debug)]
pub struct ReflectionParameter {
    /// Key of the declaring function: `Class::method` or a function FQN.
    /// A non-owning back reference; the factory owns the entities.
    function: String,
    position: usize,
    type_hint: Option<TypeHint>,
    by_reference: bool,
    variadic: bool,
    name: String,
    has_default: bool,
    default: Option<LazySlot>,
    /// Set only when the default was a bare constant name; callers that want
    /// the symbolic default rather than its value read this.
    default_constant: Option<String>,
}

impl ReflectionParameter {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        function: String,
        position: usize,
        type_hint: Option<TypeHint>,
        by_reference: bool,
        variadic: bool,
        name: String,
        has_default: bool,
        default: Option<LazySlot>,
        default_constant: Option<String>,
    ) -> Self {
        Self {
            function,
            position,
            type_hint,
            by_reference,
            variadic,
            name,
            has_default,
            default,
            default_constant,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 0-based position, left to right.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn declaring_function_name(&self) -> &str {
        &self.function
    }

    pub fn type_hint(&self) -> Option<&TypeHint> {
        self.type_hint.as_ref()
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.type_hint {
            Some(TypeHint::ClassName(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.type_hint == Some(TypeHint::Array)
    }

    pub fn is_callable(&self) -> bool {
        self.type_hint == Some(TypeHint::Callable)
    }

    /// An untyped parameter accepts null.
    pub fn allows_null(&self) -> bool {
        self.type_hint.is_none()
    }

    pub fn is_passed_by_reference(&self) -> bool {
        self.by_reference
    }

    pub fn can_be_passed_by_value(&self) -> bool {
        !self.by_reference
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn is_optional(&self) -> bool {
        self.has_default
    }

    pub fn is_default_value_available(&self) -> bool {
        self.has_default
    }

    /// The default value, evaluating a deferred expression on first access.
    pub fn default_value(&self, factory: &ReflectionFactory) -> Result<Option<Value>> {
        match &self.default {
            None => Ok(None),
            Some(slot) => {
                let owner = format!("parameter ${} of {}", self.name, self.function);
                slot.get(factory, &owner).map(Some)
            }
        }
    }

    pub fn is_default_value_constant(&self) -> bool {
        self.default_constant.is_some()
    }

    pub fn default_value_constant_name(&self) -> Option<&str> {
        self.default_constant.as_deref()
    }
}
