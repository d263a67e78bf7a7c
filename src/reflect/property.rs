use crate::error::Result;
use crate::reflect::factory::ReflectionFactory;
use crate::reflect::modifiers;
use crate::reflect::scalar::LazySlot;
use crate::value::Value;

/// A declared class property.
#[derive(Debug)]
pub struct ReflectionProperty {
    /// Declaring class FQN; a non-owning back reference.
    class: String,
    doc_comment: Option<String>,
    modifiers: u32,
    name: String,
    has_default: bool,
    default: Option<LazySlot>,
}

impl ReflectionProperty {
    pub(crate) fn new(
        class: String,
        doc_comment: Option<String>,
        modifiers: u32,
        name: String,
        has_default: bool,
        default: Option<LazySlot>,
    ) -> Self {
        Self {
            class,
            doc_comment,
            modifiers,
            name,
            has_default,
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_class_name(&self) -> &str {
        &self.class
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.doc_comment.as_deref()
    }

    pub fn modifiers(&self) -> u32 {
        self.modifiers
    }

    pub fn is_static(&self) -> bool {
        self.modifiers & modifiers::STATIC != 0
    }

    pub fn is_public(&self) -> bool {
        self.modifiers & modifiers::PUBLIC != 0
    }

    pub fn is_protected(&self) -> bool {
        self.modifiers & modifiers::PROTECTED != 0
    }

    pub fn is_private(&self) -> bool {
        self.modifiers & modifiers::PRIVATE != 0
    }

    /// Whether the declaration carried an initializer.
    pub fn has_default_value(&self) -> bool {
        self.has_default
    }

    /// The declared default, evaluating a deferred expression on first
    /// access. `None` when the property has no initializer.
    pub fn default_value(&self, factory: &ReflectionFactory) -> Result<Option<Value>> {
        match &self.default {
            None => Ok(None),
            Some(slot) => {
                let owner = format!("property {}::${}", self.class, self.name);
                slot.get(factory, &owner).map(Some)
            }
        }
    }
}
