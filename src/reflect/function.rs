use crate::error::Result;
use crate::reflect::factory::ReflectionFactory;
use crate::reflect::modifiers;
use crate::reflect::parameter::ReflectionParameter;
use crate::reflect::scalar::LazySlot;
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;

/// A method declared on (or composed into) a class-like entity.
#[derive(Debug)]
pub struct ReflectionMethod {
    /// Declaring class FQN; rebinding on trait composition updates it to
    /// the using class. A non-owning back reference.
    class: String,
    name: String,
    modifiers: u32,
    returns_reference: bool,
    doc_comment: Option<String>,
    parameters: Vec<Rc<ReflectionParameter>>,
    static_variables: IndexMap<String, LazySlot>,
}

impl ReflectionMethod {
    pub(crate) fn new(
        class: String,
        doc_comment: Option<String>,
        modifiers: u32,
        returns_reference: bool,
        name: String,
    ) -> Self {
        Self {
            class,
            name,
            modifiers,
            returns_reference,
            doc_comment,
            parameters: Vec::new(),
            static_variables: IndexMap::new(),
        }
    }

    pub(crate) fn set_parameters(&mut self, parameters: Vec<Rc<ReflectionParameter>>) {
        self.parameters = parameters;
    }

    pub(crate) fn set_static_variables(&mut self, static_variables: IndexMap<String, LazySlot>) {
        self.static_variables = static_variables;
    }

    /// Copy used by trait composition: rebinds the declaring class and
    /// optionally renames the method or overrides its visibility.
    pub(crate) fn rebind(
        &self,
        class: &str,
        visibility: Option<u32>,
        alias: Option<&str>,
    ) -> ReflectionMethod {
        let mut modifiers = self.modifiers;
        if let Some(visibility) = visibility {
            modifiers = (modifiers & !modifiers::ACCESS_MASK) | visibility;
        }
        ReflectionMethod {
            class: class.to_string(),
            name: alias.unwrap_or(&self.name).to_string(),
            modifiers,
            returns_reference: self.returns_reference,
            doc_comment: self.doc_comment.clone(),
            parameters: self.parameters.clone(),
            static_variables: self.static_variables.clone(),
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

    pub fn is_abstract(&self) -> bool {
        self.modifiers & modifiers::ABSTRACT != 0
    }

    pub fn is_final(&self) -> bool {
        self.modifiers & modifiers::FINAL != 0
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

    pub fn is_constructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__construct")
    }

    pub fn returns_reference(&self) -> bool {
        self.returns_reference
    }

    pub fn parameters(&self) -> &[Rc<ReflectionParameter>] {
        &self.parameters
    }

    pub fn number_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn number_of_required_parameters(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| !p.is_optional() && !p.is_variadic())
            .count()
    }

    /// `static $var` declarations found at statement starts in the body,
    /// with deferred initializers evaluated on first access.
    pub fn static_variables(&self, factory: &ReflectionFactory) -> Result<IndexMap<String, Value>> {
        let mut resolved = IndexMap::with_capacity(self.static_variables.len());
        for (name, slot) in &self.static_variables {
            let owner = format!("static ${} in {}::{}", name, self.class, self.name);
            resolved.insert(name.clone(), slot.get(factory, &owner)?);
        }
        Ok(resolved)
    }
}

/// A top-level function declaration.
#[derive(Debug)]
pub struct ReflectionFunction {
    name: String,
    doc_comment: Option<String>,
    returns_reference: bool,
    parameters: Vec<Rc<ReflectionParameter>>,
    static_variables: IndexMap<String, LazySlot>,
}

impl ReflectionFunction {
    pub(crate) fn new(name: String, doc_comment: Option<String>, returns_reference: bool) -> Self {
        Self {
            name,
            doc_comment,
            returns_reference,
            parameters: Vec::new(),
            static_variables: IndexMap::new(),
        }
    }

    pub(crate) fn set_parameters(&mut self, parameters: Vec<Rc<ReflectionParameter>>) {
        self.parameters = parameters;
    }

    pub(crate) fn set_static_variables(&mut self, static_variables: IndexMap<String, LazySlot>) {
        self.static_variables = static_variables;
    }

    /// Fully-qualified function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        self.name.rsplit('\\').next().unwrap_or(&self.name)
    }

    pub fn namespace_name(&self) -> &str {
        match self.name.rfind('\\') {
            Some(pos) => &self.name[..pos],
            None => "",
        }
    }

    pub fn in_namespace(&self) -> bool {
        self.name.contains('\\')
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.doc_comment.as_deref()
    }

    pub fn returns_reference(&self) -> bool {
        self.returns_reference
    }

    pub fn parameters(&self) -> &[Rc<ReflectionParameter>] {
        &self.parameters
    }

    pub fn number_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn number_of_required_parameters(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| !p.is_optional() && !p.is_variadic())
            .count()
    }

    pub fn static_variables(&self, factory: &ReflectionFactory) -> Result<IndexMap<String, Value>> {
        let mut resolved = IndexMap::with_capacity(self.static_variables.len());
        for (name, slot) in &self.static_variables {
            let owner = format!("static ${} in {}", name, self.name);
            resolved.insert(name.clone(), slot.get(factory, &owner)?);
        }
        Ok(resolved)
    }
}
