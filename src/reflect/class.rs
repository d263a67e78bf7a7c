use crate::error::{Error, Result};
use crate::reflect::factory::ReflectionFactory;
use crate::reflect::function::ReflectionMethod;
use crate::reflect::modifiers;
use crate::reflect::property::ReflectionProperty;
use crate::reflect::scalar::{ConstantValue, LazySlot};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// What a class-like declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Class,
    Interface,
    Trait,
}

/// `Owner::method insteadof Subordinate, ...` inside a trait use block.
#[derive(Debug, Clone)]
pub struct PrecedenceRule {
    pub trait_name: String,
    pub method: String,
    pub instead_of: Vec<String>,
}

/// `[Trait::]method as [visibility] [alias]` inside a trait use block.
#[derive(Debug, Clone)]
pub struct AliasRule {
    pub trait_name: Option<String>,
    pub method: String,
    pub visibility: Option<u32>,
    pub alias: Option<String>,
}

/// A class, interface or trait, reflected from source without loading it.
///
/// Member maps start with the entity's own declarations. Inherited and
/// composed members are merged in lazily, once, the first time a query
/// needs them; the `classes_resolved` / `interfaces_resolved` gates keep
/// the merge from ever running twice (it would duplicate members).
#[derive(Debug)]
pub struct ReflectionClass {
    kind: EntityKind,
    name: String,
    filename: Option<PathBuf>,
    doc_comment: Option<String>,
    modifiers: u32,
    parent: Option<String>,
    interface_names: Vec<String>,
    trait_names: Vec<String>,
    precedence_rules: Vec<PrecedenceRule>,
    alias_rules: Vec<AliasRule>,
    constants: RefCell<IndexMap<String, LazySlot>>,
    properties: RefCell<IndexMap<String, Rc<ReflectionProperty>>>,
    methods: RefCell<IndexMap<String, Rc<ReflectionMethod>>>,
    trait_aliases: RefCell<Option<IndexMap<String, String>>>,
    classes_resolved: Cell<bool>,
    interfaces_resolved: Cell<bool>,
    /// In-progress marker; a reentrant resolution of the same entity is an
    /// inheritance cycle.
    resolving: Cell<bool>,
}

impl ReflectionClass {
    pub(crate) fn new(
        kind: EntityKind,
        name: String,
        filename: Option<PathBuf>,
        doc_comment: Option<String>,
        modifiers: u32,
        interface_names: Vec<String>,
        parent: Option<String>,
    ) -> Self {
        Self {
            kind,
            name,
            filename,
            doc_comment,
            modifiers,
            parent,
            interface_names,
            trait_names: Vec::new(),
            precedence_rules: Vec::new(),
            alias_rules: Vec::new(),
            constants: RefCell::new(IndexMap::new()),
            properties: RefCell::new(IndexMap::new()),
            methods: RefCell::new(IndexMap::new()),
            trait_aliases: RefCell::new(None),
            classes_resolved: Cell::new(false),
            interfaces_resolved: Cell::new(false),
            resolving: Cell::new(false),
        }
    }

    pub(crate) fn add_trait_name(&mut self, trait_name: String) {
        self.trait_names.push(trait_name);
    }

    pub(crate) fn add_precedence_rule(&mut self, rule: PrecedenceRule) {
        self.precedence_rules.push(rule);
    }

    pub(crate) fn add_alias_rule(&mut self, rule: AliasRule) {
        self.alias_rules.push(rule);
    }

    pub(crate) fn add_constant(&mut self, name: String, value: ConstantValue) {
        self.constants.get_mut().insert(name, LazySlot::new(value));
    }

    pub(crate) fn add_property(&mut self, property: ReflectionProperty) {
        self.properties
            .get_mut()
            .insert(property.name().to_string(), Rc::new(property));
    }

    pub(crate) fn add_method(&mut self, method: ReflectionMethod) {
        self.methods
            .get_mut()
            .insert(method.name().to_string(), Rc::new(method));
    }

    // ---- static metadata ----

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Fully-qualified name.
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

    pub fn file_name(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.doc_comment.as_deref()
    }

    pub fn modifiers(&self) -> u32 {
        self.modifiers
    }

    pub fn is_interface(&self) -> bool {
        self.kind == EntityKind::Interface
    }

    pub fn is_trait(&self) -> bool {
        self.kind == EntityKind::Trait
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers & modifiers::CLASS_EXPLICIT_ABSTRACT != 0
    }

    pub fn is_final(&self) -> bool {
        self.modifiers & modifiers::CLASS_FINAL != 0
    }

    pub fn is_user_defined(&self) -> bool {
        true
    }

    pub fn parent_class_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn interface_names(&self) -> &[String] {
        &self.interface_names
    }

    pub fn implements_interface(&self, interface: &str) -> bool {
        let interface = interface.trim_start_matches('\\');
        self.interface_names.iter().any(|name| name == interface)
    }

    pub fn trait_names(&self) -> &[String] {
        &self.trait_names
    }

    pub fn precedence_rules(&self) -> &[PrecedenceRule] {
        &self.precedence_rules
    }

    pub fn alias_rules(&self) -> &[AliasRule] {
        &self.alias_rules
    }

    /// `alias => "Trait::method"` for alias rules with an explicit source
    /// trait and a new name. Memoized.
    pub fn trait_aliases(&self) -> IndexMap<String, String> {
        if let Some(aliases) = &*self.trait_aliases.borrow() {
            return aliases.clone();
        }
        let mut aliases = IndexMap::new();
        for rule in &self.alias_rules {
            if let (Some(trait_name), Some(alias)) = (&rule.trait_name, &rule.alias) {
                aliases.insert(alias.clone(), format!("{}::{}", trait_name, rule.method));
            }
        }
        *self.trait_aliases.borrow_mut() = Some(aliases.clone());
        aliases
    }

    // ---- resolving collaborators ----

    pub fn parent_class(&self, factory: &ReflectionFactory) -> Result<Option<Rc<ReflectionClass>>> {
        match &self.parent {
            Some(parent) => factory.get_class(parent).map(Some),
            None => Ok(None),
        }
    }

    /// Declared interfaces, loaded through the factory and validated.
    pub fn interfaces(
        &self,
        factory: &ReflectionFactory,
    ) -> Result<IndexMap<String, Rc<ReflectionClass>>> {
        let mut interfaces = IndexMap::new();
        for name in &self.interface_names {
            let interface = factory.get_class(name)?;
            if !interface.is_interface() {
                return Err(Error::Composition(format!(
                    "{} cannot implement {} - it is not an interface",
                    self.name, name
                )));
            }
            interfaces.insert(name.clone(), interface);
        }
        Ok(interfaces)
    }

    /// Declared traits, loaded through the factory and validated.
    pub fn traits(
        &self,
        factory: &ReflectionFactory,
    ) -> Result<IndexMap<String, Rc<ReflectionClass>>> {
        let mut traits = IndexMap::new();
        for name in &self.trait_names {
            let used = factory.get_class(name)?;
            if !used.is_trait() {
                return Err(Error::Composition(format!(
                    "{} cannot use {} - it is not a trait",
                    self.name, name
                )));
            }
            traits.insert(name.clone(), used);
        }
        Ok(traits)
    }

    // ---- member queries (trigger lazy resolution) ----

    pub fn has_method(&self, factory: &ReflectionFactory, name: &str) -> Result<bool> {
        if self.methods.borrow().contains_key(name) {
            return Ok(true);
        }
        self.resolve_classes(factory)?;
        Ok(self.methods.borrow().contains_key(name))
    }

    pub fn method(
        &self,
        factory: &ReflectionFactory,
        name: &str,
    ) -> Result<Option<Rc<ReflectionMethod>>> {
        self.resolve_classes(factory)?;
        Ok(self.methods.borrow().get(name).cloned())
    }

    /// All methods in declaration order, optionally filtered by a modifier
    /// bitmask.
    pub fn methods(
        &self,
        factory: &ReflectionFactory,
        filter: Option<u32>,
    ) -> Result<Vec<Rc<ReflectionMethod>>> {
        self.resolve_classes(factory)?;
        let methods = self.methods.borrow();
        Ok(methods
            .values()
            .filter(|method| match filter {
                Some(filter) => method.modifiers() & filter != 0,
                None => true,
            })
            .cloned()
            .collect())
    }

    pub fn constructor(&self, factory: &ReflectionFactory) -> Result<Option<Rc<ReflectionMethod>>> {
        self.method(factory, "__construct")
    }

    pub fn has_property(&self, factory: &ReflectionFactory, name: &str) -> Result<bool> {
        if self.properties.borrow().contains_key(name) {
            return Ok(true);
        }
        self.resolve_classes(factory)?;
        Ok(self.properties.borrow().contains_key(name))
    }

    pub fn property(
        &self,
        factory: &ReflectionFactory,
        name: &str,
    ) -> Result<Option<Rc<ReflectionProperty>>> {
        self.resolve_classes(factory)?;
        Ok(self.properties.borrow().get(name).cloned())
    }

    pub fn properties(
        &self,
        factory: &ReflectionFactory,
        filter: Option<u32>,
    ) -> Result<Vec<Rc<ReflectionProperty>>> {
        self.resolve_classes(factory)?;
        let properties = self.properties.borrow();
        Ok(properties
            .values()
            .filter(|property| match filter {
                Some(filter) => property.modifiers() & filter != 0,
                None => true,
            })
            .cloned()
            .collect())
    }

    /// Declared defaults of the entity's own properties, evaluated.
    pub fn default_properties(
        &self,
        factory: &ReflectionFactory,
    ) -> Result<IndexMap<String, Option<Value>>> {
        let properties: Vec<_> = self.properties.borrow().values().cloned().collect();
        let mut defaults = IndexMap::with_capacity(properties.len());
        for property in properties {
            defaults.insert(
                property.name().to_string(),
                property.default_value(factory)?,
            );
        }
        Ok(defaults)
    }

    pub fn has_constant(&self, factory: &ReflectionFactory, name: &str) -> Result<bool> {
        if self.constants.borrow().contains_key(name) {
            return Ok(true);
        }
        self.resolve_classes(factory)?;
        self.resolve_interfaces(factory)?;
        Ok(self.constants.borrow().contains_key(name))
    }

    /// Resolves a constant, evaluating a deferred initializer in place.
    pub fn get_constant(&self, factory: &ReflectionFactory, name: &str) -> Result<Option<Value>> {
        if !self.has_constant(factory, name)? {
            return Ok(None);
        }
        let slot = self
            .constants
            .borrow()
            .get(name)
            .cloned()
            .expect("constant present after has_constant");
        let owner = format!("{}::{}", self.name, name);
        slot.get(factory, &owner).map(Some)
    }

    /// All constants (own, trait, parent and interface) evaluated, in merge
    /// order.
    pub fn constants(&self, factory: &ReflectionFactory) -> Result<IndexMap<String, Value>> {
        self.resolve_classes(factory)?;
        self.resolve_interfaces(factory)?;
        let slots: Vec<(String, LazySlot)> = self
            .constants
            .borrow()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect();
        let mut constants = IndexMap::with_capacity(slots.len());
        for (name, slot) in slots {
            let owner = format!("{}::{}", self.name, name);
            constants.insert(name, slot.get(factory, &owner)?);
        }
        Ok(constants)
    }

    // ---- lazy one-shot resolution passes ----

    /// Parent and trait merge. Gated: runs at most once per entity.
    pub(crate) fn resolve_classes(&self, factory: &ReflectionFactory) -> Result<()> {
        if self.classes_resolved.get() {
            return Ok(());
        }
        self.enter_resolution()?;
        let result = self.merge_classes(factory);
        self.resolving.set(false);
        if result.is_ok() {
            self.classes_resolved.set(true);
        }
        result
    }

    /// Interface constant merge. Gated separately from the class merge.
    pub(crate) fn resolve_interfaces(&self, factory: &ReflectionFactory) -> Result<()> {
        if self.interfaces_resolved.get() {
            return Ok(());
        }
        self.enter_resolution()?;
        let result = self.merge_interfaces(factory);
        self.resolving.set(false);
        if result.is_ok() {
            self.interfaces_resolved.set(true);
        }
        result
    }

    fn enter_resolution(&self) -> Result<()> {
        if self.resolving.get() {
            return Err(Error::Resolution(format!(
                "Circular inheritance detected while resolving {}",
                self.name
            )));
        }
        self.resolving.set(true);
        Ok(())
    }

    fn merge_classes(&self, factory: &ReflectionFactory) -> Result<()> {
        let parent = self.parent_class(factory)?;

        // Inherited constants and non-private properties fill empty slots;
        // parent methods merge last so traits win.
        if let Some(parent) = &parent {
            parent.resolve_classes(factory)?;
            parent.resolve_interfaces(factory)?;

            {
                let mut constants = self.constants.borrow_mut();
                for (name, slot) in parent.constants.borrow().iter() {
                    if !constants.contains_key(name) {
                        constants.insert(name.clone(), slot.clone());
                    }
                }
            }
            {
                let mut properties = self.properties.borrow_mut();
                for (name, property) in parent.properties.borrow().iter() {
                    // Parent private properties are hidden from the child.
                    if property.is_private() {
                        continue;
                    }
                    if !properties.contains_key(name) {
                        properties.insert(name.clone(), Rc::clone(property));
                    }
                }
            }
        }

        let traits = self.traits(factory)?;
        for used in traits.values() {
            used.resolve_classes(factory)?;
        }

        // Owner of each method name contributed by a trait so far.
        let mut trait_methods: IndexMap<String, String> = IndexMap::new();
        // (trait, method) pairs settled by a precedence rule, mapped to the
        // winning trait.
        let mut resolved_conflict: IndexMap<(String, String), String> = IndexMap::new();

        for rule in &self.precedence_rules {
            let owner = traits.get(&rule.trait_name).ok_or_else(|| {
                Error::Composition(format!(
                    "Required trait {} wasn't added to {}",
                    rule.trait_name, self.name
                ))
            })?;
            if !owner.has_method(factory, &rule.method)? {
                return Err(Error::Composition(format!(
                    "A precedence rule was defined for {}::{} but this method does not exist",
                    rule.trait_name, rule.method
                )));
            }
            resolved_conflict.insert(
                (rule.trait_name.clone(), rule.method.clone()),
                rule.trait_name.clone(),
            );
            for subordinate in &rule.instead_of {
                let excluded = traits.get(subordinate).ok_or_else(|| {
                    Error::Composition(format!(
                        "Required trait {} wasn't added to {}",
                        subordinate, self.name
                    ))
                })?;
                if !excluded.has_method(factory, &rule.method)? {
                    return Err(Error::Composition(format!(
                        "A precedence rule was defined for {}::{} but this method does not exist",
                        subordinate, rule.method
                    )));
                }
                resolved_conflict.insert(
                    (subordinate.clone(), rule.method.clone()),
                    rule.trait_name.clone(),
                );
            }
            trait_methods.insert(rule.method.clone(), rule.trait_name.clone());
        }

        for (trait_name, used) in &traits {
            {
                let mut properties = self.properties.borrow_mut();
                for (name, property) in used.properties.borrow().iter() {
                    if !properties.contains_key(name) {
                        properties.insert(name.clone(), Rc::clone(property));
                    }
                }
            }

            let methods: Vec<(String, Rc<ReflectionMethod>)> = used
                .methods
                .borrow()
                .iter()
                .map(|(name, method)| (name.clone(), Rc::clone(method)))
                .collect();
            for (method_name, method) in methods {
                let key = (trait_name.clone(), method_name.clone());
                let mixin = if resolved_conflict.contains_key(&key) {
                    // Settled by a precedence rule; only the winner lands.
                    trait_methods.get(&method_name) == Some(trait_name)
                } else if let Some(previous) = trait_methods.get(&method_name) {
                    return Err(Error::Composition(format!(
                        "Trait method {}::{} has not been applied because it collides with {}::{}",
                        trait_name, method_name, previous, method_name
                    )));
                } else {
                    trait_methods.insert(method_name.clone(), trait_name.clone());
                    !self.methods.borrow().contains_key(&method_name)
                };
                if mixin {
                    self.methods.borrow_mut().insert(
                        method_name.clone(),
                        Rc::new(method.rebind(&self.name, None, None)),
                    );
                }
            }
        }

        for rule in &self.alias_rules {
            if let Some(alias) = &rule.alias
                && trait_methods.contains_key(alias)
            {
                return Err(Error::Composition(format!(
                    "Trait method {} has not been applied, because there are collisions \
                     with other trait methods on {}",
                    alias, self.name
                )));
            }
            let owner_name = match &rule.trait_name {
                Some(owner_name) => {
                    let owner = traits.get(owner_name).ok_or_else(|| {
                        Error::Composition(format!(
                            "Required trait {} wasn't added to {}",
                            owner_name, self.name
                        ))
                    })?;
                    if !owner.has_method(factory, &rule.method)? {
                        return Err(Error::Composition(format!(
                            "An alias was defined for {}::{} but this method does not exist",
                            owner_name, rule.method
                        )));
                    }
                    owner_name.clone()
                }
                None => trait_methods.get(&rule.method).cloned().ok_or_else(|| {
                    Error::Composition(format!(
                        "An alias was defined for {} but this method does not exist",
                        rule.method
                    ))
                })?,
            };
            let method = traits[&owner_name]
                .method(factory, &rule.method)?
                .expect("alias source checked above");
            let target = rule.alias.clone().unwrap_or_else(|| rule.method.clone());
            self.methods.borrow_mut().insert(
                target,
                Rc::new(method.rebind(&self.name, rule.visibility, rule.alias.as_deref())),
            );
        }

        if let Some(parent) = &parent {
            let mut methods = self.methods.borrow_mut();
            for (name, method) in parent.methods.borrow().iter() {
                if !methods.contains_key(name) {
                    methods.insert(name.clone(), Rc::clone(method));
                }
            }
        }

        Ok(())
    }

    fn merge_interfaces(&self, factory: &ReflectionFactory) -> Result<()> {
        for interface in self.interfaces(factory)?.values() {
            interface.resolve_classes(factory)?;
            interface.resolve_interfaces(factory)?;
            let mut constants = self.constants.borrow_mut();
            for (name, slot) in interface.constants.borrow().iter() {
                if !constants.contains_key(name) {
                    constants.insert(name.clone(), slot.clone());
                }
            }
        }
        Ok(())
    }
}
