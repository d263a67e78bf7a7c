use crate::error::{Error, Result};
use crate::finder::ClassFinder;
use crate::parser::Parser;
use crate::reflect::class::ReflectionClass;
use crate::reflect::function::ReflectionFunction;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Lazy-loading cache of reflected entities, keyed by fully-qualified name.
///
/// A cache miss asks the finder for a file and parses it; a single file may
/// define several classes and functions, and all of them are cached at
/// once. Lazy resolution (trait merge, deferred constants) reenters the
/// factory recursively, so cache borrows are never held across a parse.
/// Single-threaded by design; one logical owner at a time.
pub struct ReflectionFactory {
    finder: Box<dyn ClassFinder>,
    classes: RefCell<IndexMap<String, Rc<ReflectionClass>>>,
    functions: RefCell<IndexMap<String, Rc<ReflectionFunction>>>,
    constants: RefCell<IndexMap<String, Value>>,
}

impl ReflectionFactory {
    pub fn new(finder: impl ClassFinder + 'static) -> Self {
        let factory = Self {
            finder: Box::new(finder),
            classes: RefCell::new(IndexMap::new()),
            functions: RefCell::new(IndexMap::new()),
            constants: RefCell::new(IndexMap::new()),
        };
        factory.seed_builtin_constants();
        factory
    }

    /// Returns the class, parsing its file through the finder on a miss.
    pub fn get_class(&self, name: &str) -> Result<Rc<ReflectionClass>> {
        let name = name.trim_start_matches('\\');
        if let Some(class) = self.classes.borrow().get(name) {
            return Ok(Rc::clone(class));
        }

        let filename = self
            .finder
            .find_class_file(name)
            .ok_or_else(|| Error::NotFound(format!("Class {} does not exist", name)))?;
        self.parse_file(&filename)?;

        // The finder's path convention may have pointed at a file that does
        // not actually define the class.
        self.classes
            .borrow()
            .get(name)
            .map(Rc::clone)
            .ok_or_else(|| Error::NotFound(format!("Class {} does not exist", name)))
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes
            .borrow()
            .contains_key(name.trim_start_matches('\\'))
    }

    /// Returns a previously parsed function. Functions are not locatable
    /// through the finder; they enter the cache when their file is parsed.
    pub fn get_function(&self, name: &str) -> Result<Rc<ReflectionFunction>> {
        let name = name.trim_start_matches('\\');
        self.functions
            .borrow()
            .get(name)
            .map(Rc::clone)
            .ok_or_else(|| Error::NotFound(format!("Function {} does not exist", name)))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions
            .borrow()
            .contains_key(name.trim_start_matches('\\'))
    }

    /// Parses a file and caches every entity it defines. Entities already
    /// cached under the same name keep their first definition.
    pub fn parse_file(&self, filename: &Path) -> Result<()> {
        let mut parser = Parser::new();
        parser.parse_file(filename)?;
        self.absorb(parser);
        Ok(())
    }

    /// Parses an in-memory buffer with no associated file.
    pub fn parse_source(&self, source: &str) -> Result<()> {
        let mut parser = Parser::new();
        parser.parse_source(source)?;
        self.absorb(parser);
        Ok(())
    }

    fn absorb(&self, parser: Parser) {
        let (classes, functions) = parser.into_entities();
        let mut cache = self.classes.borrow_mut();
        for (name, class) in classes {
            cache.entry(name).or_insert(class);
        }
        let mut cache = self.functions.borrow_mut();
        for (name, function) in functions {
            cache.entry(name).or_insert(function);
        }
    }

    /// Evicts one class, so the next query reparses its file. Supports
    /// tooling that mutates sources between queries.
    pub fn unload_class(&self, name: &str) {
        self.classes
            .borrow_mut()
            .shift_remove(name.trim_start_matches('\\'));
    }

    pub fn unload_function(&self, name: &str) {
        self.functions
            .borrow_mut()
            .shift_remove(name.trim_start_matches('\\'));
    }

    /// Registers a global constant for deferred-expression resolution.
    pub fn define_constant(&self, name: impl Into<String>, value: Value) {
        self.constants.borrow_mut().insert(name.into(), value);
    }

    pub fn global_constant(&self, name: &str) -> Option<Value> {
        self.constants.borrow().get(name).cloned()
    }

    fn seed_builtin_constants(&self) {
        let defaults: &[(&str, Value)] = &[
            ("PHP_EOL", Value::String("\n".to_string())),
            ("PHP_INT_MAX", Value::Int(i64::MAX)),
            ("PHP_INT_MIN", Value::Int(i64::MIN)),
            ("PHP_INT_SIZE", Value::Int(8)),
            ("DIRECTORY_SEPARATOR", Value::String("/".to_string())),
            ("PATH_SEPARATOR", Value::String(":".to_string())),
            ("M_PI", Value::Float(std::f64::consts::PI)),
            ("M_E", Value::Float(std::f64::consts::E)),
            ("INF", Value::Float(f64::INFINITY)),
            ("NAN", Value::Float(f64::NAN)),
            ("E_ERROR", Value::Int(1)),
            ("E_WARNING", Value::Int(2)),
            ("E_NOTICE", Value::Int(8)),
            ("E_DEPRECATED", Value::Int(8192)),
            ("E_ALL", Value::Int(32767)),
        ];
        let mut constants = self.constants.borrow_mut();
        for (name, value) in defaults {
            constants.insert((*name).to_string(), value.clone());
        }
    }
}
