//! Static reflection for PHP sources.
//!
//! Extracts class, interface, trait and function metadata from source text
//! without loading or executing it: a single-pass parser recognizes the
//! declaration subset of the grammar, constant expressions that reference
//! not-yet-parsed classes are captured as deferred templates and folded on
//! demand, and trait composition (`insteadof` precedence, `as` aliasing)
//! is resolved lazily with the same semantics PHP applies at load time.
//!
//! ```no_run
//! use php_static_reflection::finder::Psr0Finder;
//! use php_static_reflection::reflect::ReflectionFactory;
//!
//! # fn main() -> php_static_reflection::Result<()> {
//! let factory = ReflectionFactory::new(Psr0Finder::new("src"));
//! let class = factory.get_class("App\\Model\\User")?;
//! for method in class.methods(&factory, None)? {
//!     println!("{}::{}", class.name(), method.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
mod eval;
pub mod finder;
pub mod parser;
pub mod reflect;
pub mod value;

pub use error::{Error, Result};
pub use finder::{CallbackFinder, ClassFinder, Psr0Finder};
pub use parser::Parser;
pub use reflect::{
    EntityKind, ReflectionClass, ReflectionFactory, ReflectionFunction, ReflectionMethod,
    ReflectionParameter, ReflectionProperty, TypeHint,
};
pub use value::{ArrayKey, Value};
