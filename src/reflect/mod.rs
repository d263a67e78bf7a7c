mod class;
mod factory;
mod function;
mod parameter;
mod property;
mod scalar;

pub use class::{AliasRule, EntityKind, PrecedenceRule, ReflectionClass};
pub use factory::ReflectionFactory;
pub use function::{ReflectionFunction, ReflectionMethod};
pub use parameter::{ReflectionParameter, TypeHint};
pub use property::ReflectionProperty;
pub use scalar::{ConstantValue, LazySlot, ScalarExpression};

/// Modifier bits, mirroring PHP's reflection constants so bitmask filters
/// compose the same way.
pub mod modifiers {
    pub const STATIC: u32 = 1;
    pub const ABSTRACT: u32 = 2;
    pub const FINAL: u32 = 4;
    pub const PUBLIC: u32 = 256;
    pub const PROTECTED: u32 = 512;
    pub const PRIVATE: u32 = 1024;
    pub const ACCESS_MASK: u32 = PUBLIC | PROTECTED | PRIVATE;

    /// Class-level bits.
    pub const CLASS_EXPLICIT_ABSTRACT: u32 = 32;
    pub const CLASS_FINAL: u32 = 64;
}
