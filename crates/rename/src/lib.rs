//! Name allocation, conflict resolution and reference rewriting.
//!
//! [`Obfuscator`] drives the whole pipeline; the modules can also be used one phase
//! at a time on a [`ClassPool`](obscura_core::ClassPool).

pub mod allocator;
pub mod apply;
pub mod classes;
pub mod conflict;
pub mod naming;
pub mod obfuscator;
pub mod rewrite;
pub mod scope;

pub use allocator::{allocate, AllocationOptions, AllocationStats};
pub use classes::{rename_classes, ClassNamingOptions, PackagePolicy};
pub use conflict::resolve_conflicts;
pub use naming::{
    DictionaryNameFactory, NameFactory, NameSource, NumericNameFactory, SimpleNameFactory,
    SpecialNameFactory,
};
pub use obfuscator::{presets, ObfuscationConfig, ObfuscationResult, Obfuscator};
pub use rewrite::{rewrite_references, RewriteOptions, RewriteStats};
pub use scope::{Hold, ScopeTable};
