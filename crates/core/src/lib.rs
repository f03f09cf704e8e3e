//! Symbol model, hierarchy and seed analysis for the obscura rename engine.

pub mod descriptor;
pub mod hierarchy;
pub mod keep;
pub mod linker;
pub mod model;
pub mod seeds;

pub use hierarchy::Hierarchy;
pub use keep::{KeepRule, NamePattern, SymbolFilter};
pub use linker::{GroupId, LinkGroup, Linkage};
pub use model::{
    ClassId, ClassNode, ClassPool, Constant, Member, MemberId, MemberKind, TypeLink, Visibility,
};
