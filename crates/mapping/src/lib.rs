//! Reading, writing and replaying name mappings.

pub mod builder;
pub mod format;
pub mod parser;
pub mod retrace;

pub use builder::build_mapping;
pub use format::{ClassMapping, FieldMapping, MemberMapping, MethodMapping, NameMapping};
pub use parser::parse;
pub use retrace::{Retracer, StackFrame};
