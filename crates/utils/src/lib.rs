//! Shared error types and diagnostics for the obscura workspace.

pub mod diagnostics;
pub mod errors;

pub use diagnostics::{Diagnostics, Warning, WarningKind};
