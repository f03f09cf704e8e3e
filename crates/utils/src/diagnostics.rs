//! Recoverable warnings collected during a rename pass.
//!
//! Phases never abort on a per-symbol problem. They push a [`Warning`] into a
//! [`Diagnostics`] value and keep going; once the phase is over the caller
//! decides whether the collected warnings escalate into an error.

use crate::errors::ObfuscateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A kept symbol was given a different name by an applied mapping.
    KeptRemapped,
    /// Members of one link group were mapped to different names.
    GroupMappingMismatch,
    /// A name collision was resolved by reassigning a fallback name.
    NameConflict,
    /// An applied mapping record could not be used.
    UnusableMapping,
}

/// One recoverable problem, naming the offending class and member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// External name of the class the warning is about.
    pub class: String,
    /// Member name and descriptor, if the warning concerns a member.
    pub member: Option<String>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}: {}", self.class, member, self.message),
            None => write!(f, "{}: {}", self.class, self.message),
        }
    }
}

/// Accumulated warnings of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    pub fn warn(
        &mut self,
        kind: WarningKind,
        class: impl Into<String>,
        member: Option<String>,
        message: impl Into<String>,
    ) {
        let warning = Warning {
            kind,
            class: class.into(),
            member,
            message: message.into(),
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of warnings of the given kind.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Turns the collected warnings into an error when `fatal` is set.
    ///
    /// Called at the end of a phase, so every warning of that phase has
    /// already been recorded when the error is raised.
    pub fn escalate(&self, fatal: bool) -> Result<(), ObfuscateError> {
        match self.warnings.first() {
            Some(first) if fatal => Err(ObfuscateError::FatalWarnings {
                count: self.warnings.len(),
                first: first.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
