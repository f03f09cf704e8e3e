//! Mapping records and the line-oriented text format.
//!
//! ```text
//! com.example.Widget -> a.a:
//!     int count -> a
//!     10:25:int compute(java.lang.String) -> b
//! ```
//!
//! Class records start in column 0 and end with `:`. Member records are indented by
//! four spaces; method records carry a `first:last:` line prefix (`0:0:` when unknown).

use indexmap::IndexMap;
use obscura_core::descriptor::{from_external_type, method_from_external};
use obscura_utils::errors::{DescriptorError, MappingError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// A field record: `<type> <original> -> <obfuscated>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Original external type name.
    pub ty: String,
    pub original: String,
    pub obfuscated: String,
}

/// A method record: `<first>:<last>:<return> <original>(<params>) -> <obfuscated>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodMapping {
    pub first_line: u32,
    pub last_line: u32,
    pub return_type: String,
    /// Declaring class of an inlined method, when it differs from the record's class.
    pub original_class: Option<String>,
    pub original: String,
    pub params: Vec<String>,
    /// Original source lines, when they differ from `first_line..=last_line`.
    pub original_lines: Option<(u32, u32)>,
    pub obfuscated: String,
}

impl MethodMapping {
    /// Whether the record covers the given (obfuscated) line number.
    ///
    /// Records without line information match every line.
    pub const fn covers(&self, line: u32) -> bool {
        self.last_line == 0 || (line >= self.first_line && line <= self.last_line)
    }

    /// Translates an obfuscated line number into the original source line.
    pub fn original_line(&self, line: u32) -> u32 {
        match self.original_lines {
            Some((start, end)) if end > start && line >= self.first_line => {
                start + (line - self.first_line)
            }
            Some((start, _)) => start,
            None => line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberMapping {
    Field(FieldMapping),
    Method(MethodMapping),
}

impl MemberMapping {
    pub fn original(&self) -> &str {
        match self {
            Self::Field(f) => &f.original,
            Self::Method(m) => &m.original,
        }
    }

    pub fn obfuscated(&self) -> &str {
        match self {
            Self::Field(f) => &f.obfuscated,
            Self::Method(m) => &m.obfuscated,
        }
    }

    /// Internal descriptor in terms of the original type names.
    pub fn descriptor(&self) -> Result<String, DescriptorError> {
        match self {
            Self::Field(f) => from_external_type(&f.ty),
            Self::Method(m) => method_from_external(&m.params, &m.return_type),
        }
    }

    /// Key that is unique within a class record.
    fn key(&self) -> MemberKey {
        match self {
            Self::Field(f) => MemberKey {
                original: f.original.clone(),
                signature: f.ty.clone(),
                lines: None,
            },
            Self::Method(m) => MemberKey {
                original: match &m.original_class {
                    Some(class) => format!("{class}.{}", m.original),
                    None => m.original.clone(),
                },
                signature: format!("({}){}", m.params.join(","), m.return_type),
                lines: Some((m.first_line, m.last_line)),
            },
        }
    }
}

impl fmt::Display for MemberMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(
                f,
                "    {} {} -> {}",
                field.ty, field.original, field.obfuscated
            ),
            Self::Method(method) => {
                write!(
                    f,
                    "    {}:{}:{} ",
                    method.first_line, method.last_line, method.return_type
                )?;
                if let Some(class) = &method.original_class {
                    write!(f, "{class}.")?;
                }
                write!(f, "{}({})", method.original, method.params.join(","))?;
                if let Some((start, end)) = method.original_lines {
                    write!(f, ":{start}:{end}")?;
                }
                write!(f, " -> {}", method.obfuscated)
            }
        }
    }
}

/// Identity of a member record inside its class.
///
/// Method records also key on their line range, so the several records R8 emits for
/// one inlined method can coexist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct MemberKey {
    original: String,
    signature: String,
    lines: Option<(u32, u32)>,
}

/// A class record with its member records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMapping {
    pub original: String,
    pub obfuscated: String,
    members: IndexMap<MemberKey, MemberMapping>,
}

impl ClassMapping {
    pub fn new(original: &str, obfuscated: &str) -> Self {
        Self {
            original: original.to_string(),
            obfuscated: obfuscated.to_string(),
            members: IndexMap::new(),
        }
    }

    /// Adds a member record; returns false if an identical key was already present.
    pub fn add_member(&mut self, member: MemberMapping) -> bool {
        let key = member.key();
        if self.members.contains_key(&key) {
            return false;
        }
        self.members.insert(key, member);
        true
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberMapping> {
        self.members.values()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.members.values().filter_map(|m| match m {
            MemberMapping::Field(f) => Some(f),
            MemberMapping::Method(_) => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodMapping> {
        self.members.values().filter_map(|m| match m {
            MemberMapping::Method(m) => Some(m),
            MemberMapping::Field(_) => None,
        })
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

impl fmt::Display for ClassMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}:", self.original, self.obfuscated)?;
        for member in self.members.values() {
            writeln!(f, "{member}")?;
        }
        Ok(())
    }
}

/// The persisted old-name → new-name association.
///
/// Class records are keyed by their original name and kept in insertion order.
/// Equality compares associations and ignores record order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMapping {
    classes: IndexMap<String, ClassMapping>,
}

impl NameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a class record.
    pub fn add_class(
        &mut self,
        original: &str,
        obfuscated: &str,
    ) -> Result<&mut ClassMapping, MappingError> {
        if self.classes.contains_key(original) {
            return Err(MappingError::DuplicateClass(original.to_string()));
        }
        let entry = self
            .classes
            .entry(original.to_string())
            .or_insert_with(|| ClassMapping::new(original, obfuscated));
        Ok(entry)
    }

    /// Looks up a class record by original external name.
    pub fn class(&self, original: &str) -> Option<&ClassMapping> {
        self.classes.get(original)
    }

    pub fn class_mut(&mut self, original: &str) -> Option<&mut ClassMapping> {
        self.classes.get_mut(original)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassMapping> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Sorts class records alphabetically by original name.
    pub fn sort(&mut self) {
        self.classes.sort_keys();
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for class in self.classes.values() {
            write!(writer, "{class}")?;
        }
        writer.flush()
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), MappingError> {
        let path = path.as_ref();
        let file = fs::File::create(path).map_err(|source| MappingError::FileWrite {
            path: path.display().to_string(),
            source,
        })?;
        self.write_to(io::BufWriter::new(file))
            .map_err(|source| MappingError::FileWrite {
                path: path.display().to_string(),
                source,
            })
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MappingError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        crate::parser::parse(&text)
    }
}

impl fmt::Display for NameMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in self.classes.values() {
            write!(f, "{class}")?;
        }
        Ok(())
    }
}
