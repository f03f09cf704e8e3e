//! Reverse lookup of obfuscated names, as used to de-obfuscate stack traces.
//!
//! Several original members may share one obfuscated name (overloads, or members
//! funnelled onto one global name in unique mode). Method lookups narrow the
//! candidates by the frame's line number, field lookups by the declared type; when
//! that leaves nothing, the first record wins.

use crate::format::{FieldMapping, MethodMapping, NameMapping};
use std::collections::HashMap;
use std::fmt::{self, Write};

/// One frame of a Java stack trace: `at com.example.Foo.bar(Foo.java:12)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub class: String,
    pub method: String,
    pub file: Option<String>,
    pub line: u32,
}

impl StackFrame {
    pub fn new(class: &str, method: &str, line: u32) -> Self {
        Self {
            class: class.to_string(),
            method: method.to_string(),
            file: None,
            line,
        }
    }

    /// Parses a frame line such as `\tat a.b.c(SourceFile:12)`.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.trim().strip_prefix("at ")?;
        let (qualified, location) = body.split_once('(')?;
        let location = location.strip_suffix(')')?;
        let (class, method) = qualified.rsplit_once('.')?;
        let (file, line) = match location.rsplit_once(':') {
            Some((file, line)) => (Some(file), line.parse().ok()?),
            None => (Some(location).filter(|f| !f.is_empty()), 0),
        };
        Some(Self {
            class: class.to_string(),
            method: method.to_string(),
            file: file.map(str::to_string),
            line,
        })
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}.{}(", self.class, self.method)?;
        match (&self.file, self.line) {
            (Some(file), 0) => write!(f, "{file}")?,
            (Some(file), line) => write!(f, "{file}:{line}")?,
            (None, 0) => write!(f, "Unknown Source")?,
            (None, line) => write!(f, "Unknown Source:{line}")?,
        }
        write!(f, ")")
    }
}

#[derive(Debug)]
struct ClassEntry<'m> {
    original: &'m str,
    methods: HashMap<&'m str, Vec<&'m MethodMapping>>,
    fields: HashMap<&'m str, Vec<&'m FieldMapping>>,
}

/// Obfuscated-name index over a [`NameMapping`].
#[derive(Debug)]
pub struct Retracer<'m> {
    classes: HashMap<&'m str, ClassEntry<'m>>,
}

impl<'m> Retracer<'m> {
    pub fn new(mapping: &'m NameMapping) -> Self {
        let mut classes = HashMap::with_capacity(mapping.len());
        for class in mapping.classes() {
            let mut entry = ClassEntry {
                original: &class.original,
                methods: HashMap::new(),
                fields: HashMap::new(),
            };
            for method in class.methods() {
                entry
                    .methods
                    .entry(method.obfuscated.as_str())
                    .or_insert_with(Vec::new)
                    .push(method);
            }
            for field in class.fields() {
                entry
                    .fields
                    .entry(field.obfuscated.as_str())
                    .or_insert_with(Vec::new)
                    .push(field);
            }
            classes.entry(class.obfuscated.as_str()).or_insert(entry);
        }
        Self { classes }
    }

    /// Original external name of an obfuscated class.
    pub fn remap_class(&self, class: &str) -> Option<&'m str> {
        self.classes.get(class).map(|c| c.original)
    }

    /// Restores class names inside an (obfuscated) external type, keeping array suffixes.
    pub fn remap_type(&self, ty: &str) -> String {
        let base = ty.trim_end_matches("[]");
        let dims = &ty[base.len()..];
        match self.remap_class(base) {
            Some(original) => format!("{original}{dims}"),
            None => ty.to_string(),
        }
    }

    /// Original class and field name of an obfuscated field.
    ///
    /// `declared_type` is the obfuscated external type of the field at the access
    /// site, used to pick between fields sharing the obfuscated name.
    pub fn remap_field(
        &self,
        class: &str,
        field: &str,
        declared_type: Option<&str>,
    ) -> Option<(&'m str, &'m str)> {
        let entry = self.classes.get(class)?;
        let candidates = entry.fields.get(field)?;
        let wanted = declared_type.map(|t| self.remap_type(t));
        let chosen = wanted
            .and_then(|ty| candidates.iter().copied().find(|f| f.ty == ty))
            .or_else(|| candidates.first().copied())?;
        Some((entry.original, chosen.original.as_str()))
    }

    /// Original frames for an obfuscated frame.
    ///
    /// An inline chain (records sharing the covering line range, or naming their
    /// original class) yields one frame per record in mapping order. Any other set of
    /// candidates yields its first covering record, or the first record when none covers
    /// the line. Unknown classes or methods yield no frames.
    pub fn remap_frame(&self, frame: &StackFrame) -> Vec<StackFrame> {
        let Some(entry) = self.classes.get(frame.class.as_str()) else {
            return Vec::new();
        };
        let Some(candidates) = entry.methods.get(frame.method.as_str()) else {
            return Vec::new();
        };

        let mut covering: Vec<&MethodMapping> = candidates
            .iter()
            .copied()
            .filter(|m| frame.line == 0 || m.covers(frame.line))
            .collect();
        if covering.is_empty() {
            covering.extend(candidates.first().copied());
        }
        // Ranged records are more specific than records without line information.
        if covering.iter().any(|m| m.last_line > 0) && frame.line > 0 {
            covering.retain(|m| m.last_line > 0);
        }
        let Some(&first) = covering.first() else {
            return Vec::new();
        };
        // Only an inline chain expands into several frames; other ambiguity keeps the first.
        let range = (first.first_line, first.last_line);
        let mut chain = vec![first];
        chain.extend(covering[1..].iter().copied().filter(|m| {
            m.original_class.is_some() || (range.1 > 0 && (m.first_line, m.last_line) == range)
        }));

        chain
            .into_iter()
            .map(|method| StackFrame {
                class: method
                    .original_class
                    .clone()
                    .unwrap_or_else(|| entry.original.to_string()),
                method: method.original.clone(),
                file: if method.original_class.is_some() {
                    None
                } else {
                    frame.file.clone()
                },
                line: if frame.line == 0 {
                    0
                } else {
                    method.original_line(frame.line)
                },
            })
            .collect()
    }

    /// Remaps `a.b: message`, `Caused by: a.b: message` and
    /// `Exception in thread "main" a.b: message` headers.
    fn remap_throwable_line(&self, line: &str) -> Option<String> {
        let (prefix, rest) = if let Some(rest) = line.strip_prefix("Caused by: ") {
            ("Caused by: ", rest)
        } else if let Some(thread) = line.strip_prefix("Exception in thread \"") {
            let close = line.len() - thread.len() + thread.find("\" ")? + 2;
            line.split_at(close)
        } else {
            ("", line)
        };
        let (class, message) = match rest.split_once(':') {
            Some((class, message)) => (class, Some(message)),
            None => (rest.trim_end(), None),
        };
        let original = self.remap_class(class)?;
        Some(match message {
            Some(message) => format!("{prefix}{original}:{message}"),
            None => format!("{prefix}{original}"),
        })
    }

    /// Remaps every recognizable line of a textual stack trace.
    ///
    /// Lines that are neither frames nor exception headers, and frames that cannot be
    /// remapped, are copied unchanged.
    pub fn remap_stacktrace(&self, input: &str) -> Result<String, fmt::Error> {
        let mut out = String::with_capacity(input.len());
        for line in input.lines() {
            if let Some(frame) = StackFrame::parse(line) {
                let remapped = self.remap_frame(&frame);
                if remapped.is_empty() {
                    writeln!(out, "{line}")?;
                }
                let indent = &line[..line.len() - line.trim_start().len()];
                for frame in remapped {
                    writeln!(out, "{indent}{frame}")?;
                }
                continue;
            }
            match self.remap_throwable_line(line) {
                Some(header) => writeln!(out, "{header}")?,
                None => writeln!(out, "{line}")?,
            }
        }
        Ok(out)
    }
}
