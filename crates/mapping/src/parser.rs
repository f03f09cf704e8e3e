//! Parser for the mapping text format.
//!
//! Accepted beyond what the writer emits: `#` comment lines, blank lines, method records
//! without a line prefix, an original-line suffix after the parameter list, and
//! qualified original method names (`com.example.Other.helper`) as produced for
//! inlined methods.

use crate::format::{FieldMapping, MemberMapping, MethodMapping, NameMapping};
use obscura_utils::errors::MappingError;

const ARROW: &str = " -> ";

fn parse_error(line: usize, msg: &str, raw: &str) -> MappingError {
    MappingError::Parse {
        line,
        msg: msg.to_string(),
        raw: raw.to_string(),
    }
}

/// Parses mapping text into a [`NameMapping`].
pub fn parse(text: &str) -> Result<NameMapping, MappingError> {
    let mut mapping = NameMapping::new();
    let mut current: Option<String> = None;
    let mut members = 0usize;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if line.len() == trimmed.len() {
            let (original, obfuscated) = parse_class_line(line)
                .ok_or_else(|| parse_error(line_no, "expected `original -> obfuscated:`", raw))?;
            mapping
                .add_class(original, obfuscated)
                .map_err(|err| parse_error(line_no, &err.to_string(), raw))?;
            current = Some(original.to_string());
            continue;
        }

        let record = current
            .as_deref()
            .and_then(|class| mapping.class_mut(class))
            .ok_or_else(|| parse_error(line_no, "member record outside of a class record", raw))?;
        let member = parse_member_line(trimmed)
            .ok_or_else(|| parse_error(line_no, "malformed member record", raw))?;
        if !record.add_member(member) {
            tracing::debug!("Ignoring repeated member record at line {}", line_no);
        }
        members += 1;
    }

    tracing::debug!(
        "Parsed mapping with {} classes and {} member records",
        mapping.len(),
        members
    );
    Ok(mapping)
}

fn is_identifier_part(s: &str) -> bool {
    !s.is_empty() && !s.contains(char::is_whitespace)
}

/// `com.example.Foo -> a.a:`
fn parse_class_line(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_suffix(':')?;
    let (original, obfuscated) = body.split_once(ARROW)?;
    let (original, obfuscated) = (original.trim(), obfuscated.trim());
    (is_identifier_part(original) && is_identifier_part(obfuscated))
        .then_some((original, obfuscated))
}

/// Strips a leading `first:last:` (or `first:`) line prefix.
fn split_line_prefix(left: &str) -> (Option<(u32, u32)>, &str) {
    let mut parts = left.splitn(3, ':');
    let first = parts.next().and_then(|p| p.parse::<u32>().ok());
    let second = parts.next();
    let rest = parts.next();
    match (first, second, rest) {
        (Some(first), Some(second), Some(rest)) => match second.parse::<u32>() {
            Ok(last) => (Some((first, last)), rest),
            // Only the first number was a line: `12:int m() -> a`.
            Err(_) => (Some((first, first)), &left[left.find(':').map_or(0, |i| i + 1)..]),
        },
        (Some(first), Some(_), None) => {
            (Some((first, first)), &left[left.find(':').map_or(0, |i| i + 1)..])
        }
        _ => (None, left),
    }
}

/// Parses `:12` or `:12:14` after the parameter list.
fn parse_original_lines(suffix: &str) -> Option<Option<(u32, u32)>> {
    if suffix.is_empty() {
        return Some(None);
    }
    let suffix = suffix.strip_prefix(':')?;
    match suffix.split_once(':') {
        Some((start, end)) => Some(Some((start.parse().ok()?, end.parse().ok()?))),
        None => {
            let line = suffix.parse().ok()?;
            Some(Some((line, line)))
        }
    }
}

fn parse_member_line(line: &str) -> Option<MemberMapping> {
    let (left, obfuscated) = line.rsplit_once(ARROW)?;
    let obfuscated = obfuscated.trim();
    if !is_identifier_part(obfuscated) {
        return None;
    }

    if !left.contains('(') {
        let (ty, original) = left.trim().split_once(' ')?;
        let original = original.trim();
        if !is_identifier_part(ty) || !is_identifier_part(original) {
            return None;
        }
        return Some(MemberMapping::Field(FieldMapping {
            ty: ty.to_string(),
            original: original.to_string(),
            obfuscated: obfuscated.to_string(),
        }));
    }

    let (lines, rest) = split_line_prefix(left.trim());
    let (return_type, signature) = rest.trim().split_once(' ')?;
    let open = signature.find('(')?;
    let close = signature.rfind(')')?;
    if close < open || !is_identifier_part(return_type) {
        return None;
    }
    let qualified = &signature[..open];
    let (original_class, original) = match qualified.rsplit_once('.') {
        Some((class, name)) => (Some(class.to_string()), name),
        None => (None, qualified),
    };
    if !is_identifier_part(original) {
        return None;
    }
    let params = signature[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let original_lines = parse_original_lines(&signature[close + 1..])?;
    let (first_line, last_line) = lines.unwrap_or((0, 0));

    Some(MemberMapping::Method(MethodMapping {
        first_line,
        last_line,
        return_type: return_type.to_string(),
        original_class,
        original: original.to_string(),
        params,
        original_lines,
        obfuscated: obfuscated.to_string(),
    }))
}
