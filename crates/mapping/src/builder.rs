//! Builds a [`NameMapping`] from a renamed class pool.

use crate::format::{FieldMapping, MemberMapping, MethodMapping, NameMapping};
use obscura_core::descriptor::{external_class_name, method_to_external, to_external_type};
use obscura_core::model::{ClassNode, ClassPool, Member};
use obscura_utils::errors::MappingError;

/// Records every program class and every non-initializer member, kept or not.
///
/// Classes are written in alphabetical order of their original names; members keep
/// declaration order. Types are recorded in their original (pre-rename) form.
pub fn build_mapping(pool: &ClassPool) -> Result<NameMapping, MappingError> {
    let mut mapping = NameMapping::new();
    let mut classes: Vec<&ClassNode> = pool.classes().filter(|c| !c.library).collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name));

    for class in classes {
        let record = mapping.add_class(
            &external_class_name(&class.name),
            &external_class_name(class.final_name()),
        )?;
        for member in class.members.iter().filter(|m| !m.is_initializer()) {
            record.add_member(member_record(member)?);
        }
    }
    tracing::debug!("Built mapping for {} classes", mapping.len());
    Ok(mapping)
}

fn member_record(member: &Member) -> Result<MemberMapping, MappingError> {
    let obfuscated = member.final_name().to_string();
    if member.is_field() {
        return Ok(MemberMapping::Field(FieldMapping {
            ty: to_external_type(&member.descriptor)?,
            original: member.name.clone(),
            obfuscated,
        }));
    }
    let (params, return_type) = method_to_external(&member.descriptor)?;
    let (first_line, last_line) = member.lines.unwrap_or((0, 0));
    Ok(MemberMapping::Method(MethodMapping {
        first_line,
        last_line,
        return_type,
        original_class: None,
        original: member.name.clone(),
        params,
        original_lines: None,
        obfuscated,
    }))
}
