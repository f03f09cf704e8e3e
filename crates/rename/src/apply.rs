//! Replaying a prior name mapping onto the pool.
//!
//! Class records are matched by original name and members by original name plus
//! descriptor. Anything the mapping does not mention is left for normal allocation, and
//! records for classes that no longer exist are skipped without a warning.

use obscura_core::descriptor::{external_class_name, internal_class_name};
use obscura_core::{ClassPool, Linkage, MemberId};
use obscura_mapping::{MemberMapping, NameMapping};
use obscura_utils::{Diagnostics, WarningKind};
use std::collections::HashSet;

/// Sets `new_name` on program classes named by the mapping.
///
/// Kept and library classes keep their names; a record that tries to move one is
/// reported. Returns the number of classes that received a name.
pub fn apply_class_mappings(
    pool: &mut ClassPool,
    mapping: &NameMapping,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut taken: HashSet<String> = pool
        .classes()
        .filter(|c| c.library || c.kept)
        .map(|c| c.name.clone())
        .collect();
    let mut applied = 0;

    for record in mapping.classes() {
        let original = internal_class_name(&record.original);
        let Some(id) = pool.lookup(&original) else {
            tracing::debug!("Skipping mapping for missing class {}", record.original);
            continue;
        };
        let obfuscated = internal_class_name(&record.obfuscated);
        let class = pool.get_mut(id);
        if class.library || class.kept {
            if obfuscated != class.name {
                diagnostics.warn(
                    WarningKind::KeptRemapped,
                    &record.original,
                    None,
                    format!("kept class is mapped to `{}`; keeping its name", record.obfuscated),
                );
            }
            continue;
        }
        if !taken.insert(obfuscated.clone()) {
            diagnostics.warn(
                WarningKind::UnusableMapping,
                &record.original,
                None,
                format!("`{}` is already used by another class", record.obfuscated),
            );
            continue;
        }
        class.new_name = Some(obfuscated);
        applied += 1;
    }
    tracing::debug!("Applied {} class mappings", applied);
    applied
}

/// Assigns recorded member names to their link groups and marks them fixed.
///
/// When two members of one group are mapped to different names the first record wins.
/// Returns the number of groups that received a name.
pub fn apply_member_mappings(
    pool: &ClassPool,
    linkage: &mut Linkage,
    mapping: &NameMapping,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut applied = 0;
    for record in mapping.classes() {
        let Some(class) = pool.lookup(&internal_class_name(&record.original)) else {
            continue;
        };
        for member in record.members() {
            // Records of inlined callees describe another class's method.
            if matches!(member, MemberMapping::Method(m) if m.original_class.is_some()) {
                continue;
            }
            let descriptor = match member.descriptor() {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    diagnostics.warn(
                        WarningKind::UnusableMapping,
                        &record.original,
                        Some(member.original().to_string()),
                        format!("unusable member record: {err}"),
                    );
                    continue;
                }
            };
            let Some(index) = pool.get(class).find_member(member.original(), &descriptor) else {
                tracing::debug!(
                    "Skipping mapping for missing member {}.{}{}",
                    record.original,
                    member.original(),
                    descriptor
                );
                continue;
            };
            let id = MemberId {
                class,
                index: index as u32,
            };
            if pool.member(id).is_initializer() {
                continue;
            }
            if apply_member(pool, linkage, id, member.obfuscated(), diagnostics) {
                applied += 1;
            }
        }
    }
    tracing::debug!("Applied {} member mappings", applied);
    applied
}

fn apply_member(
    pool: &ClassPool,
    linkage: &mut Linkage,
    id: MemberId,
    obfuscated: &str,
    diagnostics: &mut Diagnostics,
) -> bool {
    let member = pool.member(id);
    let class = external_class_name(&pool.get(id.class).name);
    let signature = format!("{}{}", member.name, member.descriptor);
    let group_id = linkage.group_of(id);
    let group = linkage.group_mut(group_id);

    if group.kept {
        if obfuscated != member.name {
            diagnostics.warn(
                WarningKind::KeptRemapped,
                class,
                Some(signature),
                format!("kept member is mapped to `{obfuscated}`; keeping its name"),
            );
        }
        return false;
    }
    match &group.name {
        Some(existing) if existing != obfuscated => {
            let message =
                format!("mapped to `{obfuscated}`, but its link group is already named `{existing}`");
            diagnostics.warn(WarningKind::GroupMappingMismatch, class, Some(signature), message);
            false
        }
        Some(_) => false,
        None => {
            group.name = Some(obfuscated.to_string());
            group.fixed = true;
            true
        }
    }
}
