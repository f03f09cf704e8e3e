//! Detection and repair of name collisions left after allocation.
//!
//! Allocation only sees one scope at a time. A group named in one bottom class may
//! land on a name that a member of another class reachable from the same group already
//! holds, and applied mappings can force such collisions directly. The resolver
//! rebuilds every scope, finds `(key, name)` pairs claimed by more than one original
//! name and moves the losing group onto a special name that no ordinary factory emits.

use crate::allocator::{collect_names, hold_of};
use crate::naming::{is_special, NameFactory};
use crate::scope::{Hold, ScopeTable};
use obscura_core::descriptor::{external_class_name, overload_key};
use obscura_core::{ClassId, ClassPool, Hierarchy, Linkage, MemberId};
use obscura_utils::{Diagnostics, WarningKind};

/// Repairs collisions and returns the number of reassigned groups.
///
/// `factory` must produce special names. Kept groups are never reassigned; one
/// warning is recorded per reassignment.
pub fn resolve_conflicts(
    pool: &ClassPool,
    hierarchy: &Hierarchy,
    linkage: &mut Linkage,
    factory: &mut dyn NameFactory,
    aggressive: bool,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut resolver = Resolver {
        pool,
        factory,
        aggressive,
        specials: special_names(pool, linkage, aggressive),
        resolved: 0,
    };

    // Private members of different classes never clash; they are checked per class below.
    for bottom in hierarchy.bottom_classes(pool) {
        let chain = hierarchy.ancestors_inclusive(bottom);
        let visible: Vec<MemberId> = chain
            .iter()
            .flat_map(|&c| pool.member_ids(c))
            .filter(|&id| !pool.member(id).is_private())
            .collect();
        resolver.resolve_scope(linkage, &[], &chain, &visible, diagnostics);
    }

    for class in pool.program_ids() {
        if !pool.get(class).members.iter().any(|m| m.is_private()) {
            continue;
        }
        let related: Vec<ClassId> = hierarchy
            .ancestors(class)
            .into_iter()
            .chain(hierarchy.descendants(class))
            .collect();
        let mut visible: Vec<MemberId> = pool.member_ids(class).collect();
        for &other in &related {
            visible.extend(pool.member_ids(other).filter(|&id| !pool.member(id).is_private()));
        }
        resolver.resolve_scope(linkage, &[class], &related, &visible, diagnostics);
    }

    if resolver.resolved > 0 {
        tracing::info!("Resolved {} naming conflicts", resolver.resolved);
    }
    resolver.resolved
}

/// Every special name already in use, program and library.
fn special_names(pool: &ClassPool, linkage: &Linkage, aggressive: bool) -> ScopeTable {
    let mut table = ScopeTable::new();
    for class in pool.ids() {
        for id in pool.member_ids(class) {
            let member = pool.member(id);
            let name = linkage.name_of(id).unwrap_or(&member.name);
            if is_special(name) {
                table.insert(
                    overload_key(&member.descriptor, aggressive),
                    name,
                    &member.name,
                    hold_of(linkage, id),
                );
            }
        }
    }
    table
}

#[derive(Debug)]
struct Resolver<'a> {
    pool: &'a ClassPool,
    factory: &'a mut dyn NameFactory,
    aggressive: bool,
    specials: ScopeTable,
    resolved: usize,
}

impl Resolver<'_> {
    /// Checks the `visible` members of one scope against the table built from it.
    ///
    /// `own` classes contribute all members to the table, `related` classes only their
    /// non-private ones.
    fn resolve_scope(
        &mut self,
        linkage: &mut Linkage,
        own: &[ClassId],
        related: &[ClassId],
        visible: &[MemberId],
        diagnostics: &mut Diagnostics,
    ) {
        let mut table = ScopeTable::new();
        for &class in own {
            collect_names(&mut table, self.pool, linkage, class, self.aggressive, |_| true);
        }
        for &class in related {
            collect_names(&mut table, self.pool, linkage, class, self.aggressive, |m| {
                !m.is_private()
            });
        }

        for &id in visible {
            let member = self.pool.member(id);
            let Some(name) = linkage.name_of(id) else {
                continue;
            };
            let key = overload_key(&member.descriptor, self.aggressive);
            let Some(winner) = table.get(key, name) else {
                // Reassigned earlier in this scope.
                continue;
            };
            if winner.original == member.name || linkage.is_kept(id) {
                continue;
            }
            let winner = winner.original.clone();
            let old = name.to_string();
            self.reassign(linkage, id, key, &old, &winner, diagnostics);
        }
    }

    fn reassign(
        &mut self,
        linkage: &mut Linkage,
        id: MemberId,
        key: &str,
        old: &str,
        winner: &str,
        diagnostics: &mut Diagnostics,
    ) {
        let member = self.pool.member(id);
        let new = self.specials.next_free(self.factory, key);
        self.specials.insert(key, &new, &member.name, Hold::Assigned);
        linkage.assign(id, new.clone());
        self.resolved += 1;
        diagnostics.warn(
            WarningKind::NameConflict,
            external_class_name(&self.pool.get(id.class).name),
            Some(format!("{}{}", member.name, member.descriptor)),
            format!("renamed from `{old}` to `{new}` to avoid a collision with `{winner}`"),
        );
    }
}
