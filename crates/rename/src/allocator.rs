/// Module for assigning new names to link groups.
///
/// Allocation runs in two tiers. The non-private tier walks every bottom class of the
/// hierarchy together with all its ancestors: every member there that already has a
/// name (kept, library, fixed by a mapping, or allocated from an earlier bottom class)
/// is collected into a fresh `ScopeTable`, and every unnamed non-private group is then
/// given the first free name. The private tier names private members per class, against
/// the class's own names and the non-private names of its ancestors and descendants.
///
/// In unique mode a single table covers the whole run and every group is named once.
use crate::naming::NameFactory;
use crate::scope::{Hold, ScopeTable};
use obscura_core::descriptor::overload_key;
use obscura_core::{ClassId, ClassPool, Hierarchy, Linkage, Member, MemberId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOptions {
    /// Key overloads by their full descriptor instead of their argument list.
    pub aggressive: bool,
    /// Use one program-wide scope.
    pub unique: bool,
}

/// Number of groups named per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStats {
    pub non_private: usize,
    pub private: usize,
    pub unique: usize,
}

pub(crate) fn hold_of(linkage: &Linkage, id: MemberId) -> Hold {
    let group = linkage.group(linkage.group_of(id));
    if group.kept {
        Hold::Kept
    } else if group.fixed {
        Hold::Fixed
    } else {
        Hold::Assigned
    }
}

/// Adds the named members of `class` accepted by `filter` to `table`.
pub(crate) fn collect_names<F>(
    table: &mut ScopeTable,
    pool: &ClassPool,
    linkage: &Linkage,
    class: ClassId,
    aggressive: bool,
    filter: F,
) where
    F: Fn(&Member) -> bool,
{
    for id in pool.member_ids(class) {
        let member = pool.member(id);
        if !filter(member) {
            continue;
        }
        if let Some(name) = linkage.name_of(id) {
            table.insert(
                overload_key(&member.descriptor, aggressive),
                name,
                &member.name,
                hold_of(linkage, id),
            );
        }
    }
}

/// Names every unnamed group.
pub fn allocate(
    pool: &ClassPool,
    hierarchy: &Hierarchy,
    linkage: &mut Linkage,
    factory: &mut dyn NameFactory,
    options: AllocationOptions,
) -> AllocationStats {
    let stats = if options.unique {
        AllocationStats {
            unique: allocate_unique(pool, linkage, factory, options.aggressive),
            ..Default::default()
        }
    } else {
        let non_private = allocate_non_private(pool, hierarchy, linkage, factory, options.aggressive);
        let private = allocate_private(pool, hierarchy, linkage, factory, options.aggressive);
        AllocationStats {
            non_private,
            private,
            unique: 0,
        }
    };
    tracing::debug!(
        "Allocated names: {} non-private, {} private, {} unique",
        stats.non_private,
        stats.private,
        stats.unique
    );
    stats
}

/// Gives the member's group the first name that is free in `table`.
fn assign_unnamed(
    table: &mut ScopeTable,
    pool: &ClassPool,
    linkage: &mut Linkage,
    factory: &mut dyn NameFactory,
    id: MemberId,
    aggressive: bool,
) -> bool {
    if linkage.name_of(id).is_some() {
        return false;
    }
    let member = pool.member(id);
    let key = overload_key(&member.descriptor, aggressive);
    let name = table.next_free(factory, key);
    table.insert(key, &name, &member.name, Hold::Assigned);
    linkage.assign(id, name);
    true
}

fn allocate_non_private(
    pool: &ClassPool,
    hierarchy: &Hierarchy,
    linkage: &mut Linkage,
    factory: &mut dyn NameFactory,
    aggressive: bool,
) -> usize {
    let mut named = 0;
    for bottom in hierarchy.bottom_classes(pool) {
        let chain = hierarchy.ancestors_inclusive(bottom);
        let mut table = ScopeTable::new();
        for &class in &chain {
            collect_names(&mut table, pool, linkage, class, aggressive, |_| true);
        }
        // Supertypes first, so names are handed out from the top of the hierarchy down.
        for &class in chain.iter().rev().filter(|&&c| !pool.get(c).library) {
            for id in pool.member_ids(class) {
                if !pool.member(id).is_private()
                    && assign_unnamed(&mut table, pool, linkage, factory, id, aggressive)
                {
                    named += 1;
                }
            }
        }
    }
    named
}

fn allocate_private(
    pool: &ClassPool,
    hierarchy: &Hierarchy,
    linkage: &mut Linkage,
    factory: &mut dyn NameFactory,
    aggressive: bool,
) -> usize {
    let mut named = 0;
    for class in pool.program_ids() {
        if !pool.get(class).members.iter().any(Member::is_private) {
            continue;
        }
        let mut table = ScopeTable::new();
        collect_names(&mut table, pool, linkage, class, aggressive, |_| true);
        for related in hierarchy
            .ancestors(class)
            .into_iter()
            .chain(hierarchy.descendants(class))
        {
            collect_names(&mut table, pool, linkage, related, aggressive, |m| {
                !m.is_private()
            });
        }
        for id in pool.member_ids(class) {
            if pool.member(id).is_private()
                && assign_unnamed(&mut table, pool, linkage, factory, id, aggressive)
            {
                named += 1;
            }
        }
    }
    named
}

fn allocate_unique(
    pool: &ClassPool,
    linkage: &mut Linkage,
    factory: &mut dyn NameFactory,
    aggressive: bool,
) -> usize {
    let mut table = ScopeTable::new();
    for class in pool.ids() {
        collect_names(&mut table, pool, linkage, class, aggressive, |_| true);
    }
    let unnamed: Vec<MemberId> = linkage
        .groups()
        .filter(|(_, group)| group.name.is_none())
        .filter_map(|(_, group)| group.members.first().copied())
        .collect();
    let mut named = 0;
    for id in unnamed {
        if assign_unnamed(&mut table, pool, linkage, factory, id, aggressive) {
            named += 1;
        }
    }
    named
}
