/// Module for marking the symbols that must keep their original names.
///
/// Seeds come from four sources: keep rules, library classes, initializers, and the
/// functional interface methods that synthetic call sites (`invokedynamic`) bind to by
/// name. Link-group propagation of the resulting flags happens in
/// `Linkage::propagate_kept`, after which `mark_parameter_names` records which
/// methods also keep their parameter names.
use crate::descriptor::return_class;
use crate::hierarchy::Hierarchy;
use crate::keep::SymbolFilter;
use crate::model::{ClassPool, Constant, MemberId};
use serde::{Deserialize, Serialize};

/// Counts of seeds found by `mark_seeds`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub classes: usize,
    pub members: usize,
    pub call_site_targets: usize,
}

/// Sets the `kept` flags of classes and members.
pub fn mark_seeds(
    pool: &mut ClassPool,
    hierarchy: &Hierarchy,
    filters: &[&dyn SymbolFilter],
) -> SeedReport {
    let mut report = SeedReport::default();
    let mut kept_classes = Vec::new();
    let mut kept_members = Vec::new();

    for class in pool.ids() {
        let node = pool.get(class);
        if node.library || filters.iter().any(|f| f.keeps_class(pool, hierarchy, class)) {
            kept_classes.push(class);
        }
        for id in pool.member_ids(class) {
            let member = pool.member(id);
            if node.library
                || member.is_initializer()
                || filters
                    .iter()
                    .any(|f| f.keeps_member(pool, hierarchy, class, member))
            {
                kept_members.push(id);
            }
        }
    }

    let call_site_targets = call_site_targets(pool, hierarchy);
    report.call_site_targets = call_site_targets.len();
    kept_members.extend(call_site_targets);

    for class in kept_classes {
        let node = pool.get_mut(class);
        if !node.kept && !node.library {
            report.classes += 1;
        }
        node.kept = true;
    }
    for id in kept_members {
        let library = pool.get(id.class).library;
        let member = pool.member_mut(id);
        if !member.kept && !library {
            report.members += 1;
        }
        member.kept = true;
    }

    tracing::info!(
        "Seeds: {} classes, {} members, {} call-site targets",
        report.classes,
        report.members,
        report.call_site_targets
    );
    report
}

/// Abstract methods of functional interfaces named by `invokedynamic` call sites.
///
/// The call site carries the interface method name as a constant, so the method
/// declared by the interface (or one of its superinterfaces) cannot be renamed.
fn call_site_targets(pool: &ClassPool, hierarchy: &Hierarchy) -> Vec<MemberId> {
    let mut targets = Vec::new();
    for class in pool.program_ids() {
        for constant in &pool.get(class).constants {
            let Constant::InvokeDynamic { name, descriptor } = constant else {
                continue;
            };
            let Some(interface) = return_class(descriptor).and_then(|c| pool.lookup(c)) else {
                continue;
            };
            for ancestor in hierarchy.ancestors_inclusive(interface) {
                for id in pool.member_ids(ancestor) {
                    let member = pool.member(id);
                    if member.is_method()
                        && member.is_abstract
                        && member.name == *name
                        && !targets.contains(&id)
                    {
                        targets.push(id);
                    }
                }
            }
        }
    }
    targets
}

/// Marks the parameter names of kept methods as kept when requested.
///
/// Runs after kept flags were propagated through link groups.
pub fn mark_parameter_names(pool: &mut ClassPool, keep_parameter_names: bool) {
    for class in pool.ids().collect::<Vec<_>>() {
        let library = pool.get(class).library;
        for member in &mut pool.get_mut(class).members {
            member.parameters_kept =
                library || (keep_parameter_names && member.kept && member.is_method());
        }
    }
}
