/// Module for rewriting symbolic references after renaming.
///
/// Runs last. Member descriptors pick up the new class names, and every constant-pool
/// entry is resolved the way the JVM resolves it (fields: the class, its interfaces,
/// then its superclass; methods: the superclass chain, then interfaces) so that a
/// reference through a subclass lands on the declaring member's new name.
/// References to symbols outside the pool are left untouched.
use crate::naming::{NameFactory, NumericNameFactory};
use obscura_core::descriptor::{external_class_name, map_classes};
use obscura_core::{ClassId, ClassPool, Constant, MemberId, TypeLink};
use obscura_utils::errors::DescriptorError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOptions {
    /// Rewrite string constants that spell an original class name.
    pub adapt_class_strings: bool,
}

/// Counts of rewritten references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStats {
    pub descriptors: usize,
    pub constants: usize,
    pub strings: usize,
    pub parameters: usize,
}

/// Original → new internal name of every renamed class.
fn class_renames(pool: &ClassPool) -> HashMap<String, String> {
    pool.classes()
        .filter(|c| c.is_renamed())
        .map(|c| (c.name.clone(), c.final_name().to_string()))
        .collect()
}

#[derive(Debug)]
struct Rewriter<'p> {
    pool: &'p ClassPool,
    classes: HashMap<String, String>,
    /// External original → external new name, for string adaptation.
    external: HashMap<String, String>,
}

impl<'p> Rewriter<'p> {
    fn new(pool: &'p ClassPool, options: RewriteOptions) -> Self {
        let classes = class_renames(pool);
        let external = if options.adapt_class_strings {
            classes
                .iter()
                .map(|(from, to)| (external_class_name(from), external_class_name(to)))
                .collect()
        } else {
            HashMap::new()
        };
        Self {
            pool,
            classes,
            external,
        }
    }

    fn descriptor(&self, descriptor: &str) -> Result<String, DescriptorError> {
        map_classes(descriptor, |class| self.classes.get(class).cloned())
    }

    /// Maps a class constant name, which may also be an array descriptor.
    fn class_name(&self, name: &str) -> Result<String, DescriptorError> {
        if name.starts_with('[') {
            return self.descriptor(name);
        }
        Ok(self.classes.get(name).cloned().unwrap_or_else(|| name.to_string()))
    }

    fn declared(&self, class: ClassId, name: &str, descriptor: &str, field: bool) -> Option<MemberId> {
        let node = self.pool.get(class);
        let index = node.find_member(name, descriptor)?;
        (node.members[index].is_field() == field).then_some(MemberId {
            class,
            index: index as u32,
        })
    }

    fn resolve_field(&self, owner: ClassId, name: &str, descriptor: &str) -> Option<MemberId> {
        let mut visited = HashSet::new();
        self.resolve_field_from(owner, name, descriptor, &mut visited)
    }

    fn resolve_field_from(
        &self,
        class: ClassId,
        name: &str,
        descriptor: &str,
        visited: &mut HashSet<ClassId>,
    ) -> Option<MemberId> {
        if !visited.insert(class) {
            return None;
        }
        if let Some(id) = self.declared(class, name, descriptor, true) {
            return Some(id);
        }
        let node = self.pool.get(class);
        for interface in node.interfaces.iter().filter_map(TypeLink::resolved) {
            if let Some(id) = self.resolve_field_from(interface, name, descriptor, visited) {
                return Some(id);
            }
        }
        let superclass = node.superclass.as_ref().and_then(TypeLink::resolved)?;
        self.resolve_field_from(superclass, name, descriptor, visited)
    }

    fn resolve_method(&self, owner: ClassId, name: &str, descriptor: &str) -> Option<MemberId> {
        let mut chain = Vec::new();
        let mut current = Some(owner);
        while let Some(class) = current {
            if chain.contains(&class) {
                break;
            }
            if let Some(id) = self.declared(class, name, descriptor, false) {
                return Some(id);
            }
            chain.push(class);
            current = self.pool.get(class).superclass.as_ref().and_then(TypeLink::resolved);
        }

        let mut queue: VecDeque<ClassId> = chain
            .iter()
            .flat_map(|&c| self.pool.get(c).interfaces.iter().filter_map(TypeLink::resolved))
            .collect();
        let mut visited: HashSet<ClassId> = HashSet::new();
        while let Some(interface) = queue.pop_front() {
            if !visited.insert(interface) {
                continue;
            }
            if let Some(id) = self.declared(interface, name, descriptor, false) {
                return Some(id);
            }
            queue.extend(
                self.pool
                    .get(interface)
                    .interfaces
                    .iter()
                    .filter_map(TypeLink::resolved),
            );
        }
        None
    }

    /// New name of the member a reference resolves to.
    fn member_name(&self, resolved: Option<MemberId>, name: &str) -> String {
        resolved.map_or_else(
            || name.to_string(),
            |id| self.pool.member(id).final_name().to_string(),
        )
    }

    /// Rewritten form of a constant, or `None` when nothing changes.
    fn constant(&self, constant: &Constant) -> Result<Option<Constant>, DescriptorError> {
        let rewritten = match constant {
            Constant::Class { name } => Constant::Class {
                name: self.class_name(name)?,
            },
            Constant::FieldRef {
                owner,
                name,
                descriptor,
            } => {
                let resolved = self
                    .pool
                    .lookup(owner)
                    .and_then(|class| self.resolve_field(class, name, descriptor));
                Constant::FieldRef {
                    owner: self.class_name(owner)?,
                    name: self.member_name(resolved, name),
                    descriptor: self.descriptor(descriptor)?,
                }
            }
            Constant::MethodRef {
                owner,
                name,
                descriptor,
                interface,
            } => {
                let resolved = self
                    .pool
                    .lookup(owner)
                    .and_then(|class| self.resolve_method(class, name, descriptor));
                Constant::MethodRef {
                    owner: self.class_name(owner)?,
                    name: self.member_name(resolved, name),
                    descriptor: self.descriptor(descriptor)?,
                    interface: *interface,
                }
            }
            Constant::InvokeDynamic { name, descriptor } => Constant::InvokeDynamic {
                name: name.clone(),
                descriptor: self.descriptor(descriptor)?,
            },
            Constant::MethodType { descriptor } => Constant::MethodType {
                descriptor: self.descriptor(descriptor)?,
            },
            Constant::String { value } => match self.external.get(value) {
                Some(renamed) => Constant::String {
                    value: renamed.clone(),
                },
                None => return Ok(None),
            },
        };
        Ok((rewritten != *constant).then_some(rewritten))
    }
}

/// Rewrites descriptors, constant pools, supertype names and parameter names.
///
/// Expects class names, member names (committed from the linkage) and the `kept`
/// flags to be final.
pub fn rewrite_references(
    pool: &mut ClassPool,
    options: RewriteOptions,
) -> Result<RewriteStats, DescriptorError> {
    let mut stats = RewriteStats::default();

    let mut descriptors: Vec<(MemberId, String)> = Vec::new();
    let mut constants: Vec<(ClassId, usize, Constant)> = Vec::new();
    let mut supertypes: Vec<(ClassId, Option<String>, Vec<String>, Option<String>)> = Vec::new();
    {
        let rewriter = Rewriter::new(pool, options);
        for class in pool.program_ids() {
            for id in pool.member_ids(class) {
                let member = pool.member(id);
                let descriptor = rewriter.descriptor(&member.descriptor)?;
                if descriptor != member.descriptor {
                    descriptors.push((id, descriptor));
                }
            }
            let node = pool.get(class);
            for (index, constant) in node.constants.iter().enumerate() {
                if let Some(rewritten) = rewriter.constant(constant)? {
                    if matches!(rewritten, Constant::String { .. }) {
                        stats.strings += 1;
                    }
                    constants.push((class, index, rewritten));
                }
            }
            let rename = |name: &String| rewriter.classes.get(name).unwrap_or(name).clone();
            supertypes.push((
                class,
                node.super_name.as_ref().map(rename),
                node.interface_names.iter().map(rename).collect(),
                node.outer_class.as_ref().map(rename),
            ));
        }
    }

    stats.descriptors = descriptors.len();
    for (id, descriptor) in descriptors {
        pool.member_mut(id).new_descriptor = Some(descriptor);
    }
    stats.constants = constants.len();
    for (class, index, constant) in constants {
        pool.get_mut(class).constants[index] = constant;
    }
    for (class, super_name, interface_names, outer_class) in supertypes {
        let node = pool.get_mut(class);
        node.super_name = super_name;
        node.interface_names = interface_names;
        node.outer_class = outer_class;
    }

    let mut factory = NumericNameFactory::new();
    for class in pool.program_ids().collect::<Vec<_>>() {
        for member in &mut pool.get_mut(class).members {
            if member.parameters_kept || member.parameter_names.is_empty() {
                continue;
            }
            factory.reset();
            for name in &mut member.parameter_names {
                *name = factory.next_name();
            }
            stats.parameters += 1;
        }
    }

    tracing::debug!(
        "Rewrote {} descriptors, {} constants ({} strings), {} parameter lists",
        stats.descriptors,
        stats.constants,
        stats.strings,
        stats.parameters
    );
    Ok(stats)
}
