/// Module for linking members that must be renamed together.
///
/// Two methods are linked when one overrides or implements the other, directly or through
/// a class that inherits one and implements the other. The linker looks at the complete
/// ancestry of every class at once: all non-static, non-private methods with the same name
/// and descriptor visible there form one group. Package-private methods only join methods
/// declared in their own package.
///
/// The result is a partition of every member of the pool into `LinkGroup`s. Each group
/// carries the single name all of its members will receive, which makes consistent
/// renaming of overriding methods hold by construction.
use crate::descriptor::package_prefix;
use crate::hierarchy::Hierarchy;
use crate::model::{ClassPool, Member, MemberId, Visibility};
use std::collections::HashMap;

/// Index of a group in a `Linkage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl GroupId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Members that share one assigned name.
#[derive(Debug, Clone, Default)]
pub struct LinkGroup {
    /// Members in pool order.
    pub members: Vec<MemberId>,
    /// Whether every member keeps its original name.
    pub kept: bool,
    /// The assigned name, once chosen.
    pub name: Option<String>,
    /// Whether the name was forced by an applied mapping.
    pub fixed: bool,
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // The smaller index stays the root so group order follows pool order.
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

/// Partition of all members into link groups.
#[derive(Debug, Clone)]
pub struct Linkage {
    offsets: Vec<usize>,
    group_of: Vec<GroupId>,
    groups: Vec<LinkGroup>,
}

/// Whether a member takes part in virtual dispatch.
fn is_virtual(member: &Member) -> bool {
    member.is_method() && !member.is_static && !member.is_private() && !member.is_initializer()
}

impl Linkage {
    /// Links the members of the pool.
    ///
    /// In `unique` mode every renameable member additionally joins all members of the
    /// program with the same name and descriptor, so equal original names map to equal
    /// new names across the whole program.
    pub fn link(pool: &ClassPool, hierarchy: &Hierarchy, unique: bool) -> Self {
        let mut offsets = Vec::with_capacity(pool.len());
        let mut total = 0;
        for class in pool.classes() {
            offsets.push(total);
            total += class.members.len();
        }
        let dense = |id: MemberId| offsets[id.class.index()] + id.index as usize;
        let mut sets = UnionFind::new(total);
        let mut links = 0usize;

        for class in pool.program_ids() {
            let mut by_signature: HashMap<(&str, &str), Vec<MemberId>> = HashMap::new();
            for ancestor in hierarchy.ancestors_inclusive(class) {
                for id in pool.member_ids(ancestor) {
                    let member = pool.member(id);
                    if is_virtual(member) {
                        by_signature
                            .entry((member.name.as_str(), member.descriptor.as_str()))
                            .or_default()
                            .push(id);
                    }
                }
            }
            for candidates in by_signature.values().filter(|c| c.len() > 1) {
                for (i, &a) in candidates.iter().enumerate() {
                    for &b in &candidates[i + 1..] {
                        if Self::overridable(pool, a, b) {
                            sets.union(dense(a), dense(b));
                            links += 1;
                        }
                    }
                }
            }
        }

        if unique {
            let mut by_signature: HashMap<(&str, &str), MemberId> = HashMap::new();
            for class in pool.program_ids() {
                for id in pool.member_ids(class) {
                    let member = pool.member(id);
                    if member.is_initializer() {
                        continue;
                    }
                    let key = (member.name.as_str(), member.descriptor.as_str());
                    match by_signature.get(&key) {
                        Some(&first) => sets.union(dense(first), dense(id)),
                        None => {
                            by_signature.insert(key, id);
                        }
                    }
                }
            }
        }

        let mut root_group: HashMap<usize, GroupId> = HashMap::new();
        let mut group_of = Vec::with_capacity(total);
        let mut groups: Vec<LinkGroup> = Vec::new();
        for class in pool.ids() {
            for id in pool.member_ids(class) {
                let root = sets.find(dense(id));
                let group = *root_group.entry(root).or_insert_with(|| {
                    groups.push(LinkGroup::default());
                    GroupId(groups.len() as u32 - 1)
                });
                groups[group.index()].members.push(id);
                group_of.push(group);
            }
        }

        // A method whose ancestry is incomplete may override something we cannot see.
        for class in pool.program_ids().filter(|&c| hierarchy.is_incomplete(c)) {
            for id in pool.member_ids(class) {
                if is_virtual(pool.member(id)) {
                    groups[group_of[dense(id)].index()].kept = true;
                }
            }
        }

        tracing::debug!(
            "Linked {} members into {} groups ({} override links)",
            total,
            groups.len(),
            links
        );
        Self {
            offsets,
            group_of,
            groups,
        }
    }

    /// Whether two same-signature virtual methods bind to each other.
    fn overridable(pool: &ClassPool, a: MemberId, b: MemberId) -> bool {
        let package_private = |id: MemberId| pool.member(id).visibility == Visibility::Package;
        if !package_private(a) && !package_private(b) {
            return true;
        }
        package_prefix(&pool.get(a.class).name) == package_prefix(&pool.get(b.class).name)
    }

    fn dense(&self, id: MemberId) -> usize {
        self.offsets[id.class.index()] + id.index as usize
    }

    pub fn group_of(&self, id: MemberId) -> GroupId {
        self.group_of[self.dense(id)]
    }

    pub fn group(&self, id: GroupId) -> &LinkGroup {
        &self.groups[id.index()]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut LinkGroup {
        &mut self.groups[id.index()]
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &LinkGroup)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| (GroupId(i as u32), g))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The name currently assigned to the member's group.
    pub fn name_of(&self, id: MemberId) -> Option<&str> {
        self.group(self.group_of(id)).name.as_deref()
    }

    pub fn is_kept(&self, id: MemberId) -> bool {
        self.group(self.group_of(id)).kept
    }

    /// Assigns a name to the member's whole group.
    pub fn assign(&mut self, id: MemberId, name: String) {
        let group = self.group_of(id);
        self.groups[group.index()].name = Some(name);
    }

    /// Makes groups with a kept member kept, names them and marks every member kept.
    ///
    /// Members that can never be renamed (initializers, library members) are kept too.
    pub fn propagate_kept(&mut self, pool: &mut ClassPool) {
        for group in &mut self.groups {
            group.kept |= group.members.iter().any(|&id| {
                let member = pool.member(id);
                member.kept || member.is_initializer() || pool.get(id.class).library
            });
        }
        for group in self.groups.iter_mut().filter(|g| g.kept) {
            let original = group
                .members
                .iter()
                .map(|&id| pool.member(id))
                .find(|m| m.kept || m.is_initializer())
                .or_else(|| group.members.first().map(|&id| pool.member(id)))
                .map(|m| m.name.clone());
            group.name = original;
            for &id in &group.members {
                pool.member_mut(id).kept = true;
            }
        }
    }

    /// Copies every group name into its members' `new_name`.
    pub fn commit(&self, pool: &mut ClassPool) {
        for group in &self.groups {
            for &id in &group.members {
                let member = pool.member_mut(id);
                member.new_name = Some(group.name.clone().unwrap_or_else(|| member.name.clone()));
            }
        }
    }
}
