/// Module for assigning new class and package names.
///
/// Class names are chosen independently of member names. A class whose name is fixed
/// (kept, library, or set by an applied mapping) pins its original package to the
/// package it ends up in, so the other classes of that package follow it and keep
/// their package-private access. Every other package is mapped according to the
/// `PackagePolicy`, and classes receive the first simple name from their package's
/// factory that no class in that package already uses.
use crate::naming::{NameFactory, NameSource};
use obscura_core::descriptor::{
    external_class_name, internal_class_name, package_prefix, parent_package_prefix, simple_name,
};
use obscura_core::{ClassId, ClassPool, NamePattern};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Where renamed classes are placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PackagePolicy {
    /// Classes stay in their packages.
    Keep,
    /// Every package gets a new name; the package tree is preserved.
    #[default]
    Obfuscate,
    /// Renamed packages become direct children of `target`.
    Flatten { target: String },
    /// All renamed classes move into `target` (`""` is the root package).
    Repackage { target: String },
}

#[derive(Debug, Clone)]
pub struct ClassNamingOptions {
    pub policy: PackagePolicy,
    /// Packages (external names) that keep their names.
    pub keep_package_names: Vec<NamePattern>,
    /// Make simple names unique across all packages.
    pub unique_class_names: bool,
    /// Simple class names. A lowercase-only source also makes collision checks
    /// case-insensitive.
    pub classes: NameSource,
    pub packages: NameSource,
}

impl Default for ClassNamingOptions {
    fn default() -> Self {
        Self {
            policy: PackagePolicy::Obfuscate,
            keep_package_names: Vec::new(),
            unique_class_names: false,
            classes: NameSource::simple(true),
            packages: NameSource::simple(false),
        }
    }
}

/// Converts an external package name to an internal prefix (`com.x` → `com/x/`).
fn target_prefix(target: &str) -> String {
    if target.is_empty() {
        String::new()
    } else {
        format!("{}/", internal_class_name(target.trim_end_matches('.')))
    }
}

#[derive(Debug)]
struct ClassRenamer<'o> {
    options: &'o ClassNamingOptions,
    /// Original package prefix → new package prefix.
    packages: HashMap<String, String>,
    used_packages: HashSet<String>,
    used_classes: HashSet<String>,
    used_simple_names: HashSet<String>,
    package_factories: HashMap<String, Box<dyn NameFactory>>,
    class_factories: HashMap<String, Box<dyn NameFactory>>,
}

impl<'o> ClassRenamer<'o> {
    fn new(options: &'o ClassNamingOptions) -> Self {
        Self {
            options,
            packages: HashMap::new(),
            used_packages: HashSet::new(),
            used_classes: HashSet::new(),
            used_simple_names: HashSet::new(),
            package_factories: HashMap::new(),
            class_factories: HashMap::new(),
        }
    }

    /// Collision key of a name.
    fn fold(&self, name: &str) -> String {
        if self.options.classes.mixed_case() {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    fn keeps_package(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return false;
        }
        let package = external_class_name(prefix.trim_end_matches('/'));
        self.options
            .keep_package_names
            .iter()
            .any(|p| p.matches(&package))
    }

    /// Records a class name that is final before renaming starts.
    fn reserve(&mut self, original: &str, new: &str) {
        let folded = self.fold(new);
        let simple = self.fold(simple_name(new));
        self.used_classes.insert(folded);
        self.used_simple_names.insert(simple);
        let new_package = package_prefix(new).to_string();
        self.used_packages.insert(self.fold(&new_package));
        self.packages
            .entry(package_prefix(original).to_string())
            .or_insert(new_package);
    }

    fn pin_package(&mut self, prefix: &str) {
        if !self.packages.contains_key(prefix) {
            self.packages.insert(prefix.to_string(), prefix.to_string());
            self.used_packages.insert(self.fold(prefix));
        }
    }

    /// New prefix for an original package prefix.
    fn new_package(&mut self, prefix: &str) -> String {
        if let Some(mapped) = self.packages.get(prefix) {
            return mapped.clone();
        }
        let mapped = if self.keeps_package(prefix) {
            prefix.to_string()
        } else {
            match &self.options.policy {
                PackagePolicy::Keep => prefix.to_string(),
                PackagePolicy::Repackage { target } => target_prefix(target),
                PackagePolicy::Obfuscate if prefix.is_empty() => String::new(),
                PackagePolicy::Obfuscate => {
                    let parent = self.new_package(parent_package_prefix(prefix));
                    self.fresh_package(&parent)
                }
                PackagePolicy::Flatten { target } => {
                    let parent = target_prefix(target);
                    self.fresh_package(&parent)
                }
            }
        };
        self.packages.insert(prefix.to_string(), mapped.clone());
        self.used_packages.insert(self.fold(&mapped));
        mapped
    }

    fn fresh_package(&mut self, parent: &str) -> String {
        let source = &self.options.packages;
        let factory = self
            .package_factories
            .entry(parent.to_string())
            .or_insert_with(|| source.factory());
        loop {
            let candidate = format!("{parent}{}/", factory.next_name());
            let folded = if self.options.classes.mixed_case() {
                candidate.clone()
            } else {
                candidate.to_lowercase()
            };
            if !self.used_packages.contains(&folded) {
                return candidate;
            }
        }
    }

    /// First free name `<prefix><simple>` from the factory of `scope`.
    fn fresh_class(&mut self, prefix: &str, scope: &str, top_level: bool) -> String {
        let mixed_case = self.options.classes.mixed_case();
        let unique = self.options.unique_class_names && top_level;
        let source = &self.options.classes;
        let factory = self
            .class_factories
            .entry(scope.to_string())
            .or_insert_with(|| source.factory());
        let fold = |name: &str| {
            if mixed_case {
                name.to_string()
            } else {
                name.to_lowercase()
            }
        };
        loop {
            let simple = factory.next_name();
            let candidate = format!("{prefix}{simple}");
            if self.used_classes.contains(&fold(&candidate))
                || (unique && self.used_simple_names.contains(&fold(&simple)))
            {
                continue;
            }
            self.used_classes.insert(fold(&candidate));
            if top_level {
                self.used_simple_names.insert(fold(&simple));
            }
            return candidate;
        }
    }

    fn name_class(
        &mut self,
        pool: &ClassPool,
        id: ClassId,
        names: &mut [Option<String>],
        visiting: &mut [bool],
    ) -> String {
        if let Some(name) = &names[id.index()] {
            return name.clone();
        }
        visiting[id.index()] = true;
        let class = pool.get(id);
        let outer = class
            .outer
            .filter(|outer| !visiting[outer.index()] && !pool.get(*outer).library);
        let name = match outer {
            Some(outer) => {
                let outer_name = self.name_class(pool, outer, names, visiting);
                let prefix = format!("{outer_name}$");
                self.fresh_class(&prefix, &prefix, false)
            }
            None => {
                let package = self.new_package(class.package_prefix());
                let scope = if self.options.unique_class_names {
                    String::new()
                } else {
                    package.clone()
                };
                self.fresh_class(&package, &scope, true)
            }
        };
        visiting[id.index()] = false;
        names[id.index()] = Some(name.clone());
        name
    }
}

/// Assigns `new_name` to every program class and returns the number of renamed classes.
///
/// Classes that already carry a `new_name` (from an applied mapping) and kept classes
/// keep that name; library classes are never renamed but reserve their names.
pub fn rename_classes(pool: &mut ClassPool, options: &ClassNamingOptions) -> usize {
    let mut renamer = ClassRenamer::new(options);
    let mut names: Vec<Option<String>> = vec![None; pool.len()];

    for id in pool.ids() {
        let class = pool.get(id);
        let fixed = if class.library || class.kept {
            Some(class.name.clone())
        } else {
            class.new_name.clone()
        };
        if let Some(new) = fixed {
            renamer.reserve(&class.name, &new);
            names[id.index()] = Some(new);
        }
    }
    for id in pool.program_ids() {
        let prefix = pool.get(id).package_prefix().to_string();
        if renamer.keeps_package(&prefix) {
            renamer.pin_package(&prefix);
        }
    }

    let mut visiting = vec![false; pool.len()];
    let program: Vec<ClassId> = pool.program_ids().collect();
    for &id in &program {
        renamer.name_class(pool, id, &mut names, &mut visiting);
    }

    let mut renamed = 0;
    for id in program {
        let class = pool.get_mut(id);
        class.new_name = names[id.index()].take();
        if class.is_renamed() {
            renamed += 1;
            tracing::debug!("Class {} -> {}", class.name, class.final_name());
        }
    }
    tracing::debug!(
        "Renamed {} classes into {} packages",
        renamed,
        renamer.packages.len()
    );
    renamed
}
