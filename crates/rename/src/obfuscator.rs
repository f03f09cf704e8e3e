use crate::allocator::{allocate, AllocationOptions, AllocationStats};
use crate::apply::{apply_class_mappings, apply_member_mappings};
use crate::classes::{rename_classes, ClassNamingOptions, PackagePolicy};
use crate::conflict::resolve_conflicts;
use crate::naming::{read_dictionary, shuffle_words, NameSource};
use crate::rewrite::{rewrite_references, RewriteOptions, RewriteStats};
use obscura_core::seeds::{mark_parameter_names, mark_seeds, SeedReport};
use obscura_core::{ClassPool, Hierarchy, KeepRule, Linkage, NamePattern, SymbolFilter};
use obscura_mapping::{build_mapping, NameMapping};
use obscura_utils::errors::{ConfigError, ObfuscateError};
use obscura_utils::{Diagnostics, Warning};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for the rename pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObfuscationConfig {
    /// Rules selecting the symbols that keep their names
    pub keep: Vec<KeepRule>,
    /// Prior mapping whose names are reused
    pub apply_mapping: Option<PathBuf>,
    /// Where to write the resulting mapping
    pub print_mapping: Option<PathBuf>,
    /// Let overloads differ in their return type only
    pub overload_aggressively: bool,
    /// Give equal original member names equal new names across the program
    pub unique_member_names: bool,
    /// Keep the parameter names of kept methods
    pub keep_parameter_names: bool,
    pub package_policy: PackagePolicy,
    /// Packages (external names) exempt from renaming
    pub keep_package_names: Vec<NamePattern>,
    pub mixed_case_class_names: bool,
    pub unique_class_names: bool,
    /// Rewrite string constants that spell a renamed class
    pub adapt_class_strings: bool,
    pub member_dictionary: Option<PathBuf>,
    pub class_dictionary: Option<PathBuf>,
    pub package_dictionary: Option<PathBuf>,
    /// Shuffles dictionary words when set
    pub dictionary_seed: Option<u64>,
    /// Turn mapping and conflict warnings into errors
    pub warnings_fatal: bool,
}

impl Default for ObfuscationConfig {
    fn default() -> Self {
        Self {
            keep: Vec::new(),
            apply_mapping: None,
            print_mapping: None,
            overload_aggressively: false,
            unique_member_names: false,
            keep_parameter_names: false,
            package_policy: PackagePolicy::Obfuscate,
            keep_package_names: Vec::new(),
            mixed_case_class_names: true,
            unique_class_names: false,
            adapt_class_strings: false,
            member_dictionary: None,
            class_dictionary: None,
            package_dictionary: None,
            dictionary_seed: None,
            warnings_fatal: false,
        }
    }
}

impl ObfuscationConfig {
    /// Loads a JSON configuration; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Named starting points for common setups.
pub mod presets {
    use super::ObfuscationConfig;
    use crate::classes::PackagePolicy;
    use obscura_core::KeepRule;

    /// Default renaming with the given keep rules.
    pub fn standard(keep: Vec<KeepRule>) -> ObfuscationConfig {
        ObfuscationConfig {
            keep,
            ..Default::default()
        }
    }

    /// Moves every renamed class into one package.
    pub fn repackaged(keep: Vec<KeepRule>, target: &str) -> ObfuscationConfig {
        ObfuscationConfig {
            keep,
            package_policy: PackagePolicy::Repackage {
                target: target.to_string(),
            },
            ..Default::default()
        }
    }

    /// Program-wide unique names, lowercase class names.
    pub fn unique(keep: Vec<KeepRule>) -> ObfuscationConfig {
        ObfuscationConfig {
            keep,
            unique_member_names: true,
            unique_class_names: true,
            mixed_case_class_names: false,
            ..Default::default()
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObfuscationResult {
    /// Number of renamed program classes
    pub classes: usize,
    /// Number of renamed program fields
    pub fields: usize,
    /// Number of renamed program methods
    pub methods: usize,
    /// Number of link groups moved to a fallback name
    pub conflicts: usize,
    pub seeds: SeedReport,
    pub allocation: AllocationStats,
    pub rewrite: RewriteStats,
    pub warnings: Vec<Warning>,
    /// The final mapping
    #[serde(skip)]
    pub mapping: NameMapping,
}

/// The rename pipeline
pub struct Obfuscator {
    config: ObfuscationConfig,
    filters: Vec<Box<dyn SymbolFilter>>,
    mapping: Option<NameMapping>,
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator")
            .field("config", &self.config)
            .field("filters", &format!("{} filters", self.filters.len()))
            .field("mapping", &self.mapping.as_ref().map(NameMapping::len))
            .finish()
    }
}

fn name_source(
    dictionary: Option<&Path>,
    mixed_case: bool,
    seed: Option<u64>,
) -> Result<NameSource, ConfigError> {
    let source = NameSource::simple(mixed_case);
    let Some(path) = dictionary else {
        return Ok(source);
    };
    let mut words = read_dictionary(path)?;
    if let Some(seed) = seed {
        shuffle_words(&mut words, seed);
    }
    Ok(source.with_words(words))
}

/// Renamed program fields and methods, counted from the group names.
fn renamed_members(pool: &ClassPool, linkage: &Linkage) -> (usize, usize) {
    let (mut fields, mut methods) = (0, 0);
    for class in pool.program_ids() {
        for id in pool.member_ids(class) {
            let member = pool.member(id);
            if !linkage.name_of(id).is_some_and(|name| name != member.name) {
                continue;
            }
            if member.is_field() {
                fields += 1;
            } else {
                methods += 1;
            }
        }
    }
    (fields, methods)
}

/// Escalates collected warnings, logging the partial summary when the run stops.
fn stop_on_warnings(
    diagnostics: &Diagnostics,
    fatal: bool,
    pool: &ClassPool,
    linkage: &Linkage,
    classes: usize,
) -> Result<(), ObfuscateError> {
    diagnostics.escalate(fatal).inspect_err(|_| {
        let (fields, methods) = renamed_members(pool, linkage);
        tracing::info!(
            "Stopped after naming {} classes, {} fields, {} methods ({} warnings)",
            classes,
            fields,
            methods,
            diagnostics.len()
        );
    })
}

impl Obfuscator {
    pub fn new(config: ObfuscationConfig) -> Self {
        Self {
            config,
            filters: Vec::new(),
            mapping: None,
        }
    }

    /// Adds a keep predicate besides the configured rules.
    pub fn with_filter(mut self, filter: Box<dyn SymbolFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Applies an in-memory prior mapping instead of `apply_mapping`.
    pub fn with_mapping(mut self, mapping: NameMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn config(&self) -> &ObfuscationConfig {
        &self.config
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let config = &self.config;
        if config.keep.is_empty()
            && self.filters.is_empty()
            && config.apply_mapping.is_none()
            && self.mapping.is_none()
            && config.print_mapping.is_none()
        {
            return Err(ConfigError::NothingToKeep);
        }
        Ok(())
    }

    fn prior_mapping(&self) -> Result<Option<NameMapping>, ObfuscateError> {
        match (&self.mapping, &self.config.apply_mapping) {
            (Some(mapping), _) => Ok(Some(mapping.clone())),
            (None, Some(path)) => Ok(Some(NameMapping::read_file(path)?)),
            (None, None) => Ok(None),
        }
    }

    /// Renames the program classes of `pool` in place.
    pub fn run(&self, pool: &mut ClassPool) -> Result<ObfuscationResult, ObfuscateError> {
        let config = &self.config;

        // Step 1: Validate configuration
        self.validate()?;

        // Step 2: Read dictionaries and the prior mapping
        let seed = config.dictionary_seed;
        let members = name_source(config.member_dictionary.as_deref(), true, seed)?;
        let classes = name_source(
            config.class_dictionary.as_deref(),
            config.mixed_case_class_names,
            seed,
        )?;
        let packages = name_source(config.package_dictionary.as_deref(), false, seed)?;
        let prior = self.prior_mapping()?;

        tracing::debug!("Starting rename pipeline:");
        tracing::debug!("  Classes: {} ({} members)", pool.len(), pool.member_count());
        tracing::debug!("  Keep rules: {}", config.keep.len() + self.filters.len());
        tracing::debug!(
            "  Prior mapping: {} classes",
            prior.as_ref().map_or(0, NameMapping::len)
        );

        // Step 3: Hierarchy, seeds and link groups
        let hierarchy = Hierarchy::build(pool);
        let filters: Vec<&dyn SymbolFilter> = config
            .keep
            .iter()
            .map(|rule| rule as &dyn SymbolFilter)
            .chain(self.filters.iter().map(|f| f.as_ref() as &dyn SymbolFilter))
            .collect();
        let seeds = mark_seeds(pool, &hierarchy, &filters);
        let mut linkage = Linkage::link(pool, &hierarchy, config.unique_member_names);
        linkage.propagate_kept(pool);
        mark_parameter_names(pool, config.keep_parameter_names);

        // Step 4: Classes and packages
        let mut diagnostics = Diagnostics::new();
        if let Some(prior) = &prior {
            apply_class_mappings(pool, prior, &mut diagnostics);
        }
        let class_options = ClassNamingOptions {
            policy: config.package_policy.clone(),
            keep_package_names: config.keep_package_names.clone(),
            unique_class_names: config.unique_class_names,
            classes,
            packages,
        };
        let renamed_classes = rename_classes(pool, &class_options);

        // Step 5: Member names from the prior mapping
        if let Some(prior) = &prior {
            apply_member_mappings(pool, &mut linkage, prior, &mut diagnostics);
        }
        stop_on_warnings(&diagnostics, config.warnings_fatal, pool, &linkage, renamed_classes)?;

        // Step 6: Allocate member names
        let options = AllocationOptions {
            aggressive: config.overload_aggressively,
            unique: config.unique_member_names,
        };
        let allocation = allocate(pool, &hierarchy, &mut linkage, members.factory().as_mut(), options);

        // Step 7: Resolve conflicts
        let conflicts = resolve_conflicts(
            pool,
            &hierarchy,
            &mut linkage,
            members.special_factory().as_mut(),
            config.overload_aggressively,
            &mut diagnostics,
        );
        stop_on_warnings(&diagnostics, config.warnings_fatal, pool, &linkage, renamed_classes)?;

        // Step 8: Commit
        linkage.commit(pool);

        // Step 9: Rewrite references
        let rewrite = rewrite_references(
            pool,
            RewriteOptions {
                adapt_class_strings: config.adapt_class_strings,
            },
        )?;

        // Step 10: Mapping
        let mapping = build_mapping(pool)?;
        if let Some(path) = &config.print_mapping {
            mapping.write_file(path)?;
            tracing::debug!("  Wrote mapping to {}", path.display());
        }

        // Step 11: Summary
        let (fields, methods) = renamed_members(pool, &linkage);
        let result = ObfuscationResult {
            classes: renamed_classes,
            fields,
            methods,
            conflicts,
            seeds,
            allocation,
            rewrite,
            warnings: diagnostics.warnings().to_vec(),
            mapping,
        };
        tracing::info!(
            "Obfuscated {} classes, {} fields, {} methods ({} warnings)",
            result.classes,
            result.fields,
            result.methods,
            result.warnings.len()
        );
        Ok(result)
    }
}
