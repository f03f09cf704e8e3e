use thiserror::Error;

/// Error type for building the class model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model document could not be read.
    #[error("could not read model '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The model document is not valid JSON for a class pool.
    #[error("malformed model document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error type for descriptor and type-name conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("unexpected end of descriptor `{0}`")]
    UnexpectedEnd(String),
    #[error("invalid character `{ch}` at {index} in descriptor `{descriptor}`")]
    InvalidChar {
        descriptor: String,
        ch: char,
        index: usize,
    },
    #[error("missing `;` in descriptor `{0}`")]
    MissingSemicolon(String),
    #[error("empty type name")]
    EmptyType,
}

/// Errors in the obfuscation configuration, reported before any rename work.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing tells the engine what to preserve or where to record the result.
    #[error("no keep rules, no mapping to apply and no mapping output were specified")]
    NothingToKeep,
    /// The configuration file could not be read.
    #[error("could not read config '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON.
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A dictionary file could not be read.
    #[error("could not read dictionary '{path}': {source}")]
    Dictionary {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A glob pattern in a keep rule is malformed.
    #[error("invalid pattern `{0}`")]
    InvalidPattern(String),
}

/// Error type for reading and writing mapping files.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("could not read mapping '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write mapping '{path}': {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mapping parse error at line {line}: {msg} ⇒ `{raw}`")]
    Parse {
        line: usize,
        msg: String,
        raw: String,
    },

    #[error("duplicate class record for `{0}`")]
    DuplicateClass(String),

    #[error("invalid type in mapping: {0}")]
    Type(#[from] DescriptorError),
}

/// Errors that can occur during obfuscation.
#[derive(Debug, Error)]
pub enum ObfuscateError {
    /// The configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The prior mapping could not be read or written.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),
    /// A descriptor in the model could not be rewritten.
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
    /// Warnings were configured as fatal and at least one was raised.
    #[error("{count} warning(s) treated as errors; first: {first}")]
    FatalWarnings { count: usize, first: String },
}
