/// Module for generating candidate names.
///
/// A `NameFactory` yields an unbounded, deterministic sequence of names and can be
/// restarted with `reset`. Allocation resets the member factory before every group, so
/// each member gets the shortest name that is free in its scope.
use obscura_utils::errors::ConfigError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::fs;
use std::path::Path;

/// Suffix that marks names produced by the fallback factory.
pub const SPECIAL_SUFFIX: char = '_';

/// A restartable source of candidate names.
pub trait NameFactory: fmt::Debug {
    /// Restarts the sequence from its first name.
    fn reset(&mut self);
    /// Returns the next candidate.
    fn next_name(&mut self) -> String;
}

/// Names that only the special factory produces.
pub fn is_special(name: &str) -> bool {
    name.ends_with(SPECIAL_SUFFIX)
}

/// Generates `a`..`z`, then `A`..`Z` when mixed case is enabled, then `aa`, `ab`, ...
#[derive(Debug, Clone)]
pub struct SimpleNameFactory {
    mixed_case: bool,
    index: usize,
}

impl SimpleNameFactory {
    pub const fn new(mixed_case: bool) -> Self {
        Self {
            mixed_case,
            index: 0,
        }
    }

    fn alphabet_len(&self) -> usize {
        if self.mixed_case {
            52
        } else {
            26
        }
    }

    /// The name at a position of the sequence.
    pub fn name_at(&self, index: usize) -> String {
        let base = self.alphabet_len();
        let mut chars = Vec::new();
        let mut rest = index;
        loop {
            let offset = rest % base;
            chars.push(if offset < 26 {
                (b'a' + offset as u8) as char
            } else {
                (b'A' + (offset - 26) as u8) as char
            });
            if rest < base {
                break;
            }
            rest = rest / base - 1;
        }
        chars.iter().rev().collect()
    }
}

impl NameFactory for SimpleNameFactory {
    fn reset(&mut self) {
        self.index = 0;
    }

    fn next_name(&mut self) -> String {
        let name = self.name_at(self.index);
        self.index += 1;
        name
    }
}

/// Wraps a factory and marks every name with [`SPECIAL_SUFFIX`].
///
/// Ordinary factories never produce such names, so the two name spaces are disjoint.
#[derive(Debug)]
pub struct SpecialNameFactory {
    inner: Box<dyn NameFactory>,
}

impl SpecialNameFactory {
    pub fn new(inner: Box<dyn NameFactory>) -> Self {
        Self { inner }
    }
}

impl NameFactory for SpecialNameFactory {
    fn reset(&mut self) {
        self.inner.reset();
    }

    fn next_name(&mut self) -> String {
        let mut name = self.inner.next_name();
        name.push(SPECIAL_SUFFIX);
        name
    }
}

/// Yields the words of a dictionary, then continues with a fallback factory.
#[derive(Debug)]
pub struct DictionaryNameFactory {
    words: Vec<String>,
    index: usize,
    fallback: Box<dyn NameFactory>,
}

impl DictionaryNameFactory {
    pub fn new(words: Vec<String>, fallback: Box<dyn NameFactory>) -> Self {
        Self {
            words,
            index: 0,
            fallback,
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl NameFactory for DictionaryNameFactory {
    fn reset(&mut self) {
        self.index = 0;
        self.fallback.reset();
    }

    fn next_name(&mut self) -> String {
        match self.words.get(self.index) {
            Some(word) => {
                self.index += 1;
                word.clone()
            }
            None => self.fallback.next_name(),
        }
    }
}

/// Parameter names `p0`, `p1`, ...
#[derive(Debug, Clone, Default)]
pub struct NumericNameFactory {
    index: usize,
}

impl NumericNameFactory {
    pub const fn new() -> Self {
        Self { index: 0 }
    }
}

impl NameFactory for NumericNameFactory {
    fn reset(&mut self) {
        self.index = 0;
    }

    fn next_name(&mut self) -> String {
        let name = format!("p{}", self.index);
        self.index += 1;
        name
    }
}

/// Splits dictionary text into identifier words.
///
/// `#` starts a comment that runs to the end of the line; any character that cannot
/// be part of a Java identifier separates words. Duplicates and words ending in the
/// special suffix are dropped, and words that do not start like an identifier are
/// skipped.
pub fn parse_dictionary(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for line in text.lines() {
        let content = line.split('#').next().unwrap_or_default();
        for word in content.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$')) {
            let starts_ok = word
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
            if starts_ok && !is_special(word) && !words.iter().any(|w| w == word) {
                words.push(word.to_string());
            }
        }
    }
    words
}

/// Reads a dictionary file.
pub fn read_dictionary(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Dictionary {
        path: path.display().to_string(),
        source,
    })?;
    let words = parse_dictionary(&text);
    tracing::debug!("Read {} words from dictionary {}", words.len(), path.display());
    Ok(words)
}

/// Shuffles dictionary words with a seeded generator.
pub fn shuffle_words(words: &mut [String], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    words.shuffle(&mut rng);
}

/// Recipe for building fresh factories of one kind (members, classes or packages).
#[derive(Debug, Clone, Default)]
pub struct NameSource {
    words: Vec<String>,
    mixed_case: bool,
}

impl NameSource {
    pub const fn simple(mixed_case: bool) -> Self {
        Self {
            words: Vec::new(),
            mixed_case,
        }
    }

    pub fn with_words(mut self, words: Vec<String>) -> Self {
        // Lowercase-only sources must not reintroduce case collisions.
        if !self.mixed_case {
            self.words = words
                .into_iter()
                .filter(|w| !w.chars().any(char::is_uppercase))
                .collect();
        } else {
            self.words = words;
        }
        self
    }

    pub const fn mixed_case(&self) -> bool {
        self.mixed_case
    }

    pub fn factory(&self) -> Box<dyn NameFactory> {
        let simple = Box::new(SimpleNameFactory::new(self.mixed_case));
        if self.words.is_empty() {
            simple
        } else {
            Box::new(DictionaryNameFactory::new(self.words.clone(), simple))
        }
    }

    /// Factory for names disjoint from every name `factory` can produce.
    pub fn special_factory(&self) -> Box<dyn NameFactory> {
        Box::new(SpecialNameFactory::new(Box::new(SimpleNameFactory::new(
            self.mixed_case,
        ))))
    }
}
