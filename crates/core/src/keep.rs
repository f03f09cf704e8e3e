//! Keep rules in predicate form.
//!
//! The configuration parser that turns `-keep` options into rules is an external
//! collaborator. The engine only needs the [`SymbolFilter`] seam; [`KeepRule`] is the
//! serde-friendly implementation used by the CLI and tests.

use crate::descriptor::external_class_name;
use crate::hierarchy::Hierarchy;
use crate::model::{ClassId, ClassPool, Member, MemberKind, TypeLink};
use obscura_utils::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Decides which symbols must keep their original names.
pub trait SymbolFilter {
    /// Whether the class name must be kept.
    fn keeps_class(&self, pool: &ClassPool, hierarchy: &Hierarchy, class: ClassId) -> bool;
    /// Whether the member name must be kept.
    fn keeps_member(
        &self,
        pool: &ClassPool,
        hierarchy: &Hierarchy,
        class: ClassId,
        member: &Member,
    ) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Char(char),
    /// `?`: one character other than the separator.
    One,
    /// `*`: any run of characters without the separator.
    Star,
    /// `**`: any run of characters.
    Any,
}

/// A ProGuard-style name glob.
///
/// `?` matches one character, `*` any characters except `.`, `**` any characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamePattern {
    source: String,
    tokens: Vec<Token>,
}

impl NamePattern {
    pub fn new(source: &str) -> Result<Self, ConfigError> {
        if source.is_empty() || source.contains("***") {
            return Err(ConfigError::InvalidPattern(source.to_string()));
        }
        let mut tokens = Vec::new();
        let mut chars = source.chars().peekable();
        while let Some(ch) = chars.next() {
            tokens.push(match ch {
                '?' => Token::One,
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    Token::Any
                }
                '*' => Token::Star,
                other => Token::Char(other),
            });
        }
        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, name: &str) -> bool {
        let chars: Vec<char> = name.chars().collect();
        Self::match_from(&self.tokens, &chars)
    }

    fn match_from(tokens: &[Token], name: &[char]) -> bool {
        match tokens.split_first() {
            None => name.is_empty(),
            Some((Token::Char(c), rest)) => {
                name.first() == Some(c) && Self::match_from(rest, &name[1..])
            }
            Some((Token::One, rest)) => {
                matches!(name.first(), Some(&c) if c != '.') && Self::match_from(rest, &name[1..])
            }
            Some((Token::Star, rest)) => {
                let limit = name.iter().position(|&c| c == '.').unwrap_or(name.len());
                (0..=limit).any(|skip| Self::match_from(rest, &name[skip..]))
            }
            Some((Token::Any, rest)) => {
                (0..=name.len()).any(|skip| Self::match_from(rest, &name[skip..]))
            }
        }
    }
}

impl TryFrom<String> for NamePattern {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<NamePattern> for String {
    fn from(pattern: NamePattern) -> Self {
        pattern.source
    }
}

/// A member specification of a keep rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRule {
    /// Restricts the rule to fields or methods.
    #[serde(default)]
    pub kind: Option<MemberKind>,
    pub name: NamePattern,
    /// Exact internal descriptor to match, if any.
    #[serde(default)]
    pub descriptor: Option<String>,
}

impl MemberRule {
    pub fn matches(&self, member: &Member) -> bool {
        self.kind.is_none_or(|kind| kind == member.kind)
            && self.name.matches(&member.name)
            && self
                .descriptor
                .as_deref()
                .is_none_or(|d| d == member.descriptor)
    }
}

/// A compiled keep rule.
///
/// The rule selects classes by external name and optionally by a supertype. Unless
/// `members_only` is set, selected classes keep their names; the listed member rules
/// keep matching members of selected classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepRule {
    pub class: NamePattern,
    #[serde(default)]
    pub extends: Option<NamePattern>,
    #[serde(default)]
    pub members: Vec<MemberRule>,
    #[serde(default)]
    pub members_only: bool,
}

impl KeepRule {
    pub fn class(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            class: NamePattern::new(pattern)?,
            extends: None,
            members: Vec::new(),
            members_only: false,
        })
    }

    pub fn with_member(
        mut self,
        kind: Option<MemberKind>,
        name: &str,
        descriptor: Option<&str>,
    ) -> Result<Self, ConfigError> {
        self.members.push(MemberRule {
            kind,
            name: NamePattern::new(name)?,
            descriptor: descriptor.map(str::to_string),
        });
        Ok(self)
    }

    pub fn members_only(mut self) -> Self {
        self.members_only = true;
        self
    }

    fn selects(&self, pool: &ClassPool, hierarchy: &Hierarchy, class: ClassId) -> bool {
        if !self.class.matches(&external_class_name(&pool.get(class).name)) {
            return false;
        }
        let Some(extends) = &self.extends else {
            return true;
        };
        hierarchy.ancestors(class).into_iter().any(|ancestor| {
            extends.matches(&external_class_name(&pool.get(ancestor).name))
        }) || hierarchy
            .ancestors_inclusive(class)
            .into_iter()
            .flat_map(|c| pool.get(c).supertypes())
            .any(|link| match link {
                TypeLink::External(name) => extends.matches(&external_class_name(name)),
                TypeLink::Resolved(_) => false,
            })
    }
}

impl SymbolFilter for KeepRule {
    fn keeps_class(&self, pool: &ClassPool, hierarchy: &Hierarchy, class: ClassId) -> bool {
        !self.members_only && self.selects(pool, hierarchy, class)
    }

    fn keeps_member(
        &self,
        pool: &ClassPool,
        hierarchy: &Hierarchy,
        class: ClassId,
        member: &Member,
    ) -> bool {
        self.members.iter().any(|rule| rule.matches(member)) && self.selects(pool, hierarchy, class)
    }
}
