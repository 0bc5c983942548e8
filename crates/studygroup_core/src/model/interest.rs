//! User interest tags.
//!
//! # Invariants
//! - Tags are trimmed and never empty.
//! - Equality is case-sensitive; `"Chess"` and `"chess"` are distinct tags.
//! - Order is irrelevant; duplicates collapse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

static TAG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid tag separator regex"));

/// Unordered set of interest tags declared by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestSet(BTreeSet<String>);

impl InterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from individual tags, dropping blank values.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .filter_map(|tag| {
                let trimmed = tag.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect();
        Self(tags)
    }

    /// Parses free-text, comma-separated interests such as `"chess, hiking"`.
    pub fn parse(raw: &str) -> Self {
        Self::from_tags(TAG_SEPARATOR_RE.split(raw.trim()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns whether the two sets share at least one tag.
    pub fn overlaps(&self, other: &InterestSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }
}

impl<S: AsRef<str>> FromIterator<S> for InterestSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_tags(iter)
    }
}
