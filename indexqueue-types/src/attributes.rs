//! Attribute selections for index and reindex operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The attributes an operation touches.
///
/// `All` is absorbing: merging anything with `All` yields `All`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeSet {
    /// Every indexed attribute of the object.
    #[default]
    All,
    /// Only the named attributes.
    Only(BTreeSet<String>),
}

impl AttributeSet {
    /// Creates a set restricted to the given attribute names.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Returns true if this is the "all attributes" selection.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns true if `name` is selected.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }

    /// Returns the explicit names, or `None` for `All`.
    #[must_use]
    pub fn names(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::All => None,
            Self::Only(names) => Some(names),
        }
    }

    /// Merges `other` into this selection: `All` wins, otherwise the union.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::Only(mine), Self::Only(theirs)) => mine.extend(theirs.iter().cloned()),
            _ => *self = Self::All,
        }
    }

    /// Returns the merge of this selection and `other`.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }
}

impl From<Option<Vec<String>>> for AttributeSet {
    fn from(names: Option<Vec<String>>) -> Self {
        match names {
            None => Self::All,
            Some(names) => Self::only(names),
        }
    }
}
