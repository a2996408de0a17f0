//! Queue operations.
//!
//! Operations carry the integer codes `-1`, `0` and `1` so that folding two
//! operations on the same object is a clamped sum.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pending index operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
#[repr(i8)]
pub enum Operation {
    /// Remove the object from the index.
    Unindex = -1,
    /// Refresh (some of) the object's indexed attributes.
    Reindex = 0,
    /// Add the object to the index.
    Index = 1,
}

impl Operation {
    /// Returns the integer code of this operation.
    #[must_use]
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Folds `next` into `self` by summing the codes and clamping the result
    /// to `Unindex..=Index`.
    #[must_use]
    pub fn combine(self, next: Self) -> Self {
        match (self.code() + next.code()).clamp(-1, 1) {
            -1 => Self::Unindex,
            0 => Self::Reindex,
            _ => Self::Index,
        }
    }
}

impl TryFrom<i8> for Operation {
    type Error = Error;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(Self::Unindex),
            0 => Ok(Self::Reindex),
            1 => Ok(Self::Index),
            other => Err(Error::InvalidOperationCode(other)),
        }
    }
}

impl From<Operation> for i8 {
    fn from(op: Operation) -> Self {
        op.code()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unindex => write!(f, "unindex"),
            Self::Reindex => write!(f, "reindex"),
            Self::Index => write!(f, "index"),
        }
    }
}
