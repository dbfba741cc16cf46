use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::normalize_id;

/// A relational fact between two complexity classes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Theorem {
    /// `small` is contained in `large`.
    Containment { small: String, large: String },
    /// `a` and `b` are the same class.
    Equality { a: String, b: String },
}

impl Theorem {
    pub fn containment(small: impl Into<String>, large: impl Into<String>) -> Self {
        Self::Containment {
            small: small.into(),
            large: large.into(),
        }
    }

    pub fn equality(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::Equality {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Containment { .. } => "containment",
            Self::Equality { .. } => "equality",
        }
    }

    pub fn normalized(&self) -> Self {
        match self {
            Self::Containment { small, large } => Self::Containment {
                small: normalize_id(small),
                large: normalize_id(large),
            },
            Self::Equality { a, b } => Self::Equality {
                a: normalize_id(a),
                b: normalize_id(b),
            },
        }
    }
}

/// Reasons a single class or theorem record is rejected during loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("class record has an empty id")]
    EmptyId,

    #[error("unknown class '{id}'")]
    UnknownClass { id: String },

    #[error("class '{id}' cannot be related to itself")]
    SelfRelation { id: String },

    #[error("containment {small} ⊆ {large} contradicts an existing chain {large} ⊆ … ⊆ {small}")]
    ContainmentCycle { small: String, large: String },
}
