//! Canonical relationship kinds.

use serde::{Deserialize, Serialize};

/// Relationship kind, read as "A is the `kind` of B".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// A is a parent of B.
    Parent,
    /// A and B are partners (undirected).
    Spouse,
    /// A is a child of B.
    Child,
}

impl RelationshipKind {
    /// Normalizes a UI label into a canonical kind.
    ///
    /// Directional labels used by graph editors (`parent-child`,
    /// `child-parent`) map onto the source's role, so `child-parent` between
    /// source and target means the source is the child.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "parent" | "parent-child" | "parent_child" => Some(Self::Parent),
            "child" | "child-parent" | "child_parent" => Some(Self::Child),
            "spouse" | "partner" => Some(Self::Spouse),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Spouse => "spouse",
            Self::Child => "child",
        }
    }
}

/// One of the three relationship lists carried by a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationList {
    Parents,
    Spouses,
    Children,
}

impl RelationList {
    pub const ALL: [Self; 3] = [Self::Parents, Self::Spouses, Self::Children];

    /// List on the other person that must mirror an entry in this list.
    pub fn mirror(self) -> Self {
        match self {
            Self::Parents => Self::Children,
            Self::Children => Self::Parents,
            Self::Spouses => Self::Spouses,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parents => "parent_ids",
            Self::Spouses => "spouse_ids",
            Self::Children => "children_ids",
        }
    }
}
