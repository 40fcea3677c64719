//! Tree layout for the family graph.
//!
//! # Responsibility
//! - Assign generations and 2D coordinates to every visible person.
//! - Emit descent and spousal edges between visible people.
//! - Project nested descendant trees for list-style views.
//!
//! # Invariants
//! - Pure functions over a `&[Person]` snapshot: same input, same output.
//! - Every visible person appears exactly once, including people in
//!   cycles and disconnected components.
//! - Malformed graphs (dangling ids, cycles, self-links) never panic.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

mod engine;
mod exclusion;
mod forest;

pub use engine::compute_layout;
pub use exclusion::{collapsed_descendants, effective_collapsed};
pub use forest::{descendant_forest, TreeNode};

/// Per-call layout inputs that are not part of the person records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutRequest {
    /// Sole root of the generation search when present and visible.
    pub focus: Option<PersonId>,
    /// Extra collapsed people, merged with the per-person `ui.collapsed` flags.
    pub collapsed: BTreeSet<PersonId>,
}

impl LayoutRequest {
    pub fn focused(focus: PersonId) -> Self {
        Self {
            focus: Some(focus),
            collapsed: BTreeSet::new(),
        }
    }
}

/// Position of one person on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePlacement {
    pub id: PersonId,
    pub generation: i32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Parent (`source`) to child (`target`).
    Descent,
    /// Between spouses; `source` sorts before `target`.
    Spousal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: PersonId,
    pub target: PersonId,
    pub kind: EdgeKind,
}

/// Axis-aligned extent of all node positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl LayoutBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Renderer-facing layout result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyLayout {
    /// Visible people in record order.
    pub nodes: Vec<NodePlacement>,
    pub edges: Vec<LayoutEdge>,
}

impl FamilyLayout {
    pub fn node(&self, id: &PersonId) -> Option<&NodePlacement> {
        self.nodes.iter().find(|node| node.id == *id)
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.node(id).is_some()
    }

    /// Extent used to fit the viewport; `None` for an empty layout.
    pub fn bounds(&self) -> Option<LayoutBounds> {
        let first = self.nodes.first()?;
        let initial = LayoutBounds {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        Some(self.nodes.iter().fold(initial, |bounds, node| LayoutBounds {
            min_x: bounds.min_x.min(node.x),
            max_x: bounds.max_x.max(node.x),
            min_y: bounds.min_y.min(node.y),
            max_y: bounds.max_y.max(node.y),
        }))
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &LayoutEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }
}
