//! Nested descendant trees for outline-style views.

use crate::layout::exclusion::{collapsed_descendants, effective_collapsed, index_people};
use crate::model::person::{Person, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// One person in a descendant tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: PersonId,
    pub depth: usize,
    /// Collapsed nodes are listed without their children.
    pub collapsed: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

struct FlatNode {
    id: PersonId,
    depth: usize,
    collapsed: bool,
    parent: Option<usize>,
    children: Vec<TreeNode>,
}

/// Builds descendant trees rooted at people without known parents.
///
/// Each visible person appears once, under the first tree that reaches it
/// in depth-first order. People only reachable through a cycle start their
/// own tree, in record order. Descendants of collapsed people are omitted.
pub fn descendant_forest(people: &[Person], collapsed: &BTreeSet<PersonId>) -> Vec<TreeNode> {
    let index = index_people(people);
    let collapsed = effective_collapsed(people, collapsed);
    let hidden = collapsed_descendants(people, &collapsed);

    let candidates: Vec<&Person> = people
        .iter()
        .enumerate()
        .filter(|(position, person)| {
            index.get(&person.id) == Some(position) && !hidden.contains(&person.id)
        })
        .map(|(_, person)| person)
        .collect();

    let parentless = candidates.iter().copied().filter(|person| {
        !person
            .parent_ids
            .iter()
            .any(|parent| *parent != person.id && index.contains_key(parent))
    });
    let roots: Vec<&PersonId> = parentless
        .chain(candidates.iter().copied())
        .map(|person| &person.id)
        .collect();

    let mut visited: HashSet<&PersonId> = HashSet::new();
    let mut flat: Vec<FlatNode> = Vec::new();
    let mut top_level: Vec<usize> = Vec::new();

    for root in roots {
        if visited.contains(root) {
            continue;
        }
        top_level.push(flat.len());
        let mut stack: Vec<(&PersonId, usize, Option<usize>)> = vec![(root, 0, None)];
        while let Some((id, depth, parent)) = stack.pop() {
            if hidden.contains(id) || !visited.insert(id) {
                continue;
            }
            let Some(&position) = index.get(id) else {
                continue;
            };
            let is_collapsed = collapsed.contains(id);
            let slot = flat.len();
            flat.push(FlatNode {
                id: id.clone(),
                depth,
                collapsed: is_collapsed,
                parent,
                children: Vec::new(),
            });
            if !is_collapsed {
                for child in people[position].children_ids.iter().rev() {
                    if !visited.contains(child) {
                        stack.push((child, depth + 1, Some(slot)));
                    }
                }
            }
        }
    }

    // Children always follow their parent in `flat`, so a reverse pass can
    // move every finished subtree into its parent.
    let mut finished: Vec<Option<TreeNode>> = (0..flat.len()).map(|_| None).collect();
    while let Some(node) = flat.pop() {
        let slot = flat.len();
        let mut children = node.children;
        children.reverse();
        let tree = TreeNode {
            id: node.id,
            depth: node.depth,
            collapsed: node.collapsed,
            children,
        };
        match node.parent {
            Some(parent) => flat[parent].children.push(tree),
            None => finished[slot] = Some(tree),
        }
    }

    top_level
        .into_iter()
        .filter_map(|slot| finished[slot].take())
        .collect()
}
