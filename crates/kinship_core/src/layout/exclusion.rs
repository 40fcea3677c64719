//! Collapsed-subtree visibility.

use crate::model::person::{Person, PersonId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Maps each id to the position of its first record.
pub(crate) fn index_people(people: &[Person]) -> HashMap<&PersonId, usize> {
    let mut index = HashMap::with_capacity(people.len());
    for (position, person) in people.iter().enumerate() {
        index.entry(&person.id).or_insert(position);
    }
    index
}

/// Union of the requested set and every person flagged collapsed.
pub fn effective_collapsed(people: &[Person], requested: &BTreeSet<PersonId>) -> BTreeSet<PersonId> {
    let mut collapsed = requested.clone();
    collapsed.extend(
        people
            .iter()
            .filter(|person| person.is_collapsed())
            .map(|person| person.id.clone()),
    );
    collapsed
}

/// Transitive descendants of every collapsed person.
///
/// A collapsed person is never hidden by its own flag, even when a cycle
/// leads back to it, but another collapsed ancestor can still hide it.
/// Ids without a record are ignored.
pub fn collapsed_descendants<'a>(
    people: &'a [Person],
    collapsed: &BTreeSet<PersonId>,
) -> HashSet<&'a PersonId> {
    let index = index_people(people);
    let mut hidden = HashSet::new();

    for root in collapsed {
        let Some(&position) = index.get(root) else {
            continue;
        };
        let root = &people[position].id;
        let mut visited = HashSet::from([root]);
        let mut stack: Vec<&PersonId> = people[position].children_ids.iter().collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(&child_position) = index.get(id) else {
                continue;
            };
            hidden.insert(id);
            stack.extend(people[child_position].children_ids.iter());
        }
    }
    hidden
}
