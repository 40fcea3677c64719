//! Graph invariant checks and snapshot repair.

use crate::model::person::{Person, PersonId};
use crate::model::relationship::RelationList;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// First invariant violation found in a set of people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    DuplicatePerson(PersonId),
    SelfReference {
        person: PersonId,
        list: RelationList,
    },
    DuplicateEdge {
        person: PersonId,
        related: PersonId,
        list: RelationList,
    },
    DanglingReference {
        person: PersonId,
        related: PersonId,
        list: RelationList,
    },
    MissingMirror {
        person: PersonId,
        related: PersonId,
        list: RelationList,
    },
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePerson(id) => write!(f, "person id appears more than once: {id}"),
            Self::SelfReference { person, list } => {
                write!(f, "person {person} references itself in {}", list.as_str())
            }
            Self::DuplicateEdge {
                person,
                related,
                list,
            } => write!(
                f,
                "person {person} lists {related} more than once in {}",
                list.as_str()
            ),
            Self::DanglingReference {
                person,
                related,
                list,
            } => write!(
                f,
                "person {person} references unknown person {related} in {}",
                list.as_str()
            ),
            Self::MissingMirror {
                person,
                related,
                list,
            } => write!(
                f,
                "person {person} lists {related} in {} but {related} lacks the mirror entry in {}",
                list.as_str(),
                list.mirror().as_str()
            ),
        }
    }
}

impl Error for InvariantViolation {}

/// Counts of repairs applied while normalizing a loaded snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub people: usize,
    pub duplicate_people_dropped: usize,
    pub self_references_dropped: usize,
    pub duplicate_edges_dropped: usize,
    pub dangling_references_dropped: usize,
    pub mirrors_added: usize,
}

impl LoadReport {
    pub fn repairs(&self) -> usize {
        self.duplicate_people_dropped
            + self.self_references_dropped
            + self.duplicate_edges_dropped
            + self.dangling_references_dropped
            + self.mirrors_added
    }

    pub fn is_clean(&self) -> bool {
        self.repairs() == 0
    }
}

/// Returns the first violated invariant, scanning people in order.
pub fn check_invariants(people: &[Person]) -> Result<(), InvariantViolation> {
    let mut index: HashMap<&PersonId, &Person> = HashMap::with_capacity(people.len());
    for person in people {
        if index.insert(&person.id, person).is_some() {
            return Err(InvariantViolation::DuplicatePerson(person.id.clone()));
        }
    }

    for person in people {
        for list in RelationList::ALL {
            let mut seen = HashSet::new();
            for related in person.relation_ids(list) {
                if *related == person.id {
                    return Err(InvariantViolation::SelfReference {
                        person: person.id.clone(),
                        list,
                    });
                }
                if !seen.insert(related) {
                    return Err(InvariantViolation::DuplicateEdge {
                        person: person.id.clone(),
                        related: related.clone(),
                        list,
                    });
                }
                let Some(other) = index.get(related) else {
                    return Err(InvariantViolation::DanglingReference {
                        person: person.id.clone(),
                        related: related.clone(),
                        list,
                    });
                };
                if !other.relation_ids(list.mirror()).contains(&person.id) {
                    return Err(InvariantViolation::MissingMirror {
                        person: person.id.clone(),
                        related: related.clone(),
                        list,
                    });
                }
            }
        }
    }

    Ok(())
}

/// Repairs a raw snapshot in place so that every invariant holds.
///
/// - Duplicate person ids keep the first record.
/// - Self references, duplicate entries and unknown ids are dropped.
/// - Missing mirror entries are added rather than removing the edge.
pub(crate) fn normalize_people(people: Vec<Person>) -> (Vec<Person>, LoadReport) {
    let mut report = LoadReport::default();
    let mut seen_ids: HashSet<PersonId> = HashSet::with_capacity(people.len());
    let mut kept: Vec<Person> = Vec::with_capacity(people.len());
    for person in people {
        if seen_ids.insert(person.id.clone()) {
            kept.push(person);
        } else {
            report.duplicate_people_dropped += 1;
        }
    }

    for person in &mut kept {
        let own_id = person.id.clone();
        for list in RelationList::ALL {
            let mut seen: HashSet<PersonId> = HashSet::new();
            person.relation_ids_mut(list).retain(|related| {
                if *related == own_id {
                    report.self_references_dropped += 1;
                    false
                } else if !seen_ids.contains(related) {
                    report.dangling_references_dropped += 1;
                    false
                } else if !seen.insert(related.clone()) {
                    report.duplicate_edges_dropped += 1;
                    false
                } else {
                    true
                }
            });
        }
    }

    let positions: HashMap<&PersonId, usize> = kept
        .iter()
        .enumerate()
        .map(|(position, person)| (&person.id, position))
        .collect();
    let mut missing: Vec<(usize, RelationList, PersonId)> = Vec::new();
    for person in &kept {
        for list in RelationList::ALL {
            for related in person.relation_ids(list) {
                let Some(&target) = positions.get(related) else {
                    continue;
                };
                if !kept[target].relation_ids(list.mirror()).contains(&person.id) {
                    missing.push((target, list.mirror(), person.id.clone()));
                }
            }
        }
    }
    for (target, list, id) in missing {
        let ids = kept[target].relation_ids_mut(list);
        if !ids.contains(&id) {
            ids.push(id);
            report.mirrors_added += 1;
        }
    }

    report.people = kept.len();
    (kept, report)
}
