//! Generation assignment and grid placement.

use crate::config::LayoutConfig;
use crate::layout::exclusion::{collapsed_descendants, effective_collapsed, index_people};
use crate::layout::{EdgeKind, FamilyLayout, LayoutEdge, LayoutRequest, NodePlacement};
use crate::model::person::{Person, PersonId};
use crate::model::relationship::RelationList;
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Generation offset applied when following each relationship list.
const GENERATION_STEPS: [(RelationList, i32); 3] = [
    (RelationList::Children, 1),
    (RelationList::Parents, -1),
    (RelationList::Spouses, 0),
];

/// Computes node positions and edges for the visible part of `people`.
///
/// Steps:
/// 1. hide descendants of collapsed people;
/// 2. pick roots (visible focus, else parentless people with relationships,
///    else the first visible person);
/// 3. breadth-first generation search from each root;
/// 4. center each generation row, rows stacked top to bottom;
/// 5. place unreached people one per row below the deepest row;
/// 6. emit descent edges, then spousal edges once per pair.
pub fn compute_layout(
    people: &[Person],
    request: &LayoutRequest,
    config: &LayoutConfig,
) -> FamilyLayout {
    let index = index_people(people);
    let collapsed = effective_collapsed(people, &request.collapsed);
    let hidden = collapsed_descendants(people, &collapsed);

    // Later records reusing an id are shadowed by the first one.
    let visible: Vec<&Person> = people
        .iter()
        .enumerate()
        .filter(|(position, person)| {
            index.get(&person.id) == Some(position) && !hidden.contains(&person.id)
        })
        .map(|(_, person)| person)
        .collect();
    let visible_ids: HashSet<&PersonId> = visible.iter().map(|person| &person.id).collect();

    let roots = select_roots(&visible, &visible_ids, request.focus.as_ref());
    let generations = assign_generations(people, &index, &visible_ids, &roots);

    let mut rows: BTreeMap<i32, Vec<&PersonId>> = BTreeMap::new();
    let mut orphans = Vec::new();
    for person in &visible {
        match generations.get(&person.id) {
            Some(generation) => rows.entry(*generation).or_default().push(&person.id),
            None => orphans.push(&person.id),
        }
    }

    let mut placements: HashMap<&PersonId, NodePlacement> = HashMap::with_capacity(visible.len());
    for (row, (generation, members)) in rows.iter().enumerate() {
        let center = (members.len() as f64 - 1.0) / 2.0;
        for (slot, id) in members.iter().enumerate() {
            placements.insert(
                *id,
                NodePlacement {
                    id: (*id).clone(),
                    generation: *generation,
                    x: (slot as f64 - center) * config.horizontal_spacing,
                    y: row as f64 * config.row_height,
                },
            );
        }
    }
    for (offset, id) in orphans.iter().enumerate() {
        placements.insert(
            *id,
            NodePlacement {
                id: (*id).clone(),
                generation: 0,
                x: 0.0,
                y: (rows.len() + offset) as f64 * config.row_height,
            },
        );
    }

    let nodes: Vec<NodePlacement> = visible
        .iter()
        .filter_map(|person| placements.remove(&person.id))
        .collect();
    let edges = build_edges(&visible, &visible_ids);

    debug!(
        "event=layout_compute module=layout status=ok people={} nodes={} edges={} rows={} orphans={} hidden={}",
        people.len(),
        nodes.len(),
        edges.len(),
        rows.len(),
        orphans.len(),
        hidden.len()
    );

    FamilyLayout { nodes, edges }
}

fn select_roots<'a>(
    visible: &[&'a Person],
    visible_ids: &HashSet<&PersonId>,
    focus: Option<&'a PersonId>,
) -> Vec<&'a PersonId> {
    if let Some(focus) = focus.filter(|id| visible_ids.contains(*id)) {
        return vec![focus];
    }

    let roots: Vec<&PersonId> = visible
        .iter()
        .copied()
        .filter(|person| {
            let has_parent = person
                .parent_ids
                .iter()
                .any(|parent| visible_ids.contains(parent));
            let has_relationship = RelationList::ALL.iter().any(|list| {
                person
                    .relation_ids(*list)
                    .iter()
                    .any(|related| *related != person.id && visible_ids.contains(related))
            });
            !has_parent && has_relationship
        })
        .map(|person| &person.id)
        .collect();

    if roots.is_empty() {
        visible
            .first()
            .copied()
            .map(|person| vec![&person.id])
            .unwrap_or_default()
    } else {
        roots
    }
}

// Each person is expanded once; a later, strictly smaller candidate only
// lowers the stored generation.
fn assign_generations<'a>(
    people: &'a [Person],
    index: &HashMap<&PersonId, usize>,
    visible_ids: &HashSet<&PersonId>,
    roots: &[&'a PersonId],
) -> HashMap<&'a PersonId, i32> {
    let mut generations: HashMap<&PersonId, i32> = HashMap::new();
    let mut expanded: HashSet<&PersonId> = HashSet::new();
    let mut queue: VecDeque<&PersonId> = VecDeque::new();

    for &root in roots {
        if generations.contains_key(root) {
            continue;
        }
        generations.insert(root, 0);
        queue.push_back(root);

        while let Some(id) = queue.pop_front() {
            if !expanded.insert(id) {
                continue;
            }
            let (Some(&generation), Some(&position)) = (generations.get(id), index.get(id))
            else {
                continue;
            };
            let person = &people[position];

            for (list, step) in GENERATION_STEPS {
                for related in person.relation_ids(list) {
                    if !visible_ids.contains(related) {
                        continue;
                    }
                    let candidate = generation + step;
                    match generations.entry(related) {
                        Entry::Vacant(entry) => {
                            entry.insert(candidate);
                            queue.push_back(related);
                        }
                        Entry::Occupied(mut entry) => {
                            if candidate < *entry.get() {
                                entry.insert(candidate);
                            }
                        }
                    }
                }
            }
        }
    }
    generations
}

fn build_edges(visible: &[&Person], visible_ids: &HashSet<&PersonId>) -> Vec<LayoutEdge> {
    let mut edges = Vec::new();
    for person in visible {
        let mut seen: HashSet<&PersonId> = HashSet::new();
        for child in &person.children_ids {
            if *child != person.id && visible_ids.contains(child) && seen.insert(child) {
                edges.push(LayoutEdge {
                    source: person.id.clone(),
                    target: child.clone(),
                    kind: EdgeKind::Descent,
                });
            }
        }
        seen.clear();
        for spouse in &person.spouse_ids {
            if person.id < *spouse && visible_ids.contains(spouse) && seen.insert(spouse) {
                edges.push(LayoutEdge {
                    source: person.id.clone(),
                    target: spouse.clone(),
                    kind: EdgeKind::Spousal,
                });
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::{assign_generations, compute_layout, select_roots};
    use crate::config::LayoutConfig;
    use crate::layout::exclusion::index_people;
    use crate::layout::{EdgeKind, LayoutRequest};
    use crate::model::person::{Person, PersonDraft, PersonId};
    use std::collections::HashSet;

    fn person(name: &str) -> Person {
        Person::new(PersonDraft::new(name, "Test"))
    }

    fn link_parent(people: &mut [Person], parent: usize, child: usize) {
        let (parent_id, child_id) = (people[parent].id.clone(), people[child].id.clone());
        people[parent].children_ids.push(child_id);
        people[child].parent_ids.push(parent_id);
    }

    fn ids(people: &[Person]) -> HashSet<&PersonId> {
        people.iter().map(|person| &person.id).collect()
    }

    #[test]
    fn roots_prefer_visible_focus() {
        let mut people = vec![person("A"), person("B")];
        link_parent(&mut people, 0, 1);
        let visible: Vec<&Person> = people.iter().collect();

        let roots = select_roots(&visible, &ids(&people), Some(&people[1].id));
        assert_eq!(roots, vec![&people[1].id]);

        let stranger = PersonId::from("stranger");
        let roots = select_roots(&visible, &ids(&people), Some(&stranger));
        assert_eq!(roots, vec![&people[0].id]);
    }

    #[test]
    fn roots_fall_back_to_first_person() {
        let people = vec![person("Solo"), person("Other")];
        let visible: Vec<&Person> = people.iter().collect();
        assert_eq!(select_roots(&visible, &ids(&people), None), vec![&people[0].id]);
    }

    #[test]
    fn generation_search_terminates_on_ancestry_cycle() {
        let mut people = vec![person("A"), person("B"), person("C")];
        link_parent(&mut people, 0, 1);
        link_parent(&mut people, 1, 2);
        link_parent(&mut people, 2, 0);

        let index = index_people(&people);
        let generations = assign_generations(&people, &index, &ids(&people), &[&people[0].id]);
        assert_eq!(generations.len(), 3);
        assert_eq!(generations[&people[0].id], 0);
        // C is discovered as A's parent.
        assert_eq!(generations[&people[2].id], -1);
    }

    #[test]
    fn second_parent_shares_the_parent_row() {
        let mut people = vec![person("Mother"), person("Child"), person("Father")];
        link_parent(&mut people, 0, 1);
        link_parent(&mut people, 2, 1);

        let layout = compute_layout(&people, &LayoutRequest::default(), &LayoutConfig::default());
        let mother = layout.node(&people[0].id).unwrap();
        let father = layout.node(&people[2].id).unwrap();
        let child = layout.node(&people[1].id).unwrap();
        assert_eq!(mother.generation, 0);
        assert_eq!(father.generation, 0);
        assert_eq!(child.generation, 1);
        assert_eq!(mother.x, -130.0);
        assert_eq!(father.x, 130.0);
        assert_eq!(child.y, 180.0);
        assert_eq!(layout.edges_of_kind(EdgeKind::Descent).count(), 2);
    }

    #[test]
    fn self_links_and_dangling_ids_do_not_break_layout() {
        let mut people = vec![person("Loop")];
        let id = people[0].id.clone();
        people[0].children_ids.push(id.clone());
        people[0].spouse_ids.push(id);
        people[0].parent_ids.push(PersonId::from("missing"));

        let layout = compute_layout(&people, &LayoutRequest::default(), &LayoutConfig::default());
        assert_eq!(layout.nodes.len(), 1);
        assert!(layout.edges.is_empty());
    }
}
