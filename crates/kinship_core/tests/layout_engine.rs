use kinship_core::model::relationship::RelationshipKind;
use kinship_core::{
    compute_layout, EdgeKind, FamilyLayout, FamilyStore, LayoutConfig, LayoutEdge, LayoutRequest,
    PersonDraft, PersonId,
};
use std::collections::{BTreeSet, HashSet};

#[test]
fn parent_and_child_take_consecutive_generations() {
    let mut store = FamilyStore::new();
    let alice = add(&mut store, "Alice");
    let bob = add(&mut store, "Bob");
    store
        .add_relationship(&alice, &bob, RelationshipKind::Parent)
        .unwrap();

    let layout = layout(&store);

    assert_eq!(layout.node(&alice).unwrap().generation, 0);
    assert_eq!(layout.node(&bob).unwrap().generation, 1);
    assert_eq!(
        layout.edges,
        vec![LayoutEdge {
            source: alice,
            target: bob,
            kind: EdgeKind::Descent,
        }]
    );
}

#[test]
fn spouses_share_a_row_with_one_edge() {
    let mut store = FamilyStore::new();
    let carol = add(&mut store, "Carol");
    let dave = add(&mut store, "Dave");
    store
        .add_relationship(&carol, &dave, RelationshipKind::Spouse)
        .unwrap();

    let layout = layout(&store);

    assert_eq!(layout.edges.len(), 1);
    assert_eq!(layout.edges[0].kind, EdgeKind::Spousal);
    let (carol_node, dave_node) = (layout.node(&carol).unwrap(), layout.node(&dave).unwrap());
    assert_eq!(carol_node.generation, dave_node.generation);
    assert_eq!(carol_node.y, dave_node.y);
    assert_eq!(carol_node.x, -130.0);
    assert_eq!(dave_node.x, 130.0);
}

#[test]
fn deleting_middle_of_chain_leaves_separate_rows() {
    let mut store = FamilyStore::new();
    let a = add(&mut store, "A");
    let b = add(&mut store, "B");
    let c = add(&mut store, "C");
    store.add_relationship(&a, &b, RelationshipKind::Parent).unwrap();
    store.add_relationship(&b, &c, RelationshipKind::Parent).unwrap();

    store.delete_person(&b).unwrap();
    let layout = layout(&store);

    assert_eq!(layout.nodes.len(), 2);
    assert!(layout.edges.is_empty());
    let (a_node, c_node) = (layout.node(&a).unwrap(), layout.node(&c).unwrap());
    assert_ne!(a_node.y, c_node.y);
    assert_eq!(c_node.generation, 0);
}

#[test]
fn layout_is_deterministic() {
    let store = sample_family();
    let request = LayoutRequest::default();
    let config = LayoutConfig::default();

    let first = compute_layout(store.people(), &request, &config);
    let second = compute_layout(store.people(), &request, &config);

    assert_eq!(first, second);
}

#[test]
fn every_person_is_placed_once_despite_cycles_and_islands() {
    let mut store = sample_family();
    let x = add(&mut store, "Loop X");
    let y = add(&mut store, "Loop Y");
    store.add_relationship(&x, &y, RelationshipKind::Parent).unwrap();
    store.add_relationship(&y, &x, RelationshipKind::Parent).unwrap();
    add(&mut store, "Island");

    let layout = layout(&store);

    let placed: Vec<PersonId> = layout.nodes.iter().map(|node| node.id.clone()).collect();
    let expected: Vec<PersonId> = store
        .people()
        .iter()
        .map(|person| person.id.clone())
        .collect();
    assert_eq!(placed, expected);
    let unique: HashSet<&PersonId> = placed.iter().collect();
    assert_eq!(unique.len(), placed.len());
}

#[test]
fn collapsing_hides_descendants_but_keeps_person() {
    let mut store = FamilyStore::new();
    let root = add(&mut store, "Root");
    let child = add(&mut store, "Child");
    let grandchild = add(&mut store, "Grandchild");
    store
        .add_relationship(&root, &child, RelationshipKind::Parent)
        .unwrap();
    store
        .add_relationship(&child, &grandchild, RelationshipKind::Parent)
        .unwrap();
    store.set_collapsed(&child, true).unwrap();

    let layout = layout(&store);

    assert!(layout.contains(&root));
    assert!(layout.contains(&child));
    assert!(!layout.contains(&grandchild));
    assert!(layout
        .edges
        .iter()
        .all(|edge| edge.source != grandchild && edge.target != grandchild));
}

#[test]
fn request_collapse_set_applies_without_touching_records() {
    let mut store = FamilyStore::new();
    let root = add(&mut store, "Root");
    let child = add(&mut store, "Child");
    store
        .add_relationship(&root, &child, RelationshipKind::Parent)
        .unwrap();

    let request = LayoutRequest {
        focus: None,
        collapsed: BTreeSet::from([root.clone()]),
    };
    let layout = compute_layout(store.people(), &request, &LayoutConfig::default());

    assert_eq!(layout.nodes.len(), 1);
    assert!(!store.get_person(&root).unwrap().is_collapsed());
}

#[test]
fn focus_becomes_generation_zero() {
    let mut store = FamilyStore::new();
    let parent = add(&mut store, "Parent");
    let child = add(&mut store, "Child");
    store
        .add_relationship(&parent, &child, RelationshipKind::Parent)
        .unwrap();

    let layout = compute_layout(
        store.people(),
        &LayoutRequest::focused(child.clone()),
        &LayoutConfig::default(),
    );

    assert_eq!(layout.node(&child).unwrap().generation, 0);
    assert_eq!(layout.node(&parent).unwrap().generation, -1);
    assert_eq!(layout.node(&parent).unwrap().y, 0.0);
    assert_eq!(layout.node(&child).unwrap().y, 180.0);
}

#[test]
fn configured_geometry_scales_positions() {
    let store = sample_family();
    let config = LayoutConfig {
        horizontal_spacing: 100.0,
        row_height: 50.0,
    };

    let layout = compute_layout(store.people(), &LayoutRequest::default(), &config);
    let bounds = layout.bounds().unwrap();

    assert_eq!(bounds.min_y, 0.0);
    assert_eq!(bounds.max_y, 50.0);
    assert_eq!(bounds.min_x, -50.0);
    assert_eq!(bounds.max_x, 50.0);
}

#[test]
fn layout_serializes_for_renderers() {
    let mut store = FamilyStore::new();
    let alice = add(&mut store, "Alice");
    let bob = add(&mut store, "Bob");
    store
        .add_relationship(&alice, &bob, RelationshipKind::Parent)
        .unwrap();

    let value = serde_json::to_value(layout(&store)).unwrap();

    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(value["edges"][0]["kind"], "descent");
    assert_eq!(value["edges"][0]["source"], alice.to_string());
}

#[test]
fn empty_store_yields_empty_layout() {
    let layout = layout(&FamilyStore::new());
    assert_eq!(layout, FamilyLayout::default());
}

// Married parents with two children: two rows of two.
fn sample_family() -> FamilyStore {
    let mut store = FamilyStore::new();
    let mother = add(&mut store, "Mother");
    let father = add(&mut store, "Father");
    let son = add(&mut store, "Son");
    let daughter = add(&mut store, "Daughter");
    store
        .add_relationship(&mother, &father, RelationshipKind::Spouse)
        .unwrap();
    for child in [son, daughter] {
        store
            .add_relationship(&mother, &child, RelationshipKind::Parent)
            .unwrap();
        store
            .add_relationship(&father, &child, RelationshipKind::Parent)
            .unwrap();
    }
    store
}

fn layout(store: &FamilyStore) -> FamilyLayout {
    compute_layout(
        store.people(),
        &LayoutRequest::default(),
        &LayoutConfig::default(),
    )
}

fn add(store: &mut FamilyStore, first_name: &str) -> PersonId {
    store.add_person(PersonDraft::new(first_name, "Layout")).id.clone()
}
