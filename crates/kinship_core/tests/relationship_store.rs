use kinship_core::model::relationship::RelationshipKind;
use kinship_core::{EdgeChange, FamilyStore, PersonDraft, PersonId, PersonPatch, StoreError};

#[test]
fn parent_edge_is_written_on_both_sides() {
    let mut store = FamilyStore::new();
    let alice = add(&mut store, "Alice");
    let bob = add(&mut store, "Bob");

    let change = store
        .add_relationship(&alice, &bob, RelationshipKind::Parent)
        .unwrap();

    assert_eq!(change, EdgeChange::Added);
    assert_eq!(store.get_person(&alice).unwrap().children_ids, vec![bob.clone()]);
    assert_eq!(store.get_person(&bob).unwrap().parent_ids, vec![alice]);
    store.check_invariants().unwrap();
}

#[test]
fn spouse_edge_is_mutual() {
    let mut store = FamilyStore::new();
    let carol = add(&mut store, "Carol");
    let dave = add(&mut store, "Dave");

    store
        .add_relationship(&carol, &dave, RelationshipKind::Spouse)
        .unwrap();

    assert_eq!(store.get_person(&carol).unwrap().spouse_ids, vec![dave.clone()]);
    assert_eq!(store.get_person(&dave).unwrap().spouse_ids, vec![carol]);
}

#[test]
fn repeated_add_relationship_is_idempotent() {
    let mut store = FamilyStore::new();
    let parent = add(&mut store, "Parent");
    let child = add(&mut store, "Child");

    store
        .add_relationship(&parent, &child, RelationshipKind::Parent)
        .unwrap();
    let before = store.people().to_vec();
    let change = store
        .add_relationship(&parent, &child, RelationshipKind::Parent)
        .unwrap();

    assert_eq!(change, EdgeChange::AlreadyPresent);
    assert_eq!(store.people(), before.as_slice());
}

#[test]
fn self_relationship_is_rejected_without_changes() {
    let mut store = FamilyStore::new();
    let solo = add(&mut store, "Solo");

    for kind in [
        RelationshipKind::Parent,
        RelationshipKind::Spouse,
        RelationshipKind::Child,
    ] {
        let err = store.add_relationship(&solo, &solo, kind).unwrap_err();
        assert_eq!(err, StoreError::InvalidEdge(solo.clone()));
    }
    assert!(!store.get_person(&solo).unwrap().has_relationships());
}

#[test]
fn relationship_with_unknown_person_is_a_no_op() {
    let mut store = FamilyStore::new();
    let known = add(&mut store, "Known");
    let ghost = PersonId::from("ghost");

    let err = store
        .add_relationship(&known, &ghost, RelationshipKind::Parent)
        .unwrap_err();

    assert_eq!(err, StoreError::NotFound(ghost));
    assert!(!store.get_person(&known).unwrap().has_relationships());
}

#[test]
fn remove_relationship_strips_every_kind_from_both_sides() {
    let mut store = FamilyStore::new();
    let a = add(&mut store, "A");
    let b = add(&mut store, "B");
    store.add_relationship(&a, &b, RelationshipKind::Parent).unwrap();
    store.add_relationship(&a, &b, RelationshipKind::Spouse).unwrap();

    assert!(store.remove_relationship(&b, &a).unwrap());
    assert!(!store.get_person(&a).unwrap().has_relationships());
    assert!(!store.get_person(&b).unwrap().has_relationships());
    assert!(!store.remove_relationship(&a, &b).unwrap());
}

#[test]
fn delete_cascades_and_hides_person() {
    let mut store = FamilyStore::new();
    let a = add(&mut store, "A");
    let b = add(&mut store, "B");
    let c = add(&mut store, "C");
    store.add_relationship(&a, &b, RelationshipKind::Parent).unwrap();
    store.add_relationship(&b, &c, RelationshipKind::Parent).unwrap();

    let removed = store.delete_person(&b).unwrap();

    assert_eq!(removed.id, b);
    assert!(store.get_person(&b).is_none());
    assert!(store.get_person(&a).unwrap().children_ids.is_empty());
    assert!(store.get_person(&c).unwrap().parent_ids.is_empty());
    store.check_invariants().unwrap();
    assert_eq!(
        store.delete_person(&b).unwrap_err(),
        StoreError::NotFound(b.clone())
    );
}

#[test]
fn update_person_cannot_touch_relationships() {
    let mut store = FamilyStore::new();
    let a = add(&mut store, "A");
    let b = add(&mut store, "B");
    store.add_relationship(&a, &b, RelationshipKind::Spouse).unwrap();

    let patch = PersonPatch {
        first_name: Some("Renamed".to_string()),
        notes: Some(Some("moved abroad".to_string())),
        ..PersonPatch::default()
    };
    let updated = store.update_person(&a, &patch).unwrap();

    assert_eq!(updated.first_name, "Renamed");
    assert_eq!(updated.notes.as_deref(), Some("moved abroad"));
    assert_eq!(updated.spouse_ids, vec![b]);
}

#[test]
fn search_is_case_insensitive_and_ordered() {
    let mut store = FamilyStore::new();
    let anna = add(&mut store, "Anna");
    add(&mut store, "Bert");
    let hannah = add(&mut store, "Hannah");

    let hits: Vec<PersonId> = store
        .search_people("ANN")
        .into_iter()
        .map(|person| person.id.clone())
        .collect();

    assert_eq!(hits, vec![anna, hannah]);
    assert_eq!(store.search_people("  ").len(), 3);
    assert!(store.search_people("zzz").is_empty());
}

#[test]
fn search_matches_full_name() {
    let mut store = FamilyStore::new();
    let id = store
        .add_person(PersonDraft::new("Grace", "Hopper"))
        .id
        .clone();

    let hits = store.search_people("grace hop");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id);
}

#[test]
fn related_people_and_candidates_partition_the_store() {
    let mut store = FamilyStore::new();
    let parent = add(&mut store, "Parent");
    let child = add(&mut store, "Child");
    let spouse = add(&mut store, "Spouse");
    let stranger = add(&mut store, "Stranger");
    store
        .add_relationship(&parent, &child, RelationshipKind::Parent)
        .unwrap();
    store
        .add_relationship(&parent, &spouse, RelationshipKind::Spouse)
        .unwrap();

    let related = store.related_people(&parent).unwrap();
    assert_eq!(related.children[0].id, child);
    assert_eq!(related.spouses[0].id, spouse);
    assert!(related.parents.is_empty());

    let candidates: Vec<PersonId> = store
        .relationship_candidates(&parent)
        .unwrap()
        .into_iter()
        .map(|person| person.id.clone())
        .collect();
    assert_eq!(candidates, vec![stranger]);
}

#[test]
fn symmetry_holds_after_mixed_mutations() {
    let mut store = FamilyStore::new();
    let ids: Vec<PersonId> = (0..6).map(|i| add(&mut store, &format!("P{i}"))).collect();

    store
        .add_relationship(&ids[0], &ids[1], RelationshipKind::Parent)
        .unwrap();
    store
        .add_relationship(&ids[2], &ids[1], RelationshipKind::Parent)
        .unwrap();
    store
        .add_relationship(&ids[0], &ids[2], RelationshipKind::Spouse)
        .unwrap();
    store
        .add_relationship(&ids[3], &ids[1], RelationshipKind::Child)
        .unwrap();
    store
        .add_relationship(&ids[4], &ids[5], RelationshipKind::Spouse)
        .unwrap();
    store.remove_relationship(&ids[0], &ids[2]).unwrap();
    store.delete_person(&ids[4]).unwrap();
    store
        .add_relationship(&ids[5], &ids[3], RelationshipKind::Parent)
        .unwrap();

    store.check_invariants().unwrap();
    assert_eq!(store.get_person(&ids[1]).unwrap().children_ids, vec![ids[3].clone()]);
    assert!(store.get_person(&ids[5]).unwrap().spouse_ids.is_empty());
}

fn add(store: &mut FamilyStore, first_name: &str) -> PersonId {
    store.add_person(PersonDraft::new(first_name, "Family")).id.clone()
}
