use kinship_core::db::{open_db, open_db_in_memory};
use kinship_core::model::relationship::RelationshipKind;
use kinship_core::{
    FamilyRepository, FamilyStore, Gender, LifeEvent, LifeEventKind, Person, PersonDraft,
    PersonId, RepoError, SqliteFamilyRepository,
};
use rusqlite::Connection;

#[test]
fn empty_database_loads_no_people() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();

    assert!(repo.load_people().unwrap().is_empty());
}

#[test]
fn snapshot_round_trips_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();
    let people = sample_people();

    repo.save_people(&people).unwrap();

    assert_eq!(repo.load_people().unwrap(), people);
}

#[test]
fn save_replaces_previous_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();
    let mut people = sample_people();
    repo.save_people(&people).unwrap();

    let mut store = FamilyStore::from_people(people.clone());
    store.delete_person(&people[1].id).unwrap();
    people = store.into_people();
    repo.save_people(&people).unwrap();

    let loaded = repo.load_people().unwrap();
    assert_eq!(loaded, people);
    let relation_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM person_relations;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(relation_rows, 2);
}

#[test]
fn snapshot_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("family.sqlite3");
    let people = sample_people();

    {
        let conn = open_db(&path).unwrap();
        SqliteFamilyRepository::try_new(&conn)
            .unwrap()
            .save_people(&people)
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let loaded = SqliteFamilyRepository::try_new(&conn)
        .unwrap()
        .load_people()
        .unwrap();
    assert_eq!(loaded, people);
}

#[test]
fn opaque_ids_round_trip_verbatim() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO people (id, position, first_name, last_name)
         VALUES ('lq3k9z1x4f2a', 0, 'Marta', 'Vik'), ('k2j3h4', 1, 'Jon', 'Vik');
         INSERT INTO person_relations (person_id, role, related_id, position)
         VALUES ('lq3k9z1x4f2a', 'child', 'k2j3h4', 0), ('k2j3h4', 'parent', 'lq3k9z1x4f2a', 0);",
    )
    .unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();

    let people = repo.load_people().unwrap();
    assert_eq!(people[0].id, PersonId::from("lq3k9z1x4f2a"));
    assert_eq!(people[0].children_ids, vec![PersonId::from("k2j3h4")]);

    repo.save_people(&people).unwrap();
    assert_eq!(repo.load_people().unwrap(), people);
}

#[test]
fn detail_row_without_person_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO person_tags (person_id, position, tag) VALUES ('ghost', 0, 'lost');
         PRAGMA foreign_keys = ON;",
    )
    .unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();

    let err = repo.load_people().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteFamilyRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::UninitializedConnection { .. }));
}

// Grandmother -> mother (married to father) -> child, with every optional
// field populated on the mother.
fn sample_people() -> Vec<Person> {
    let mut store = FamilyStore::new();
    let grandmother = store.add_person(PersonDraft::new("Edith", "Mora")).id.clone();

    let mut draft = PersonDraft::new("Lucia", "Mora");
    draft.nickname = Some("Lu".to_string());
    draft.gender = Some(Gender::Female);
    draft.birth_date = Some("1961-04".to_string());
    draft.photo = Some("https://example.org/lucia.png".to_string());
    draft.notes = Some("Taught at the lyceum.".to_string());
    draft.tags = vec!["Physicist".to_string(), "emigrant".to_string()];
    draft.life_events = vec![
        LifeEvent {
            id: "ev-1".to_string(),
            kind: LifeEventKind::Birth,
            date: Some("1961-04".to_string()),
            place: Some("Porto".to_string()),
            note: None,
        },
        LifeEvent {
            id: "ev-2".to_string(),
            kind: LifeEventKind::Marriage,
            date: Some("1985".to_string()),
            place: None,
            note: Some("Civil ceremony".to_string()),
        },
    ];
    let mother = store.add_person(draft).id.clone();
    let father = store.add_person(PersonDraft::new("Tomas", "Reyes")).id.clone();
    let child = store.add_person(PersonDraft::new("Ines", "Reyes")).id.clone();

    store
        .add_relationship(&grandmother, &mother, RelationshipKind::Parent)
        .unwrap();
    store
        .add_relationship(&mother, &father, RelationshipKind::Spouse)
        .unwrap();
    store
        .add_relationship(&child, &mother, RelationshipKind::Child)
        .unwrap();
    store
        .add_relationship(&father, &child, RelationshipKind::Parent)
        .unwrap();
    store.set_collapsed(&grandmother, true).unwrap();
    store.into_people()
}
