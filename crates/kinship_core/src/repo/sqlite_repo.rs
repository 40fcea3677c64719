//! SQLite-backed person snapshot repository.
//!
//! # Responsibility
//! - Map `Person` records onto `people`, `person_relations`, `person_tags`
//!   and `life_events` rows.
//!
//! # Invariants
//! - Snapshot writes run in one immediate transaction.
//! - Reads reject malformed rows (unknown enum text, detail rows without a
//!   person) instead of masking them.
//! - Ids are stored verbatim as TEXT; no id format is assumed.
//! - `position` columns preserve person order and list order.

use crate::db::migrations::latest_version;
use crate::model::person::{Gender, LifeEvent, LifeEventKind, Person, PersonId, PersonUi};
use crate::model::relationship::RelationList;
use crate::repo::{FamilyRepository, RepoError, RepoResult};
use log::{error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::time::Instant;

const PEOPLE_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    nickname,
    gender,
    birth_date,
    death_date,
    photo,
    notes,
    collapsed
FROM people
ORDER BY position ASC, id ASC;";

/// SQLite person repository over a migrated connection.
pub struct SqliteFamilyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFamilyRepository<'conn> {
    /// Creates a repository after checking the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl FamilyRepository for SqliteFamilyRepository<'_> {
    fn load_people(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(PEOPLE_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }

        let positions: HashMap<PersonId, usize> = people
            .iter()
            .enumerate()
            .map(|(position, person)| (person.id.clone(), position))
            .collect();

        load_relations(self.conn, &positions, &mut people)?;
        load_tags(self.conn, &positions, &mut people)?;
        load_life_events(self.conn, &positions, &mut people)?;
        Ok(people)
    }

    fn save_people(&self, people: &[Person]) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = write_snapshot(self.conn, people);
        match &result {
            Ok(()) => info!(
                "event=snapshot_save module=repo status=ok backend=sqlite people={} duration_ms={}",
                people.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_save module=repo status=error backend=sqlite people={} error={}",
                people.len(),
                err
            ),
        }
        result
    }
}

fn write_snapshot(conn: &Connection, people: &[Person]) -> RepoResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(
        "DELETE FROM life_events;
         DELETE FROM person_tags;
         DELETE FROM person_relations;
         DELETE FROM people;",
    )?;

    {
        let mut insert_person = tx.prepare(
            "INSERT INTO people (
                id,
                position,
                first_name,
                last_name,
                nickname,
                gender,
                birth_date,
                death_date,
                photo,
                notes,
                collapsed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        )?;
        let mut insert_relation = tx.prepare(
            "INSERT INTO person_relations (person_id, role, related_id, position)
             VALUES (?1, ?2, ?3, ?4);",
        )?;
        let mut insert_tag = tx.prepare(
            "INSERT INTO person_tags (person_id, position, tag) VALUES (?1, ?2, ?3);",
        )?;
        let mut insert_event = tx.prepare(
            "INSERT INTO life_events (person_id, position, event_id, kind, date, place, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        )?;

        for (position, person) in people.iter().enumerate() {
            let person_id = person.id.as_str();
            insert_person.execute(params![
                person_id,
                position as i64,
                person.first_name.as_str(),
                person.last_name.as_str(),
                person.nickname.as_deref(),
                person.gender.map(Gender::as_str),
                person.birth_date.as_deref(),
                person.death_date.as_deref(),
                person.photo.as_deref(),
                person.notes.as_deref(),
                i64::from(person.ui.collapsed),
            ])?;

            for list in RelationList::ALL {
                for (index, related) in person.relation_ids(list).iter().enumerate() {
                    insert_relation.execute(params![
                        person_id,
                        role_to_db(list),
                        related.as_str(),
                        index as i64,
                    ])?;
                }
            }
            for (index, tag) in person.tags.iter().enumerate() {
                insert_tag.execute(params![person_id, index as i64, tag.as_str()])?;
            }
            for (index, event) in person.life_events.iter().enumerate() {
                insert_event.execute(params![
                    person_id,
                    index as i64,
                    event.id.as_str(),
                    event.kind.as_str(),
                    event.date.as_deref(),
                    event.place.as_deref(),
                    event.note.as_deref(),
                ])?;
            }
        }
    }

    tx.commit()?;
    Ok(())
}

fn load_relations(
    conn: &Connection,
    positions: &HashMap<PersonId, usize>,
    people: &mut [Person],
) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "SELECT person_id, role, related_id
         FROM person_relations
         ORDER BY person_id ASC, role ASC, position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let owner = owner_position(row, positions, "person_relations.person_id")?;
        let role_text: String = row.get("role")?;
        let list = parse_role(&role_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid role `{role_text}` in person_relations.role"
            ))
        })?;
        let related: String = row.get("related_id")?;
        people[owner]
            .relation_ids_mut(list)
            .push(PersonId::from(related));
    }
    Ok(())
}

fn load_tags(
    conn: &Connection,
    positions: &HashMap<PersonId, usize>,
    people: &mut [Person],
) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "SELECT person_id, tag
         FROM person_tags
         ORDER BY person_id ASC, position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let owner = owner_position(row, positions, "person_tags.person_id")?;
        people[owner].tags.push(row.get("tag")?);
    }
    Ok(())
}

fn load_life_events(
    conn: &Connection,
    positions: &HashMap<PersonId, usize>,
    people: &mut [Person],
) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "SELECT person_id, event_id, kind, date, place, note
         FROM life_events
         ORDER BY person_id ASC, position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let owner = owner_position(row, positions, "life_events.person_id")?;
        let kind_text: String = row.get("kind")?;
        let kind = LifeEventKind::parse(&kind_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid kind `{kind_text}` in life_events.kind"))
        })?;
        people[owner].life_events.push(LifeEvent {
            id: row.get("event_id")?,
            kind,
            date: row.get("date")?,
            place: row.get("place")?,
            note: row.get("note")?,
        });
    }
    Ok(())
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id = PersonId::from(row.get::<_, String>("id")?);

    let gender = match row.get::<_, Option<String>>("gender")? {
        Some(text) => Some(Gender::parse(&text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid gender `{text}` in people.gender"))
        })?),
        None => None,
    };

    let collapsed = match row.get::<_, i64>("collapsed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid collapsed value `{other}` in people.collapsed"
            )));
        }
    };

    Ok(Person {
        id,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        nickname: row.get("nickname")?,
        gender,
        birth_date: row.get("birth_date")?,
        death_date: row.get("death_date")?,
        photo: row.get("photo")?,
        notes: row.get("notes")?,
        tags: Vec::new(),
        life_events: Vec::new(),
        parent_ids: Vec::new(),
        spouse_ids: Vec::new(),
        children_ids: Vec::new(),
        ui: PersonUi { collapsed },
    })
}

fn owner_position(
    row: &Row<'_>,
    positions: &HashMap<PersonId, usize>,
    column: &'static str,
) -> RepoResult<usize> {
    let id = PersonId::from(row.get::<_, String>("person_id")?);
    positions.get(&id).copied().ok_or_else(|| {
        RepoError::InvalidData(format!("{column} `{id}` has no matching people row"))
    })
}

fn role_to_db(list: RelationList) -> &'static str {
    match list {
        RelationList::Parents => "parent",
        RelationList::Spouses => "spouse",
        RelationList::Children => "child",
    }
}

fn parse_role(value: &str) -> Option<RelationList> {
    match value {
        "parent" => Some(RelationList::Parents),
        "spouse" => Some(RelationList::Spouses),
        "child" => Some(RelationList::Children),
        _ => None,
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = crate::db::migrations::user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["people", "person_relations", "person_tags", "life_events"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
