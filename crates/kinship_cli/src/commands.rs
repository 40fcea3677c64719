//! Command handlers over a `FamilyService`.

use crate::output::{display_name, person_line, print_json, print_people, write_tree, OutputMode};
use crate::{resolve_id, AddArgs, Commands, UpdateArgs};
use anyhow::Context;
use chrono::Local;
use kinship_core::{
    EdgeChange, FamilyRepository, FamilyService, Gender, JsonFileFamilyRepository,
    LayoutRequest, PersonDraft, PersonId, PersonPatch,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io;

pub fn execute<R: FamilyRepository>(
    service: &mut FamilyService<R>,
    command: Commands,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Commands::Add(args) => add(service, args, mode)?,
        Commands::Update(args) => update(service, args, mode)?,
        Commands::Delete { id } => {
            let id = resolve(service, &id)?;
            let removed = service.delete_person(&id)?;
            if mode.is_json() {
                print_json(&removed)?;
            } else {
                println!("deleted {}", person_line(&removed));
            }
        }
        Commands::Relate { a, kind, b } => {
            let (a, b) = (resolve(service, &a)?, resolve(service, &b)?);
            let change = service.add_relationship(&a, &b, kind)?;
            if mode.is_json() {
                print_json(&serde_json::json!({
                    "a": a,
                    "b": b,
                    "kind": kind,
                    "added": change.is_added(),
                }))?;
            } else {
                match change {
                    EdgeChange::Added => println!("recorded {a} as {} of {b}", kind.as_str()),
                    EdgeChange::AlreadyPresent => println!("relationship already recorded"),
                }
            }
        }
        Commands::Unrelate { a, b } => {
            let (a, b) = (resolve(service, &a)?, resolve(service, &b)?);
            let removed = service.remove_relationship(&a, &b)?;
            if mode.is_json() {
                print_json(&serde_json::json!({ "a": a, "b": b, "removed": removed }))?;
            } else if removed {
                println!("removed every relationship between {a} and {b}");
            } else {
                println!("no relationship between {a} and {b}");
            }
        }
        Commands::Show { id } => show(service, &id, mode)?,
        Commands::Search { query } => print_people(service.store().search_people(&query), mode)?,
        Commands::List => print_people(service.store().people(), mode)?,
        Commands::Timeline => print_people(service.store().timeline(), mode)?,
        Commands::Collapse { id, on, off } => {
            let id = resolve(service, &id)?;
            let collapsed = if on || off {
                service.set_collapsed(&id, on)?;
                on
            } else {
                service.toggle_collapsed(&id)?
            };
            if mode.is_json() {
                print_json(&serde_json::json!({ "id": id, "collapsed": collapsed }))?;
            } else {
                println!("{id} {}", if collapsed { "collapsed" } else { "expanded" });
            }
        }
        Commands::Layout { focus, collapsed } => {
            let reader: &FamilyService<R> = service;
            let focus = focus.map(|raw| resolve(reader, &raw)).transpose()?;
            let collapsed = collapsed
                .iter()
                .map(|raw| resolve(reader, raw))
                .collect::<anyhow::Result<BTreeSet<PersonId>>>()?;
            let layout = service.layout_with(&LayoutRequest { focus, collapsed });
            if mode.is_json() {
                print_json(&layout)?;
            } else {
                for node in &layout.nodes {
                    let name = service
                        .get_person(&node.id)
                        .map(display_name)
                        .unwrap_or_default();
                    println!(
                        "gen {:>3}  x {:>8.1}  y {:>8.1}  {name}",
                        node.generation, node.x, node.y
                    );
                }
                println!("{} nodes, {} edges", layout.nodes.len(), layout.edges.len());
            }
        }
        Commands::Tree => {
            let forest = service.descendant_forest();
            if mode.is_json() {
                print_json(&forest)?;
            } else {
                let name_of = |node: &kinship_core::TreeNode| {
                    service
                        .get_person(&node.id)
                        .map(display_name)
                        .unwrap_or_else(|| node.id.to_string())
                };
                let stdout = io::stdout();
                let mut out = stdout.lock();
                for tree in &forest {
                    write_tree(&mut out, tree, &name_of)?;
                }
            }
        }
        Commands::Export { path } => {
            JsonFileFamilyRepository::new(&path)
                .save_people(service.store().people())
                .with_context(|| format!("failed to export to `{}`", path.display()))?;
            let count = service.store().len();
            if mode.is_json() {
                print_json(&serde_json::json!({ "path": path, "people": count }))?;
            } else {
                println!("exported {count} people to {}", path.display());
            }
        }
        Commands::Import { path } => {
            let people = JsonFileFamilyRepository::new(&path)
                .load_people()
                .with_context(|| format!("failed to import `{}`", path.display()))?;
            let report = service.replace_all(people);
            if mode.is_json() {
                print_json(&serde_json::json!({
                    "people": report.people,
                    "repairs": report.repairs(),
                }))?;
            } else {
                println!(
                    "imported {} people ({} repairs)",
                    report.people,
                    report.repairs()
                );
            }
        }
    }

    if let Some(err) = service.last_persist_error() {
        anyhow::bail!("changes were not saved: {err}");
    }
    Ok(())
}

fn resolve<R: FamilyRepository>(service: &FamilyService<R>, raw: &str) -> anyhow::Result<PersonId> {
    resolve_id(service.store().people().iter().map(|person| &person.id), raw)
}

fn add<R: FamilyRepository>(
    service: &mut FamilyService<R>,
    args: AddArgs,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let draft = PersonDraft {
        first_name: args.first_name,
        last_name: args.last_name,
        nickname: args.nickname,
        gender: args.gender,
        birth_date: args.birth_date,
        death_date: args.death_date,
        photo: args.photo,
        notes: args.notes,
        tags: args.tags,
        life_events: Vec::new(),
    };
    draft.validate()?;
    let person = service.add_person(draft);
    if mode.is_json() {
        print_json(&person)
    } else {
        println!("added {}", person_line(&person));
        Ok(())
    }
}

fn update<R: FamilyRepository>(
    service: &mut FamilyService<R>,
    args: UpdateArgs,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let id = resolve(service, &args.id)?;
    let gender = match args.gender.as_deref().map(str::trim) {
        None => None,
        Some("") => Some(None),
        Some(value) => Some(Some(
            Gender::parse(value).with_context(|| format!("unknown gender `{value}`"))?,
        )),
    };
    let patch = PersonPatch {
        first_name: args.first_name,
        last_name: args.last_name,
        nickname: clearable(args.nickname),
        gender,
        birth_date: clearable(args.birth_date),
        death_date: clearable(args.death_date),
        photo: clearable(args.photo),
        notes: clearable(args.notes),
        tags: (!args.tags.is_empty()).then_some(args.tags),
        life_events: None,
        collapsed: None,
    };

    let current = service
        .get_person(&id)
        .with_context(|| format!("person not found: {id}"))?;
    let mut preview = PersonDraft {
        first_name: current.first_name.clone(),
        last_name: current.last_name.clone(),
        birth_date: current.birth_date.clone(),
        death_date: current.death_date.clone(),
        ..PersonDraft::default()
    };
    if let Some(value) = &patch.first_name {
        preview.first_name = value.clone();
    }
    if let Some(value) = &patch.last_name {
        preview.last_name = value.clone();
    }
    if let Some(value) = &patch.birth_date {
        preview.birth_date = value.clone();
    }
    if let Some(value) = &patch.death_date {
        preview.death_date = value.clone();
    }
    preview.validate()?;

    let person = service.update_person(&id, &patch)?;
    if mode.is_json() {
        print_json(&person)
    } else {
        println!("updated {}", person_line(&person));
        Ok(())
    }
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    person: &'a kinship_core::Person,
    age: Option<i32>,
    parents: Vec<String>,
    spouses: Vec<String>,
    children: Vec<String>,
}

fn show<R: FamilyRepository>(
    service: &FamilyService<R>,
    raw: &str,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let id = resolve(service, raw)?;
    let store = service.store();
    let person = store
        .get_person(&id)
        .with_context(|| format!("person not found: {id}"))?;
    let related = store.related_people(&id)?;
    let names = |people: &[&kinship_core::Person]| -> Vec<String> {
        people.iter().map(|person| display_name(person)).collect()
    };
    let output = ShowOutput {
        person,
        age: person.age_on(Local::now().date_naive()),
        parents: names(&related.parents),
        spouses: names(&related.spouses),
        children: names(&related.children),
    };

    if mode.is_json() {
        return print_json(&output);
    }
    println!("{}", person_line(person));
    println!("{:<10} {}", "id:", person.id);
    if let Some(age) = output.age {
        println!("{:<10} {age}", "age:");
    }
    if let Some(gender) = person.gender {
        println!("{:<10} {}", "gender:", gender.as_str());
    }
    if !person.tags.is_empty() {
        println!("{:<10} {}", "tags:", person.tags.join(", "));
    }
    if let Some(notes) = person.notes.as_deref() {
        println!("{:<10} {notes}", "notes:");
    }
    for (label, list) in [
        ("parents:", &output.parents),
        ("spouses:", &output.spouses),
        ("children:", &output.children),
    ] {
        if !list.is_empty() {
            println!("{label:<10} {}", list.join(", "));
        }
    }
    Ok(())
}

// An empty value clears an optional field.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
