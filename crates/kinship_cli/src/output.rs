//! Human and JSON rendering shared by all commands.

use kinship_core::{Person, TreeNode};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// `<short id>  <full name>  (<birth>-<death>)`.
pub fn person_line(person: &Person) -> String {
    let id = person.id.as_str();
    let short = id.get(..8).unwrap_or(id);
    let lifespan = match (person.birth_date.as_deref(), person.death_date.as_deref()) {
        (None, None) => String::new(),
        (birth, death) => format!(
            "  ({}-{})",
            birth.unwrap_or("?"),
            death.unwrap_or("")
        ),
    };
    let collapsed = if person.is_collapsed() { "  [collapsed]" } else { "" };
    format!("{short}  {}{lifespan}{collapsed}", display_name(person))
}

pub fn display_name(person: &Person) -> String {
    let full = person.full_name();
    match person.nickname.as_deref() {
        Some(nick) if !nick.is_empty() => format!("{full} \"{nick}\""),
        _ if full.is_empty() => "(unnamed)".to_string(),
        _ => full,
    }
}

pub fn print_people<'a>(
    people: impl IntoIterator<Item = &'a Person>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let people: Vec<&Person> = people.into_iter().collect();
    if mode.is_json() {
        return print_json(&people);
    }
    if people.is_empty() {
        println!("no people");
    }
    for person in people {
        println!("{}", person_line(person));
    }
    Ok(())
}

/// Writes `tree` indented two spaces per depth level.
pub fn write_tree(
    out: &mut dyn Write,
    tree: &TreeNode,
    name_of: &dyn Fn(&TreeNode) -> String,
) -> io::Result<()> {
    let marker = if tree.collapsed { " [+]" } else { "" };
    writeln!(
        out,
        "{:indent$}{}{marker}",
        "",
        name_of(tree),
        indent = tree.depth * 2
    )?;
    for child in &tree.children {
        write_tree(out, child, name_of)?;
    }
    Ok(())
}
