//! `kinship` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, load `kinship.toml` and start file logging.
//! - Open the configured storage backend and hand a `FamilyService` to the
//!   command handlers.

#![forbid(unsafe_code)]

mod commands;
mod output;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use kinship_core::config::DEFAULT_CONFIG_FILE_NAME;
use kinship_core::db::open_db;
use kinship_core::logging::init_logging_from_config;
use kinship_core::{
    load_config, FamilyService, Gender, JsonFileFamilyRepository, KinshipConfig, PersonId,
    RelationshipKind, SqliteFamilyRepository, StorageBackend,
};
use log::info;
use output::OutputMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kinship: family graph store and tree layout",
    long_about = None
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Storage file; overrides `storage.path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Storage backend; overrides `storage.backend`.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Sqlite,
    Json,
}

impl From<BackendArg> for StorageBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Sqlite => Self::Sqlite,
            BackendArg::Json => Self::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    #[command(
        next_help_heading = "People",
        about = "Add a person",
        after_help = "EXAMPLES:\n    kinship add Ada Lovelace --birth 1815-12-10 --gender female"
    )]
    Add(AddArgs),

    #[command(
        next_help_heading = "People",
        about = "Update fields of a person",
        long_about = "Update fields of a person. Pass an empty value to clear an optional field."
    )]
    Update(UpdateArgs),

    #[command(next_help_heading = "People", about = "Delete a person and every edge to them")]
    Delete {
        /// Person id or unique id prefix.
        id: String,
    },

    #[command(
        next_help_heading = "Relationships",
        about = "Record that A is the KIND of B",
        after_help = "EXAMPLES:\n    # Ada is the parent of Byron\n    kinship relate 1a2b parent 3c4d\n\n    # Directional labels work too\n    kinship relate 1a2b child-parent 3c4d"
    )]
    Relate {
        a: String,
        /// parent, child, spouse (or parent-child, child-parent, partner).
        #[arg(value_parser = parse_kind)]
        kind: RelationshipKind,
        b: String,
    },

    #[command(next_help_heading = "Relationships", about = "Remove every edge between A and B")]
    Unrelate { a: String, b: String },

    #[command(next_help_heading = "Read", about = "Show one person with relatives")]
    Show { id: String },

    #[command(next_help_heading = "Read", about = "Search people by name")]
    Search { query: String },

    #[command(next_help_heading = "Read", about = "List people in insertion order")]
    List,

    #[command(next_help_heading = "Read", about = "List people by birth date")]
    Timeline,

    #[command(
        next_help_heading = "View",
        about = "Collapse or expand a person's descendants",
        long_about = "Toggle the collapsed flag, or set it explicitly with --on/--off."
    )]
    Collapse {
        id: String,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },

    #[command(next_help_heading = "View", about = "Compute the tree layout")]
    Layout {
        /// Root the layout at this person.
        #[arg(long)]
        focus: Option<String>,
        /// Extra people to treat as collapsed.
        #[arg(long = "collapsed", value_name = "ID")]
        collapsed: Vec<String>,
    },

    #[command(next_help_heading = "View", about = "Print nested descendant trees")]
    Tree,

    #[command(next_help_heading = "Interoperability", about = "Write all people to a JSON file")]
    Export { path: PathBuf },

    #[command(
        next_help_heading = "Interoperability",
        about = "Replace all people with a JSON file",
        long_about = "Replace all people with the contents of a JSON snapshot. Broken edges are repaired on import."
    )]
    Import { path: PathBuf },
}

#[derive(Args, Debug)]
pub(crate) struct AddArgs {
    pub first_name: String,
    #[arg(default_value = "")]
    pub last_name: String,
    #[arg(long)]
    pub nickname: Option<String>,
    #[arg(long, value_parser = parse_gender)]
    pub gender: Option<Gender>,
    /// YYYY, YYYY-MM or YYYY-MM-DD.
    #[arg(long = "birth")]
    pub birth_date: Option<String>,
    #[arg(long = "death")]
    pub death_date: Option<String>,
    #[arg(long)]
    pub photo: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct UpdateArgs {
    pub id: String,
    #[arg(long = "first")]
    pub first_name: Option<String>,
    #[arg(long = "last")]
    pub last_name: Option<String>,
    #[arg(long)]
    pub nickname: Option<String>,
    /// male, female, other; empty clears.
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long = "birth")]
    pub birth_date: Option<String>,
    #[arg(long = "death")]
    pub death_date: Option<String>,
    #[arg(long)]
    pub photo: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Replaces all tags when given at least once.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

fn parse_kind(value: &str) -> Result<RelationshipKind, String> {
    RelationshipKind::from_label(value)
        .ok_or_else(|| format!("unknown relationship kind `{value}`"))
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    Gender::parse(value).ok_or_else(|| format!("unknown gender `{value}`"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mode = cli.output_mode();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load config `{}`", cli.config.display()))?;
    if let Some(db) = &cli.db {
        config.storage.path = db.clone();
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend.into();
    }

    if let Err(err) = init_logging_from_config(&config.logging) {
        eprintln!("warning: file logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok backend={:?}",
        config.storage.backend
    );

    run(&config, cli.command, mode)
}

fn run(config: &KinshipConfig, command: Commands, mode: OutputMode) -> anyhow::Result<()> {
    let path = &config.storage.path;
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let conn = open_db(path)
                .with_context(|| format!("failed to open database `{}`", path.display()))?;
            let repo = SqliteFamilyRepository::try_new(&conn)?;
            let mut service = FamilyService::open(repo, config.layout)?;
            commands::execute(&mut service, command, mode)
        }
        StorageBackend::Json => {
            let repo = JsonFileFamilyRepository::new(path);
            let mut service = FamilyService::open(repo, config.layout)?;
            commands::execute(&mut service, command, mode)
        }
    }
}

/// Resolves a full id or a unique prefix of one.
pub(crate) fn resolve_id<'a>(
    ids: impl IntoIterator<Item = &'a PersonId>,
    raw: &str,
) -> anyhow::Result<PersonId> {
    let needle = raw.trim();
    if needle.is_empty() {
        anyhow::bail!("person id must not be empty");
    }
    let mut matches: Vec<&PersonId> = Vec::new();
    for id in ids {
        if id.as_str() == needle {
            return Ok(id.clone());
        }
        if id.as_str().starts_with(needle) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => anyhow::bail!("no person matches `{raw}`"),
        _ => anyhow::bail!("id prefix `{raw}` is ambiguous"),
    }
}
