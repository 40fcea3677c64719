//! Persistence contracts and adapters for person snapshots.
//!
//! # Responsibility
//! - Round-trip the full ordered `Person` sequence through a durable store.
//! - Keep storage details (SQL, file formats) out of store and service code.
//!
//! # Invariants
//! - `save_people` replaces the whole snapshot atomically.
//! - `load_people` returns records exactly as saved, including list order.
//!   Repairing invariants is the store's job, not the repository's.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod json_repo;
pub mod sqlite_repo;

use crate::model::person::Person;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Connection schema is not at the migrated version this adapter expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "invalid snapshot json in `{}`: {source}", path.display())
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "family repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "family repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable key-value style storage for the person sequence.
pub trait FamilyRepository {
    /// Loads every person in saved order. An empty store yields an empty list.
    fn load_people(&self) -> RepoResult<Vec<Person>>;
    /// Replaces the stored snapshot with `people`.
    fn save_people(&self, people: &[Person]) -> RepoResult<()>;
}

impl<R: FamilyRepository + ?Sized> FamilyRepository for &R {
    fn load_people(&self) -> RepoResult<Vec<Person>> {
        (**self).load_people()
    }

    fn save_people(&self, people: &[Person]) -> RepoResult<()> {
        (**self).save_people(people)
    }
}
