//! JSON file snapshot repository.
//!
//! Stores the person sequence as one pretty-printed JSON array in the
//! camelCase wire shape, so files can be exchanged with other tools.

use crate::model::person::Person;
use crate::repo::{FamilyRepository, RepoError, RepoResult};
use log::{error, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Snapshot repository backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileFamilyRepository {
    path: PathBuf,
}

impl JsonFileFamilyRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RepoError {
        RepoError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl FamilyRepository for JsonFileFamilyRepository {
    /// A missing file is an empty family.
    fn load_people(&self) -> RepoResult<Vec<Person>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|source| RepoError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save_people(&self, people: &[Person]) -> RepoResult<()> {
        let result = write_atomically(self, people);
        match &result {
            Ok(()) => info!(
                "event=snapshot_save module=repo status=ok backend=json people={} path={}",
                people.len(),
                self.path.display()
            ),
            Err(err) => error!(
                "event=snapshot_save module=repo status=error backend=json people={} error={}",
                people.len(),
                err
            ),
        }
        result
    }
}

// Write to a sibling temp file and rename over the target.
fn write_atomically(repo: &JsonFileFamilyRepository, people: &[Person]) -> RepoResult<()> {
    let path = repo.path();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| repo.io_error(err))?;
    }

    let json = serde_json::to_string_pretty(people).map_err(|source| RepoError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, json).map_err(|err| repo.io_error(err))?;
    fs::rename(&tmp_path, path).map_err(|err| repo.io_error(err))
}
