//! File-backed [`Storage`]: one JSON file per application id.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::capabilities::Storage;
use crate::error::StorageError;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_local_dir>/slotedit`, if the platform has one.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("slotedit"))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// App ids are reduced to `[A-Za-z0-9_-]` so they cannot escape `dir`.
    fn path_for(&self, app_id: &str) -> PathBuf {
        let name: String = app_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let name = if name.is_empty() { "default".to_string() } else { name };
        self.dir.join(format!("{name}.json"))
    }
}

impl Storage for FileStorage {
    fn get_app_state(&self, app_id: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(app_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Written through a temp file in the same directory and renamed into place.
    fn set_app_state(&self, app_id: &str, blob: &Value) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec_pretty(blob)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(self.path_for(app_id))
            .map_err(|err| StorageError::Io(err.error))?;
        Ok(())
    }

    fn clear_app_state(&self, app_id: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(app_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
