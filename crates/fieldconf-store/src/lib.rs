//! Scoped JSON-object file store.
//!
//! A [`ConfigFile`] is a flat, string-keyed JSON object that is read fully
//! into memory on open and written back on [`ConfigFile::close`]:
//! - existing file: parsed as a JSON object (empty file = empty object)
//! - missing file, `create == false`: empty mapping, nothing written
//! - missing file, `create == true`: empty mapping, written on close
//!
//! The containing directory must already exist in every case.

mod error;

pub use error::StoreError;

use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory containing `path`; a bare file name lives in the current one.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// In-memory view of a JSON config file.
///
/// Changes are only persisted by [`ConfigFile::close`]. Dropping a handle
/// without closing it discards the in-memory mapping and leaves the file
/// untouched.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    map: Map<String, Value>,
    persist: bool,
}

impl ConfigFile {
    /// Open `path`, loading its contents if the file exists.
    pub fn open(path: impl AsRef<Path>, create: bool) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let dir = parent_dir(&path);
        if !dir.is_dir() {
            return Err(StoreError::MissingDirectory(dir.to_path_buf()));
        }

        let (map, existed) = match fs::read_to_string(&path) {
            Ok(contents) => (Self::parse(&path, &contents)?, true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (Map::new(), false),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), existed, keys = map.len(), "opened config file");

        Ok(Self {
            path,
            map,
            persist: existed || create,
        })
    }

    /// Open `path`, run `f` against the mapping, and close the handle if `f`
    /// succeeds. On error the file is left untouched.
    pub fn scoped<T, E, F>(path: impl AsRef<Path>, create: bool, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut file = Self::open(path, create)?;
        let out = f(&mut file.map)?;
        file.close()?;
        Ok(out)
    }

    fn parse(path: &Path, contents: &str) -> Result<Map<String, Value>, StoreError> {
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(path.to_path_buf())),
        }
    }

    /// Path this handle was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`close`](Self::close) will write the file.
    pub fn will_persist(&self) -> bool {
        self.persist
    }

    /// Merge `other` into the mapping, last write wins per key.
    pub fn update(&mut self, other: impl IntoIterator<Item = (String, Value)>) {
        self.map.extend(other);
    }

    /// Consume the handle and return the mapping without writing anything.
    pub fn into_inner(self) -> Map<String, Value> {
        self.map
    }

    /// Persist the mapping (if this handle has write intent) and release it.
    ///
    /// The JSON is written to a uniquely named temp file in the same
    /// directory and renamed over `path`, so readers never observe a partial
    /// write and no other file beside `path` is touched.
    pub fn close(self) -> Result<(), StoreError> {
        if !self.persist {
            tracing::debug!(path = %self.path.display(), "config file not persisted");
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&Value::Object(self.map))?;

        let mut temp = NamedTempFile::new_in(parent_dir(&self.path))?;
        temp.write_all(json.as_bytes())?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), "config file written");
        Ok(())
    }
}

impl Deref for ConfigFile {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

impl DerefMut for ConfigFile {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.map
    }
}
