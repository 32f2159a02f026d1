//! JSON-backed document store
//!
//! The whole building document is loaded once, mutated in memory and
//! written back in full on every explicit save. Saves go through a temp
//! file in the same directory followed by an atomic rename, so a crash
//! mid-write leaves the previous file intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::models::BuildingData;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize building data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How the data file came to exist on open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    /// The data file was already there
    Existing,
    /// Copied from a bundled template
    Template(PathBuf),
    /// Synthesized: default statuses, no floors
    Empty,
}

/// Repository owning the in-memory building document
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: BuildingData,
}

impl Store {
    /// Open the data file at `path`, seeding it first if absent
    ///
    /// A missing or corrupt file never fails the open: the document falls
    /// back to the default and the problem is logged.
    pub fn open(path: impl Into<PathBuf>, templates: &[PathBuf]) -> (Self, Seed) {
        let path = path.into();
        let seed = match ensure_data_file(&path, templates) {
            Ok(seed) => seed,
            Err(e) => {
                warn!("Could not seed data file: {}", e);
                Seed::Empty
            }
        };
        let data = match read_document(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Falling back to an empty document: {}", e);
                BuildingData::default()
            }
        };
        (Self { path, data }, seed)
    }

    /// Open without seeding, failing on any read or parse error
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = read_document(&path)?;
        Ok(Self { path, data })
    }

    /// In-memory store that saves to `path`
    pub fn with_data(path: impl Into<PathBuf>, data: BuildingData) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &BuildingData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut BuildingData {
        &mut self.data
    }

    /// Write the whole document to disk atomically
    pub fn save(&self) -> Result<(), StoreError> {
        write_document(&self.path, &self.data)?;
        info!(
            "Saved {} room(s) on {} floor(s) to {}",
            self.data.room_count(),
            self.data.floors.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Apply `f` to the document, then save
    pub fn mutate<T>(&mut self, f: impl FnOnce(&mut BuildingData) -> T) -> Result<T, StoreError> {
        let out = f(&mut self.data);
        self.save()?;
        Ok(out)
    }
}

/// Make sure a data file exists at `path`: copy the first existing
/// template, otherwise write the default document.
pub fn ensure_data_file(path: &Path, templates: &[PathBuf]) -> Result<Seed, StoreError> {
    if path.exists() {
        return Ok(Seed::Existing);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    for template in templates {
        if template.exists() && template.as_path() != path {
            match fs::copy(template, path) {
                Ok(_) => {
                    info!("Data file copied from {}", template.display());
                    return Ok(Seed::Template(template.clone()));
                }
                Err(e) => warn!("Could not copy template {}: {}", template.display(), e),
            }
        }
    }

    info!("No template found, creating {}", path.display());
    write_document(path, &BuildingData::default())?;
    Ok(Seed::Empty)
}

fn read_document(path: &Path) -> Result<BuildingData, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data: BuildingData =
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    data.ensure_default_statuses();
    debug!(
        "Loaded {} floor(s), {} status(es) from {}",
        data.floors.len(),
        data.statuses.len(),
        path.display()
    );
    Ok(data)
}

fn write_document(path: &Path, data: &BuildingData) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
