//! Inventory state file and request loading.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use stowage::engine::api::{build_config, ConfigRequest, InventorySnapshot};
use stowage::{Config, Inventory};
use thiserror::Error;

/// Errors that can occur when loading or saving state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse JSON from {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Engine(#[from] stowage::Error),
}

fn read_source(path: &Path) -> Result<String, StateError> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(io_err)?;
        Ok(buf)
    } else {
        fs::read_to_string(path).map_err(io_err)
    }
}

fn parse<T: DeserializeOwned>(path: &Path, json: &str) -> Result<T, StateError> {
    serde_json::from_str(json).map_err(|source| StateError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a JSON request from a file, or from stdin when the path is `-`.
pub fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T, StateError> {
    let json = read_source(path)?;
    parse(path, &json)
}

/// Loads configuration overrides; without a file the defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, StateError> {
    let overrides = path
        .map(read_request::<ConfigRequest>)
        .transpose()?;
    Ok(build_config(overrides))
}

/// The inventory state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the inventory. A missing file yields an empty inventory.
    pub fn load(&self) -> Result<Inventory, StateError> {
        if !self.path.exists() {
            log::debug!("No state at {}, starting empty", self.path.display());
            return Ok(Inventory::new());
        }
        let json = read_source(&self.path)?;
        let snapshot: InventorySnapshot = parse(&self.path, &json)?;
        Ok(snapshot.into_inventory()?)
    }

    /// Writes the inventory back.
    pub fn save(&self, inventory: &Inventory) -> Result<(), StateError> {
        let json = InventorySnapshot::from_inventory(inventory)?.to_json()?;
        fs::write(&self.path, json).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}
