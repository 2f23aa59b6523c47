//! Saved environments.
//!
//! An environment is persisted as its name, robot data and configuration, one JSON
//! file per environment (`<dir>/<name>.json`). Rebuilding from a saved state replays
//! the same build the environment was created with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentConfig;
use crate::error::EnvironmentError;
use crate::robot::RobotData;

const EXTENSION: &str = "json";

/// Everything needed to rebuild an environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedEnvironment {
    pub name: String,
    pub data: RobotData,
    pub config: EnvironmentConfig,
}

/// Directory of saved environments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentStore {
    dir: PathBuf,
}

impl Default for EnvironmentStore {
    fn default() -> Self {
        Self::new("environments")
    }
}

impl EnvironmentStore {
    /// The directory is created on the first save, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    /// Names of all saved environments, sorted. A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<String>, EnvironmentError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn save(&self, state: &SavedEnvironment) -> Result<PathBuf, EnvironmentError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&state.name);
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&path, json)?;
        tracing::info!("Saved environment '{}' to {}", state.name, path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<SavedEnvironment, EnvironmentError> {
        if !self.contains(name) {
            return Err(EnvironmentError::EnvironmentNotFound {
                name: name.to_string(),
            });
        }
        let text = std::fs::read_to_string(self.path_for(name))?;
        Ok(serde_json::from_str(&text)?)
    }
}
