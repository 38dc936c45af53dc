use std::fs;
use std::path::{Path, PathBuf};

use lov_types::DEFAULT_INDENT;
use serde::{Deserialize, Serialize};

use crate::error::{WorkshopError, WorkshopResult};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "lov.toml";

/// Configuration for a [`Workshop`](crate::Workshop).
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```toml
/// workshop_dir = "workshop"
/// target_dir = "/games/Limbus/LimbusCompany_Data/Lang"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Directory holding the pristine upstream documents.
    pub workshop_dir: PathBuf,
    /// Diff store file, relative to `workshop_dir` unless absolute.
    pub store_file: PathBuf,
    /// Directory whose documents `replay` patches in place.
    pub target_dir: Option<PathBuf>,
    /// Indentation width of written JSON.
    pub indent: usize,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            workshop_dir: PathBuf::from("workshop"),
            store_file: PathBuf::from("changes.json"),
            target_dir: None,
            indent: DEFAULT_INDENT,
        }
    }
}

impl WorkshopConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> WorkshopResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| WorkshopError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> WorkshopResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| WorkshopError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Load `lov.toml` from `dir` if present, otherwise use the defaults.
    pub fn discover(dir: &Path) -> WorkshopResult<Self> {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> WorkshopResult<String> {
        toml::to_string_pretty(self).map_err(|e| WorkshopError::Config(e.to_string()))
    }

    /// Resolved location of the diff store file.
    pub fn store_path(&self) -> PathBuf {
        if self.store_file.is_absolute() {
            self.store_file.clone()
        } else {
            self.workshop_dir.join(&self.store_file)
        }
    }

    fn validate(&self) -> WorkshopResult<()> {
        if self.indent > 16 {
            return Err(WorkshopError::Config(format!(
                "indent must be at most 16, got {}",
                self.indent
            )));
        }
        if self.store_file.as_os_str().is_empty() {
            return Err(WorkshopError::Config("store_file must not be empty".into()));
        }
        Ok(())
    }
}
