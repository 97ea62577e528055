use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use jobwatch_core::SearchOptions;
use jobwatch_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use watch_logging::{watch_info, watch_warn};

const PREFS_FILENAME: &str = ".jobwatch.ron";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] ron::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Settings remembered between invocations. Command-line flags override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub base_url: String,
    pub search: SearchOptions,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            base_url: EngineConfig::default().base_url,
            search: SearchOptions::default(),
        }
    }
}

/// `~/.jobwatch.ron`, or the working directory when no home is known.
pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PREFS_FILENAME)
}

/// Missing or unreadable files fall back to defaults.
pub fn load(path: &Path) -> Preferences {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Preferences::default();
        }
        Err(err) => {
            watch_warn!("Failed to read preferences from {:?}: {}", path, err);
            return Preferences::default();
        }
    };

    match ron::from_str::<Preferences>(&content) {
        Ok(mut prefs) => {
            prefs.search = prefs.search.with_limit(prefs.search.limit);
            watch_info!("Loaded preferences from {:?}", path);
            prefs
        }
        Err(err) => {
            watch_warn!("Failed to parse preferences from {:?}: {}", path, err);
            Preferences::default()
        }
    }
}

/// Writes to a temp file next to `path`, then renames it into place.
pub fn save(path: &Path, prefs: &Preferences) -> Result<(), PreferencesError> {
    let content = ron::ser::to_string_pretty(prefs, ron::ser::PrettyConfig::new())?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| PreferencesError::Io(err.error))?;

    watch_info!("Saved preferences to {:?}", path);
    Ok(())
}
