//! Store configuration.
//!
//! Identifies the local principal and where the datasites mount lives.
//! Construct explicitly for tests and embedding, or load from the
//! environment with [`StoreConfig::from_env`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use syo_resolve::{DEFAULT_SEARCH_DEPTH, DEFAULT_STAGING_DIR};

/// Principal used when nothing identifies the local user.
pub const DEFAULT_OWNER: &str = "user@example.com";

/// Configuration for a [`crate::Registry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// The local principal. Owns everything this process creates.
    pub owner: String,
    /// Root of the datasites mount: `<datasites>/<owner>/<path>`.
    pub datasites: PathBuf,
    /// Working directory for relative paths and the heuristic search.
    pub cwd: PathBuf,
    /// Where inline content is staged before placement.
    pub staging_dir: PathBuf,
    /// Depth of the bounded recursive search.
    pub search_depth: usize,
    /// If set, collection refreshes only keep objects this principal may discover.
    pub viewer: Option<String>,
}

/// The fields of `~/.syftbox/config.json` this crate reads.
#[derive(Debug, Default, Deserialize)]
struct SyftBoxFile {
    email: Option<String>,
    data_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn new(
        owner: impl Into<String>,
        datasites: impl Into<PathBuf>,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        let cwd = cwd.into();
        Self {
            owner: owner.into(),
            datasites: datasites.into(),
            staging_dir: cwd.join(DEFAULT_STAGING_DIR),
            cwd,
            search_depth: DEFAULT_SEARCH_DEPTH,
            viewer: None,
        }
    }

    pub fn with_viewer(mut self, viewer: impl Into<String>) -> Self {
        self.viewer = Some(viewer.into());
        self
    }

    pub fn with_staging_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.staging_dir = self.cwd.join(dir);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SYFTBOX_EMAIL` (default: `email` from `~/.syftbox/config.json`, then `user@example.com`)
    /// - `SYFTBOX_DATASITES` (default: `<data_dir>/datasites` from the same file,
    ///   then `~/SyftBox/datasites`)
    /// - `SYO_STAGING_DIR` (default: `tmp`, relative to the working directory)
    /// - `SYO_SEARCH_DEPTH` (default: 4)
    /// - `SYO_VIEWER` (default: unset)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the working directory cannot be determined
    /// or a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;
        let home = dirs::home_dir();
        Self::from_lookup(|var| std::env::var(var).ok(), home.as_deref(), cwd)
    }

    /// Build from an arbitrary variable lookup and home directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unparsable `SYO_SEARCH_DEPTH`.
    pub fn from_lookup<F>(lookup: F, home: Option<&Path>, cwd: PathBuf) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = home.map(read_syftbox_file).unwrap_or_default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let owner = non_empty("SYFTBOX_EMAIL")
            .or(file.email)
            .unwrap_or_else(|| DEFAULT_OWNER.to_string());

        let datasites = match non_empty("SYFTBOX_DATASITES") {
            Some(dir) => cwd.join(dir),
            None => match (file.data_dir, home) {
                (Some(data_dir), _) => data_dir.join("datasites"),
                (None, Some(home)) => home.join("SyftBox").join("datasites"),
                (None, None) => cwd.join("datasites"),
            },
        };

        let staging_dir = cwd.join(
            non_empty("SYO_STAGING_DIR").unwrap_or_else(|| DEFAULT_STAGING_DIR.to_string()),
        );

        let search_depth = match non_empty("SYO_SEARCH_DEPTH") {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: "SYO_SEARCH_DEPTH".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_SEARCH_DEPTH,
        };

        Ok(Self {
            owner,
            datasites,
            cwd,
            staging_dir,
            search_depth,
            viewer: non_empty("SYO_VIEWER"),
        })
    }
}

fn read_syftbox_file(home: &Path) -> SyftBoxFile {
    let path = home.join(".syftbox").join("config.json");
    let Ok(text) = std::fs::read_to_string(&path) else {
        return SyftBoxFile::default();
    };
    match serde_json::from_str(&text) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "ignoring unreadable syftbox config"
            );
            SyftBoxFile::default()
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot determine working directory: {0}")]
    WorkingDirectory(std::io::Error),
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}
