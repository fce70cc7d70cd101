use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "deno-migrate.toml";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub src: PathBuf,
    pub extension: String,
    pub legacy_marker: String,
    pub new_marker: String,
    pub migrate: MigrateOptions,
}

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub backup_root: PathBuf,
    pub backup_prefix: String,
    pub deps_module: String,
}

// --- Raw TOML structures ---
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    src: Option<String>,
    extension: Option<String>,
    legacy_marker: Option<String>,
    new_marker: Option<String>,
    migrate: Option<MigrateToml>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct MigrateToml {
    backup_root: Option<String>,
    backup_prefix: Option<String>,
    deps_module: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_raw(ConfigToml::default())
    }
}

impl AppConfig {
    /// Load configuration. An explicit path must exist; without one the
    /// default file is used when present, otherwise built-in defaults apply.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: ConfigToml = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: ConfigToml) -> Self {
        let extension = raw
            .extension
            .map(|e| e.trim_start_matches('.').to_string())
            .unwrap_or_else(|| "ts".to_string());
        let mig = raw.migrate.unwrap_or_default();
        Self {
            src: raw.src.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("src")),
            extension,
            legacy_marker: raw.legacy_marker.unwrap_or_else(|| ".test".to_string()),
            new_marker: raw.new_marker.unwrap_or_else(|| "_test".to_string()),
            migrate: MigrateOptions {
                backup_root: mig
                    .backup_root
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(".")),
                backup_prefix: mig
                    .backup_prefix
                    .unwrap_or_else(|| "migration-backup-".to_string()),
                deps_module: mig.deps_module.unwrap_or_else(|| "deps.ts".to_string()),
            },
        }
    }

    /// Extension appended to import specifiers, with its leading dot (`.ts`).
    pub fn import_extension(&self) -> String {
        format!(".{}", self.extension)
    }

    /// Filename suffix of files still to be migrated (`.test.ts`).
    pub fn legacy_suffix(&self) -> String {
        format!("{}.{}", self.legacy_marker, self.extension)
    }

    /// Filename suffix of migrated files (`_test.ts`).
    pub fn new_suffix(&self) -> String {
        format!("{}.{}", self.new_marker, self.extension)
    }

    pub fn is_test_file_name(&self, name: &str) -> bool {
        name.ends_with(&self.legacy_suffix()) || name.ends_with(&self.new_suffix())
    }
}
