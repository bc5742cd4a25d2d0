//! Configuration for bookshelf.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (BOOKSHELF_HOME, BOOKSHELF_DB)
//! 2. Config file (.bookshelf/config.yaml)
//! 3. Defaults (~/.bookshelf, ~/.bookshelf/books.db)
//!
//! Config file discovery:
//! - Searches current directory and parents for .bookshelf/config.yaml
//! - `paths.home` is relative to the .bookshelf directory, `paths.database`
//!   is relative to home

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::openlibrary::{DEFAULT_COVERS_URL, DEFAULT_SEARCH_URL};
use crate::adapters::OpenLibraryConfig;
use crate::core::ResolverPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".bookshelf";
const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_DB_FILE: &str = "books.db";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub lookup: Option<LookupConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the .bookshelf directory)
    pub home: Option<String>,
    /// Database file (relative to home)
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    pub search_url: Option<String>,
    pub covers_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub probe_concurrency: Option<usize>,
    pub strict_search: Option<bool>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Lookup service settings
    pub lookup: LookupSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub search_url: String,
    pub covers_url: String,
    pub timeout_seconds: u64,
    pub probe_concurrency: usize,
    pub strict_search: bool,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            covers_url: DEFAULT_COVERS_URL.to_string(),
            timeout_seconds: 10,
            probe_concurrency: 1,
            strict_search: false,
        }
    }
}

impl LookupSettings {
    fn from_file(config: Option<&LookupConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        Self {
            search_url: config.search_url.clone().unwrap_or(defaults.search_url),
            covers_url: config.covers_url.clone().unwrap_or(defaults.covers_url),
            timeout_seconds: config.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            probe_concurrency: config
                .probe_concurrency
                .unwrap_or(defaults.probe_concurrency)
                .max(1),
            strict_search: config.strict_search.unwrap_or(defaults.strict_search),
        }
    }

    /// HTTP client settings for the Open Library adapter
    pub fn client_config(&self) -> OpenLibraryConfig {
        OpenLibraryConfig {
            search_url: self.search_url.clone(),
            covers_url: self.covers_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }

    /// Resolver behaviour
    pub fn resolver_policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            probe_concurrency: self.probe_concurrency,
            strict_search: self.strict_search,
        }
    }
}

/// Environment overrides
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<PathBuf>,
    database: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("BOOKSHELF_HOME").ok().map(PathBuf::from),
            database: std::env::var("BOOKSHELF_DB").ok().map(PathBuf::from),
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn resolve(
    default_home: PathBuf,
    config_file: Option<PathBuf>,
    env: EnvOverrides,
) -> Result<ResolvedConfig> {
    let file = config_file.as_deref().map(load_config_file).transpose()?;

    let home = if let Some(home) = env.home {
        home
    } else if let (Some(config), Some(config_path)) = (&file, &config_file) {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        config
            .paths
            .home
            .as_deref()
            .map(|h| resolve_path(config_dir, h))
            .unwrap_or(default_home)
    } else {
        default_home
    };

    let database = if let Some(database) = env.database {
        database
    } else {
        let configured = file.as_ref().and_then(|c| c.paths.database.as_deref());
        resolve_path(&home, configured.unwrap_or(DEFAULT_DB_FILE))
    };

    let lookup = LookupSettings::from_file(file.as_ref().and_then(|c| c.lookup.as_ref()));

    Ok(ResolvedConfig {
        home,
        database,
        config_file,
        lookup,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_file(&cwd));

    resolve(default_home, config_file, EnvOverrides::from_env())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(
            PathBuf::from("/home/reader/.bookshelf"),
            None,
            EnvOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/home/reader/.bookshelf"));
        assert_eq!(
            config.database,
            PathBuf::from("/home/reader/.bookshelf/books.db")
        );
        assert!(config.config_file.is_none());
        assert_eq!(config.lookup, LookupSettings::default());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1.0"
paths:
  home: ./state
  database: catalog.sqlite
lookup:
  covers_url: http://localhost:8080
  timeout_seconds: 3
  probe_concurrency: 4
  strict_search: true
"#,
        );

        let config = resolve(
            PathBuf::from("/unused"),
            Some(path.clone()),
            EnvOverrides::default(),
        )
        .unwrap();

        let state = temp.path().join(CONFIG_DIR).join("./state");
        assert_eq!(config.home, state);
        assert_eq!(config.database, state.join("catalog.sqlite"));
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.lookup.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.lookup.covers_url, "http://localhost:8080");
        assert_eq!(
            config.lookup.resolver_policy(),
            ResolverPolicy {
                probe_concurrency: 4,
                strict_search: true,
            }
        );
        assert_eq!(
            config.lookup.client_config().timeout,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_env_overrides_win() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1.0"
paths:
  home: ./state
"#,
        );

        let config = resolve(
            PathBuf::from("/unused"),
            Some(path),
            EnvOverrides {
                home: Some(PathBuf::from("/srv/books")),
                database: Some(PathBuf::from("/tmp/test.db")),
            },
        )
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/srv/books"));
        assert_eq!(config.database, PathBuf::from("/tmp/test.db"));
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let settings = LookupSettings::from_file(Some(&LookupConfig {
            search_url: None,
            covers_url: None,
            timeout_seconds: None,
            probe_concurrency: Some(0),
            strict_search: None,
        }));
        assert_eq!(settings.probe_concurrency, 1);
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "version: \"1.0\"");
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_file(&nested), Some(path));
    }

    #[test]
    fn test_invalid_config_file_errors() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "paths: [not, a, map]");

        assert!(resolve(PathBuf::from("/unused"), Some(path), EnvOverrides::default()).is_err());
    }
}
