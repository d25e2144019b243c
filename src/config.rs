use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "foodscrape.db";
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FoodscrapeConfig {
    pub database: Option<String>,
    pub workers: Option<usize>,
    pub busy_timeout_ms: Option<u64>,
}

impl FoodscrapeConfig {
    /// Config written by `init`: every field filled with its default
    pub fn with_defaults(database: &Path) -> Self {
        Self {
            database: Some(database.to_string_lossy().to_string()),
            workers: Some(DEFAULT_WORKERS),
            busy_timeout_ms: Some(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// CLI value, then config value, then the default
    pub fn database_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    pub fn worker_count(&self, cli: Option<usize>) -> usize {
        cli.or(self.workers).unwrap_or(DEFAULT_WORKERS).max(1)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("foodscrape.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<FoodscrapeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FoodscrapeConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &FoodscrapeConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let config = FoodscrapeConfig {
            database: Some("from_config.db".to_string()),
            workers: Some(8),
            busy_timeout_ms: None,
        };

        assert_eq!(config.database_path(None), PathBuf::from("from_config.db"));
        assert_eq!(config.database_path(Some(PathBuf::from("cli.db"))), PathBuf::from("cli.db"));
        assert_eq!(config.worker_count(None), 8);
        assert_eq!(config.worker_count(Some(0)), 1);
        assert_eq!(config.busy_timeout(), Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));

        let empty = FoodscrapeConfig::default();
        assert_eq!(empty.database_path(None), PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(empty.worker_count(None), DEFAULT_WORKERS);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foodscrape.toml");
        let config = FoodscrapeConfig::with_defaults(Path::new("data/run.db"));

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("run.db");

        ensure_db_dir(&db).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
