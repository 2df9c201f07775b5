use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const ENV_DATA_DIR: &str = "FINANCEPRO_DATA_DIR";
pub(crate) const ENV_REMOTE_DB: &str = "FINANCEPRO_REMOTE_DB";
pub(crate) const ENV_LOG: &str = "FINANCEPRO_LOG";
pub(crate) const ENV_BCRYPT_COST: &str = "FINANCEPRO_BCRYPT_COST";

const DEFAULT_LOG_FILTER: &str = "info";

/// Where things live and how they behave, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
    pub(crate) local_db: PathBuf,
    pub(crate) remote_db: PathBuf,
    pub(crate) log_file: PathBuf,
    pub(crate) log_filter: String,
    pub(crate) bcrypt_cost: u32,
}

impl Config {
    /// Resolve from the process environment and create the data directory.
    pub(crate) fn load() -> Result<Self> {
        let default_dir = directories::ProjectDirs::from("com", "financepro", "FinancePro")
            .map(|dirs| dirs.data_dir().to_path_buf());
        let config = Self::from_vars(|key| std::env::var(key).ok(), default_dir)?;
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                config.data_dir.display()
            )
        })?;
        Ok(config)
    }

    pub(crate) fn from_vars<F>(lookup: F, default_dir: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match var(ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_dir.ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?,
        };

        let remote_db = var(ENV_REMOTE_DB)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("cloud.db"));

        let bcrypt_cost = match var(ENV_BCRYPT_COST) {
            Some(raw) => {
                let cost: u32 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{ENV_BCRYPT_COST} must be a number, got '{raw}'"))?;
                if !(4..=31).contains(&cost) {
                    anyhow::bail!("{ENV_BCRYPT_COST} must be between 4 and 31, got {cost}");
                }
                cost
            }
            None => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            local_db: data_dir.join("financepro.db"),
            log_file: data_dir.join("financepro.log"),
            log_filter: var(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            remote_db,
            bcrypt_cost,
            data_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| map.get(key).cloned(), Some(PathBuf::from("/data/fp")))
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/fp"));
        assert_eq!(config.local_db, PathBuf::from("/data/fp/financepro.db"));
        assert_eq!(config.remote_db, PathBuf::from("/data/fp/cloud.db"));
        assert_eq!(config.log_file, PathBuf::from("/data/fp/financepro.log"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_overrides() {
        let config = resolve(&[
            (ENV_DATA_DIR, "/tmp/fp"),
            (ENV_REMOTE_DB, "/shared/drive/cloud.db"),
            (ENV_LOG, "financepro=debug"),
            (ENV_BCRYPT_COST, "6"),
        ])
        .unwrap();
        assert_eq!(config.local_db, PathBuf::from("/tmp/fp/financepro.db"));
        assert_eq!(config.remote_db, PathBuf::from("/shared/drive/cloud.db"));
        assert_eq!(config.log_filter, "financepro=debug");
        assert_eq!(config.bcrypt_cost, 6);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = resolve(&[(ENV_DATA_DIR, "  "), (ENV_LOG, "")]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/fp"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_bad_bcrypt_cost() {
        assert!(resolve(&[(ENV_BCRYPT_COST, "fast")]).is_err());
        assert!(resolve(&[(ENV_BCRYPT_COST, "2")]).is_err());
    }

    #[test]
    fn test_no_data_dir_at_all() {
        assert!(Config::from_vars(|_| None, None).is_err());
    }
}
