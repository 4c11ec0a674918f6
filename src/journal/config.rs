use crate::error::MigrateError;
use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TABLE: &str = "entries";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub path: PathBuf,
    pub include: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./vault"),
            include: vec!["journal".to_string(), "daily".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
    pub table: String,
    pub user_id: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            table: DEFAULT_TABLE.to_string(),
            user_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrateConfig {
    pub vault: VaultConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialVaultConfig {
    path: Option<String>,
    include: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialStoreConfig {
    url: Option<String>,
    key: Option<String>,
    table: Option<String>,
    user_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PartialMigrateConfig {
    vault: Option<PartialVaultConfig>,
    store: Option<PartialStoreConfig>,
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if trimmed == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = trimmed.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(trimmed)
}

fn validate(cfg: &MigrateConfig) -> Result<()> {
    if cfg.store.url.trim().is_empty() || cfg.store.key.trim().is_empty() {
        return Err(MigrateError::MissingStoreConfig.into());
    }
    let url = cfg.store.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(MigrateError::InvalidConfig(format!(
            "store url must start with http:// or https://, got `{url}`"
        ))
        .into());
    }
    if cfg.store.table.trim().is_empty() {
        return Err(MigrateError::InvalidConfig("store table cannot be empty".into()).into());
    }
    if cfg.store.timeout_secs == 0 {
        return Err(
            MigrateError::InvalidConfig("store timeout must be >= 1 second".into()).into(),
        );
    }
    if cfg.vault.include.is_empty() {
        return Err(MigrateError::InvalidConfig(
            "journal include patterns cannot be empty".into(),
        )
        .into());
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Some(custom) = env_non_empty("JOURNAL_MIGRATE_CONFIG_PATH") {
        return Some(PathBuf::from(custom));
    }

    let base = dirs::config_dir()?;
    Some(base.join("journal-migrate").join("config.toml"))
}

fn merge_file_config(base: &mut MigrateConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| anyhow!("failed to read config {}: {err}", path.display()))?;
    let parsed: PartialMigrateConfig = toml::from_str(&raw).map_err(|err| {
        MigrateError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;

    if let Some(vault) = parsed.vault {
        if let Some(p) = vault.path {
            base.vault.path = expand_home(&p);
        }
        if let Some(include) = vault.include {
            base.vault.include = include
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
    if let Some(store) = parsed.store {
        if let Some(url) = store.url {
            base.store.url = url.trim().to_string();
        }
        if let Some(key) = store.key {
            base.store.key = key.trim().to_string();
        }
        if let Some(table) = store.table {
            base.store.table = table.trim().to_string();
        }
        if let Some(user_id) = store.user_id {
            let trimmed = user_id.trim();
            base.store.user_id = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(timeout) = store.timeout_secs {
            base.store.timeout_secs = timeout;
        }
    }
    Ok(())
}

fn merge_env(cfg: &mut MigrateConfig) {
    merge_env_from(cfg, |name| env::var(name).ok());
}

/// Applies environment overrides read through `lookup`. Blank values and
/// unparsable numbers leave the current value in place.
fn merge_env_from(cfg: &mut MigrateConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| non_blank(lookup(name));

    if let Some(vault) = get("OBSIDIAN_VAULT_PATH") {
        cfg.vault.path = expand_home(&vault);
    }
    if let Some(raw) = get("JOURNAL_MIGRATE_INCLUDE") {
        let include = split_csv(&raw);
        if !include.is_empty() {
            cfg.vault.include = include;
        }
    }
    if let Some(url) = get("SUPABASE_URL") {
        cfg.store.url = url;
    }
    if let Some(key) = get("SUPABASE_KEY") {
        cfg.store.key = key;
    }
    if let Some(table) = get("JOURNAL_MIGRATE_TABLE") {
        cfg.store.table = table;
    }
    if let Some(user_id) = get("JOURNAL_USER_ID") {
        cfg.store.user_id = Some(user_id);
    }
    if let Some(timeout) = get("JOURNAL_MIGRATE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        cfg.store.timeout_secs = timeout;
    }
}

/// Resolves configuration from defaults, the optional TOML file, the
/// environment and finally the `--vault` override, in that order.
pub fn load_config(vault_override: Option<&Path>) -> Result<MigrateConfig> {
    let mut cfg = MigrateConfig::default();
    if let Some(path) = resolve_config_path() {
        merge_file_config(&mut cfg, &path)?;
    }
    merge_env(&mut cfg);
    if let Some(vault) = vault_override {
        cfg.vault.path = vault.to_path_buf();
    }

    validate(&cfg)?;
    Ok(cfg)
}
