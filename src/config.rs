// ⚙️ Configuration - actors, sales tax and shared items as data
// Loaded from a JSON file, falling back to defaults when absent

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default config file, relative to the working directory
pub const CONFIG_FILE: &str = "ledger.json";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "RECEIPT_SPLITTER_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// People who can split purchases, shown as checkboxes per row
    #[serde(default)]
    pub default_actors: Vec<String>,

    /// Sales tax as a fraction (0.0825 = 8.25%)
    #[serde(default)]
    pub sales_tax: f64,

    /// Items every default actor shares automatically when a receipt is opened
    #[serde(default, alias = "commie_list")]
    pub shared_items: Vec<String>,

    /// Directory scanned for `.csv` receipts
    #[serde(default = "default_receipts_dir")]
    pub receipts_dir: PathBuf,
}

fn default_receipts_dir() -> PathBuf {
    PathBuf::from("receipts")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_actors: Vec::new(),
            sales_tax: 0.0,
            shared_items: Vec::new(),
            receipts_dir: default_receipts_dir(),
        }
    }
}

/// Trim, lowercase, drop blanks and duplicates (first occurrence wins)
fn normalize_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

impl Config {
    /// Parse config JSON and normalise names
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(content).context("Failed to parse config JSON")?;
        config.normalized()
    }

    /// Load from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Config::from_json(&content)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))
    }

    /// Load from `$RECEIPT_SPLITTER_CONFIG` or `ledger.json`, defaults if neither exists
    pub fn load() -> Result<Self> {
        let path = Config::config_path();
        if path.exists() {
            info!(path = %path.display(), "loading config");
            Config::from_file(&path)
        } else {
            debug!(path = %path.display(), "config not found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    fn normalized(mut self) -> Result<Self> {
        if !self.sales_tax.is_finite() || self.sales_tax < 0.0 {
            bail!("sales_tax must be a non-negative number, got {}", self.sales_tax);
        }
        self.default_actors = normalize_names(&self.default_actors);
        self.shared_items = normalize_names(&self.shared_items);
        Ok(self)
    }

    /// Whether an item name is on the shared list (case-insensitive)
    pub fn is_shared_item(&self, item: &str) -> bool {
        let item = item.trim().to_lowercase();
        self.shared_items.iter().any(|s| *s == item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.default_actors.is_empty());
        assert_eq!(config.sales_tax, 0.0);
        assert_eq!(config.receipts_dir, PathBuf::from("receipts"));
    }

    #[test]
    fn test_parse_and_normalize() {
        let config = Config::from_json(
            r#"{
                "default_actors": ["Alice", " bob ", "ALICE", ""],
                "sales_tax": 0.0825,
                "shared_items": ["Paper Towels", "milk"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_actors, vec!["alice", "bob"]);
        assert_eq!(config.sales_tax, 0.0825);
        assert!(config.is_shared_item("paper towels"));
        assert!(config.is_shared_item(" MILK"));
        assert!(!config.is_shared_item("eggs"));
        assert_eq!(config.receipts_dir, PathBuf::from("receipts"));
    }

    #[test]
    fn test_commie_list_alias() {
        let config = Config::from_json(r#"{ "commie_list": ["Bread"] }"#).unwrap();
        assert_eq!(config.shared_items, vec!["bread"]);
    }

    #[test]
    fn test_negative_sales_tax_rejected() {
        assert!(Config::from_json(r#"{ "sales_tax": -1.0 }"#).is_err());
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(Config::from_json("default_actors = alice").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "default_actors": ["carol"], "receipts_dir": "scans" }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.default_actors, vec!["carol"]);
        assert_eq!(config.receipts_dir, PathBuf::from("scans"));
    }

    #[test]
    fn test_load_honours_config_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{ "default_actors": ["Dave"], "sales_tax": 0.07 }"#).unwrap();

        std::env::set_var(CONFIG_ENV, &path);
        let resolved = Config::config_path();
        let config = Config::load();
        std::env::remove_var(CONFIG_ENV);

        assert_eq!(resolved, path);
        let config = config.unwrap();
        assert_eq!(config.default_actors, vec!["dave"]);
        assert_eq!(config.sales_tax, 0.07);
    }
}
