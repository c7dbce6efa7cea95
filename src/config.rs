use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use sites_query_core::query::DEFAULT_LIMIT;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            templates_dir: default_templates_dir(),
            content_dir: default_content_dir(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_templates_dir() -> PathBuf {
    PathBuf::from("src/templates")
}
fn default_content_dir() -> PathBuf {
    PathBuf::from("src/content")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Template selected when the server starts.
    #[serde(default)]
    pub default_template: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_template: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8085".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Stop the variation fallback scan after this many files. 0 means unbounded.
    #[serde(default)]
    pub variation_scan_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            variation_scan_limit: 0,
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl QueryConfig {
    pub fn scan_limit(&self) -> Option<usize> {
        match self.variation_scan_limit {
            0 => None,
            n => Some(n),
        }
    }
}

impl Config {
    /// Defaults for commands that run without a config file.
    pub fn minimal() -> Self {
        Self {
            project: ProjectConfig::default(),
            server: ServerConfig::default(),
            query: QueryConfig::default(),
        }
    }

    /// Config rooted at `root` with default layout, used by tests and tooling.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::minimal();
        config.project.root = root.into();
        config
    }

    pub fn templates_path(&self) -> PathBuf {
        resolve(&self.project.root, &self.project.templates_dir)
    }

    pub fn content_path(&self) -> PathBuf {
        resolve(&self.project.root, &self.project.content_dir)
    }
}

fn resolve(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        root.join(dir)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.query.default_limit == 0 {
        anyhow::bail!("query.default_limit must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.query.default_limit, 10);
        assert_eq!(config.server.bind, "127.0.0.1:8085");
        assert!(config.query.scan_limit().is_none());
        assert_eq!(config.templates_path(), PathBuf::from("./src/templates"));
    }

    #[test]
    fn test_relative_and_absolute_dirs() {
        let config: Config = toml::from_str(
            r#"
[project]
root = "/work/site"
templates_dir = "tpl"
content_dir = "/srv/exports"

[query]
variation_scan_limit = 50
"#,
        )
        .unwrap();
        assert_eq!(config.templates_path(), PathBuf::from("/work/site/tpl"));
        assert_eq!(config.content_path(), PathBuf::from("/srv/exports"));
        assert_eq!(config.query.scan_limit(), Some(50));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config: Config = toml::from_str("[query]\ndefault_limit = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }
}
