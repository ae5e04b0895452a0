use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backend the CLI talks to when no flag or env var overrides it.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// `[server]` block from config.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

/// Top-level mna config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct MnaConfig {
    pub server: Option<ServerConfig>,
}

impl MnaConfig {
    /// Load config from `<home>/config.toml`. Returns default if file doesn't exist.
    pub fn load(home: &Path) -> Result<Self> {
        let path = config_path(home);
        if !path.exists() {
            return Ok(MnaConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: MnaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;
        Ok(config)
    }

    pub fn display(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref server) = self.server {
            lines.push("[server]".to_string());
            if let Some(ref url) = server.base_url {
                lines.push(format!("  base_url = \"{}\"", url));
            }
        }
        if lines.is_empty() {
            lines.push("(no overrides configured)".to_string());
        }
        lines.join("\n")
    }
}

/// Resolve the backend base URL: CLI flag (clap also feeds MNA_SERVER through
/// it) > config file > built-in default. Trailing slashes are stripped so
/// endpoint paths can be appended uniformly.
pub fn resolve_base_url(cli_flag: Option<&str>, config: &MnaConfig) -> String {
    let url = cli_flag
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            config
                .server
                .as_ref()
                .and_then(|s| s.base_url.clone())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    url.trim_end_matches('/').to_string()
}

/// State directory: `--home` / MNA_HOME override, else `~/.mna`.
pub fn data_dir(override_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir);
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".mna"))
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# mna config
# Backend resolution order: --server flag > MNA_SERVER env var > base_url here

[server]
# base_url = "http://localhost:8000"
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config(home: &Path) -> Result<bool> {
    let path = config_path(home);
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_config_template())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_config_beats_default() {
        let config = MnaConfig {
            server: Some(ServerConfig {
                base_url: Some("http://cfg:9000".to_string()),
            }),
        };
        assert_eq!(
            resolve_base_url(Some("http://flag:8080/"), &config),
            "http://flag:8080"
        );
        assert_eq!(resolve_base_url(None, &config), "http://cfg:9000");
        assert_eq!(
            resolve_base_url(None, &MnaConfig::default()),
            DEFAULT_BASE_URL
        );
    }

    #[test]
    fn init_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init_config(dir.path()).unwrap());
        assert!(!init_config(dir.path()).unwrap());
        let config = MnaConfig::load(dir.path()).unwrap();
        // Template ships with everything commented out.
        assert!(config.server.map_or(true, |s| s.base_url.is_none()));
    }

    #[test]
    fn missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = MnaConfig::load(dir.path()).unwrap();
        assert!(config.server.is_none());
    }
}
