//! Configuration system for docktop

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub docker: DockerConfig,
    pub keybindings: KeybindingsConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("docktop").join("config.toml"))
    }

    /// Explicit path if given, else the default file when it exists, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: String,
    /// Seconds before a status message clears; 0 keeps it until overwritten
    pub status_ttl_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "monochrome".to_string(),
            status_ttl_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DockerConfig {
    pub socket: Option<String>,
    pub poll_interval_ms: u64,
    pub fetch_timeout_secs: u64,
    pub log_tail: usize,
    pub stop_timeout_secs: u32,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: None,
            poll_interval_ms: 1000,
            fetch_timeout_secs: 5,
            log_tail: 300,
            stop_timeout_secs: 10,
        }
    }
}

impl DockerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub quit: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub page_up: Vec<String>,
    pub page_down: Vec<String>,
    pub newest: Vec<String>,
    pub switch_panel: Vec<String>,
    pub start: Vec<String>,
    pub stop: Vec<String>,
    pub restart: Vec<String>,
    pub refresh: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "ctrl+c"]),
            up: keys(&["up", "k"]),
            down: keys(&["down", "j"]),
            page_up: keys(&["pageup"]),
            page_down: keys(&["pagedown"]),
            newest: keys(&["end"]),
            switch_panel: keys(&["tab"]),
            start: keys(&["u"]),
            stop: keys(&["s"]),
            restart: keys(&["r"]),
            refresh: keys(&["enter"]),
        }
    }
}

/// Write the default configuration file
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    Config::default().save(path)?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[docker]\npoll_interval_ms = 2500\n\n[keybindings]\nquit = [\"x\"]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.docker.poll_interval_ms, 2500);
        assert_eq!(config.docker.log_tail, 300);
        assert_eq!(config.display.theme, "monochrome");
        assert_eq!(config.keybindings.quit, vec!["x".to_string()]);
        assert_eq!(config.keybindings.stop, vec!["s".to_string()]);
    }

    #[test]
    fn save_then_load_preserves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.display.theme = "tokyo-night".to_string();
        config.docker.socket = Some("/tmp/docker.sock".to_string());

        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(init_config(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        init_config(&path, true).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[docker\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }

    #[test]
    fn durations_have_floors() {
        let docker = DockerConfig {
            poll_interval_ms: 0,
            fetch_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(docker.poll_interval(), Duration::from_millis(100));
        assert_eq!(docker.fetch_timeout(), Duration::from_secs(1));
    }
}
