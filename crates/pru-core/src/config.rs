use crate::CoreError;
use pru_runtime::index::DEFAULT_PYTHON;
use pru_runtime::{default_upgrade_command, IndexConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings shared by all workflows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PruConfig {
    /// Command the package names are appended to. Detected when unset.
    #[serde(default)]
    pub upgrade_command: Option<String>,
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default)]
    pub site_packages: Vec<PathBuf>,
    /// Pin whatever is installed even if the upgrade command fails.
    #[serde(default)]
    pub allow_upgrade_failure: bool,
}

fn default_python() -> String {
    DEFAULT_PYTHON.to_owned()
}

impl Default for PruConfig {
    fn default() -> Self {
        Self {
            upgrade_command: None,
            python: default_python(),
            site_packages: Vec::new(),
            allow_upgrade_failure: false,
        }
    }
}

impl PruConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Load `$PRU_CONFIG`, else `~/.config/pru/config.toml`. A missing default
    /// file yields the defaults; an explicitly named one must exist.
    pub fn load_default() -> Result<Self, CoreError> {
        if let Ok(explicit) = std::env::var("PRU_CONFIG") {
            return Self::load(Path::new(&explicit));
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!("loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            python: self.python.clone(),
            site_packages: self.site_packages.clone(),
        }
    }

    /// Whether the upgrade command was chosen by the user rather than detected.
    pub fn has_explicit_upgrade_command(&self) -> bool {
        self.upgrade_command.is_some()
    }

    pub fn upgrade_command(&self) -> String {
        self.upgrade_command
            .clone()
            .unwrap_or_else(default_upgrade_command)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/pru/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
upgrade_command = "pip install --upgrade --user"
python = "/opt/venv/bin/python"
site_packages = ["/opt/venv/lib/python3.12/site-packages"]
allow_upgrade_failure = true
"#,
        )
        .unwrap();

        let config = PruConfig::load(&path).unwrap();
        assert_eq!(
            config.upgrade_command(),
            "pip install --upgrade --user"
        );
        assert!(config.has_explicit_upgrade_command());
        assert_eq!(config.python, "/opt/venv/bin/python");
        assert!(config.allow_upgrade_failure);
        assert_eq!(
            config.index_config().site_packages,
            vec![PathBuf::from("/opt/venv/lib/python3.12/site-packages")]
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: PruConfig = toml::from_str("").unwrap();
        assert_eq!(config, PruConfig::default());
        assert_eq!(config.python, "python3");
        assert!(!config.has_explicit_upgrade_command());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<PruConfig>("pyhton = \"python3\"").is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PruConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().starts_with("config error:"));
    }
}
