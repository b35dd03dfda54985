//! Configuration file handling for saving and loading launch configs.
//!
//! Every field has a default matching the stock deployment, so a config file
//! is optional and a partial file is valid: only the deviations need to be
//! written down.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::InstallMode;

/// A declared environment variable requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVarSpec {
    /// Variable name (e.g., "OPENAI_API_KEY")
    pub name: String,

    /// Human-readable description shown in warnings and reports
    pub description: String,
}

impl EnvVarSpec {
    /// Create a new environment variable spec
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Check whether the variable is set to a non-empty value
    pub fn is_set(&self) -> bool {
        std::env::var(&self.name).map(|v| !v.is_empty()).unwrap_or(false)
    }
}

/// Launch configuration that can be saved/loaded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Interpreter override; discovery runs when unset
    #[serde(default)]
    pub python: Option<PathBuf>,

    /// Working directory for the entry point; the executable's own
    /// directory when unset
    #[serde(default)]
    pub app_root: Option<PathBuf>,

    /// Entry point, relative to the app root
    #[serde(default = "default_entry_point")]
    pub entry_point: PathBuf,

    /// Dependency manifest, relative to the app root
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,

    /// Modules probed before launch
    #[serde(default = "default_probe_modules")]
    pub probe_modules: Vec<String>,

    /// Dependency installation policy
    #[serde(default)]
    pub install: InstallMode,

    /// Environment variables warned about when unset
    #[serde(default = "default_required_env")]
    pub required_env: Vec<EnvVarSpec>,

    /// Environment variables noted at debug level when unset
    #[serde(default = "default_optional_env")]
    pub optional_env: Vec<EnvVarSpec>,
}

fn default_entry_point() -> PathBuf {
    PathBuf::from("api/run_api.py")
}

fn default_requirements() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_probe_modules() -> Vec<String> {
    vec![
        "fastapi".to_string(),
        "uvicorn".to_string(),
        "pydantic".to_string(),
    ]
}

fn default_required_env() -> Vec<EnvVarSpec> {
    vec![EnvVarSpec::new(
        "OPENAI_API_KEY",
        "API key used by the research agent's model calls",
    )]
}

fn default_optional_env() -> Vec<EnvVarSpec> {
    vec![
        EnvVarSpec::new("SEARCH_API_KEY", "Key for the Google search backend"),
        EnvVarSpec::new("GOOGLE_CX", "Google custom search engine id"),
    ]
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            python: None,
            app_root: None,
            entry_point: default_entry_point(),
            requirements: default_requirements(),
            probe_modules: default_probe_modules(),
            install: InstallMode::default(),
            required_env: default_required_env(),
            optional_env: default_optional_env(),
        }
    }
}

impl LaunchConfig {
    /// Create a new configuration with stock defaults
    #[allow(dead_code)] // API: Constructor for external consumers
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    #[allow(dead_code)] // API: Used to scaffold a config for editing
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate entry point
        if self.entry_point.as_os_str().is_empty() {
            anyhow::bail!("Entry point must be specified");
        }

        // Validate manifest path
        if self.requirements.as_os_str().is_empty() {
            anyhow::bail!("Requirements manifest path must be specified");
        }

        // Validate probe modules (dotted Python module paths)
        if self.probe_modules.is_empty() {
            anyhow::bail!("At least one probe module must be specified");
        }
        for module in &self.probe_modules {
            if !is_valid_module_path(module) {
                anyhow::bail!("Invalid probe module name: {:?}", module);
            }
        }

        // Validate environment variable names
        for spec in self.required_env.iter().chain(self.optional_env.iter()) {
            let name = spec.name.trim();
            if name.is_empty() {
                anyhow::bail!("Environment variable name cannot be empty");
            }
            if name.contains('=') || name.contains(char::is_whitespace) {
                anyhow::bail!("Invalid environment variable name: {:?}", spec.name);
            }
        }

        Ok(())
    }
}

/// Check a dotted Python module path: identifiers separated by single dots
fn is_valid_module_path(module: &str) -> bool {
    if module.is_empty() {
        return false;
    }
    module.split('.').all(|part| {
        !part.is_empty()
            && part
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic() || c == '_')
                .unwrap_or(false)
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_stock_deployment() {
        let config = LaunchConfig::default();
        assert_eq!(config.entry_point, PathBuf::from("api/run_api.py"));
        assert_eq!(config.requirements, PathBuf::from("requirements.txt"));
        assert_eq!(config.probe_modules, vec!["fastapi", "uvicorn", "pydantic"]);
        assert_eq!(config.install, InstallMode::Auto);
        assert_eq!(config.required_env.len(), 1);
        assert_eq!(config.required_env[0].name, "OPENAI_API_KEY");
        assert_eq!(config.optional_env.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LaunchConfig =
            serde_json::from_str(r#"{ "install": "never" }"#).unwrap();
        assert_eq!(config.install, InstallMode::Never);
        assert_eq!(config.entry_point, PathBuf::from("api/run_api.py"));
        assert_eq!(config.probe_modules.len(), 3);
    }

    #[test]
    fn test_validate_rejects_bad_module() {
        let mut config = LaunchConfig::default();
        config.probe_modules = vec!["fastapi; rm -rf /".to_string()];
        assert!(config.validate().is_err());

        config.probe_modules = vec!["9fastapi".to_string()];
        assert!(config.validate().is_err());

        config.probe_modules = vec!["a..b".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_dotted_module() {
        let mut config = LaunchConfig::default();
        config.probe_modules = vec!["uvicorn.workers".to_string(), "_private".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_env_name() {
        let mut config = LaunchConfig::default();
        config.required_env = vec![EnvVarSpec::new("BAD KEY", "spaces are not a name")];
        assert!(config.validate().is_err());

        config.required_env = vec![EnvVarSpec::new("", "empty")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_entry_point() {
        let mut config = LaunchConfig::default();
        config.entry_point = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
