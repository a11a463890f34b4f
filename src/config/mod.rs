/// Configuration management for the benchmark-operator plugin
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::utils::command::EnvPolicy;

/// Plugin configuration
///
/// Every field has a default matching the plugin's stock behavior, so a
/// configuration file is only needed to override something.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Directory holding the benchmark-operator checkout (`make` runs here)
    pub operator_dir: PathBuf,

    /// Environment handed to the external tools: `replace` passes only the
    /// variables this plugin sets (KUBECONFIG), `merge` layers them over the
    /// plugin's own environment
    pub environment: EnvPolicy,

    /// `make` binary used to deploy/undeploy the operator
    pub make_bin: String,

    /// `kubectl` binary used to apply CR manifests
    pub kubectl_bin: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            operator_dir: PathBuf::from("benchmark-operator"),
            environment: EnvPolicy::Replace,
            make_bin: "make".to_string(),
            kubectl_bin: "kubectl".to_string(),
        }
    }
}

impl PluginConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PluginConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional path; no path means defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.operator_dir.as_os_str().is_empty() {
            anyhow::bail!("operator_dir cannot be empty");
        }

        if self.make_bin.is_empty() {
            anyhow::bail!("make_bin cannot be empty");
        }

        if self.kubectl_bin.is_empty() {
            anyhow::bail!("kubectl_bin cannot be empty");
        }

        Ok(())
    }
}
