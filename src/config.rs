use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use config::{ConfigError, Environment, File, FileFormat};

#[derive(Debug, Clone, Deserialize)]
pub struct HostSettings {
    pub name: String,
    pub address: String,
}

/// Settings for one special agent invocation: which agent, against which host, with which rule.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_agent")]
    pub agent: String,
    /// Directory holding the agent executables. Without it the binary only prints the command line.
    pub agent_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    pub host: HostSettings,
    pub params: Value,
}

fn default_agent() -> String {
    "agent_ucs_bladecenter".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Settings {
    pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
        let path = path.as_ref();
        config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Parses settings from a TOML string, still honouring environment overrides.
    pub fn from_toml_str(content: &str) -> Result<Settings, ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    pub fn executable_path(&self) -> Option<PathBuf> {
        self.agent_dir.as_ref().map(|dir| dir.join(&self.agent))
    }
}

fn environment() -> Environment {
    Environment::with_prefix("BLADECENTER").separator("__")
}
