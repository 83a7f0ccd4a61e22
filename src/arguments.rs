use serde::de::{self, Deserializer, Unexpected};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Rule parameters for the UCS BladeCenter special agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentParams {
    pub username: String,
    pub password: String,
    #[serde(default = "default_certificate_validation", deserialize_with = "bool_or_string")]
    pub certificate_validation: bool,
}

fn default_certificate_validation() -> bool {
    true
}

// Environment overrides arrive as strings.
fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => text
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&text), &"true or false")),
    }
}

/// Error raised when a rule mapping can't be turned into agent arguments.
#[derive(Debug)]
pub enum ArgumentError {
    InvalidParams(serde_json::Error),
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentError::InvalidParams(e) => write!(f, "invalid special agent parameters: {}", e),
        }
    }
}

impl std::error::Error for ArgumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgumentError::InvalidParams(e) => Some(e),
        }
    }
}

impl AgentParams {
    pub fn from_value(params: &Value) -> Result<Self, ArgumentError> {
        AgentParams::deserialize(params).map_err(ArgumentError::InvalidParams)
    }
}

/// Builds the command line for `agent_ucs_bladecenter`.
///
/// The hostname is accepted for signature compatibility with other special
/// agents but never ends up in the output. The address is always last.
pub fn agent_arguments(params: &AgentParams, _hostname: &str, address: &str) -> Vec<String> {
    let mut args = vec![
        "-u".to_string(),
        params.username.clone(),
        "-p".to_string(),
        params.password.clone(),
    ];
    if !params.certificate_validation {
        args.push("--no-cert-check".to_string());
    }
    args.push(address.to_string());
    args
}

/// Untyped entry point taking the raw rule mapping.
pub fn argument_func(params: &Value, hostname: &str, address: &str) -> Result<Vec<String>, ArgumentError> {
    let params = AgentParams::from_value(params)?;
    Ok(agent_arguments(&params, hostname, address))
}
