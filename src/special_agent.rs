use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::arguments::{self, ArgumentError};

pub type ArgumentFunc = fn(&Value, &str, &str) -> Result<Vec<String>, ArgumentError>;

/// A special agent known to the monitoring core.
#[derive(Debug, Clone)]
pub struct SpecialAgent {
    pub name: &'static str,
    pub argument_func: ArgumentFunc,
}

impl SpecialAgent {
    /// Name of the executable to invoke; agents are installed under their registry name.
    pub fn executable(&self) -> &str {
        self.name
    }

    pub fn arguments(&self, params: &Value, hostname: &str, address: &str) -> Result<Vec<String>, ArgumentError> {
        let args = (self.argument_func)(params, hostname, address)?;
        debug!("{} arguments for {}: {:?}", self.name, hostname, redact(&args));
        Ok(args)
    }
}

/// Masks every occurrence of the password so credentials stay out of logs.
///
/// Builder output (`-u USER -p PASSWORD ...`) is matched by position, so a
/// username or password that is itself `-p` can't shift the mask. Any other
/// shape falls back to treating each token after a `-p` as a password.
pub fn redact(args: &[String]) -> Vec<String> {
    let secrets: Vec<&str> = if args.len() >= 4 && args[0] == "-u" && args[2] == "-p" {
        vec![args[3].as_str()]
    } else {
        args.windows(2)
            .filter(|pair| pair[0] == "-p")
            .map(|pair| pair[1].as_str())
            .collect()
    };
    args.iter()
        .map(|arg| {
            if secrets.contains(&arg.as_str()) {
                "***".to_string()
            } else {
                arg.clone()
            }
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct SpecialAgentRegistry {
    agents: BTreeMap<&'static str, SpecialAgent>,
}

impl SpecialAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SpecialAgent {
            name: "agent_ucs_bladecenter",
            argument_func: arguments::argument_func,
        });
        registry
    }

    /// Adds an agent, replacing any previous one with the same name.
    pub fn register(&mut self, agent: SpecialAgent) -> Option<SpecialAgent> {
        self.agents.insert(agent.name, agent)
    }

    pub fn get(&self, name: &str) -> Option<&SpecialAgent> {
        self.agents.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.agents.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_args(_params: &Value, _hostname: &str, address: &str) -> Result<Vec<String>, ArgumentError> {
        Ok(vec![address.to_string()])
    }

    #[test]
    fn test_builtin_contains_bladecenter() {
        let registry = SpecialAgentRegistry::builtin();
        let agent = registry.get("agent_ucs_bladecenter").expect("agent registered");
        assert_eq!(agent.executable(), "agent_ucs_bladecenter");
        assert!(registry.get("agent_unknown").is_none());
    }

    #[test]
    fn test_register_replaces_and_sorts() {
        let mut registry = SpecialAgentRegistry::builtin();
        registry.register(SpecialAgent { name: "agent_alpha", argument_func: fixed_args });
        let previous = registry.register(SpecialAgent {
            name: "agent_ucs_bladecenter",
            argument_func: fixed_args,
        });
        assert!(previous.is_some());
        assert_eq!(registry.names(), vec!["agent_alpha", "agent_ucs_bladecenter"]);

        let args = registry
            .get("agent_ucs_bladecenter")
            .unwrap()
            .arguments(&json!({}), "host", "address")
            .unwrap();
        assert_eq!(args, vec!["address"]);
    }

    #[test]
    fn test_redact_hides_password_only() {
        let args: Vec<String> = ["-u", "admin", "-p", "hunter2", "10.0.0.5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(redact(&args), vec!["-u", "admin", "-p", "***", "10.0.0.5"]);
    }

    fn bladecenter_args(username: &str, password: &str) -> Vec<String> {
        SpecialAgentRegistry::builtin()
            .get("agent_ucs_bladecenter")
            .unwrap()
            .arguments(&json!({"username": username, "password": password}), "host", "address")
            .unwrap()
    }

    #[test]
    fn test_redact_username_that_looks_like_flag() {
        let redacted = redact(&bladecenter_args("-p", "hunter2"));
        assert_eq!(redacted, vec!["-u", "-p", "-p", "***", "address"]);
        assert!(!redacted.iter().any(|arg| arg == "hunter2"));
    }

    #[test]
    fn test_redact_password_that_looks_like_flag() {
        let redacted = redact(&bladecenter_args("admin", "-p"));
        assert_eq!(redacted, vec!["-u", "admin", "***", "***", "address"]);
    }

    #[test]
    fn test_redact_password_repeated_as_username() {
        let redacted = redact(&bladecenter_args("hunter2", "hunter2"));
        assert_eq!(redacted, vec!["-u", "***", "-p", "***", "address"]);
    }

    #[test]
    fn test_redact_fallback_for_other_shapes() {
        let args: Vec<String> = ["--verbose", "-p", "hunter2", "-p", "swordfish", "hunter2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(redact(&args), vec!["--verbose", "-p", "***", "-p", "***", "***"]);
    }
}
