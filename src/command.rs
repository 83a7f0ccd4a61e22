use log::{debug, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::special_agent::redact;

#[derive(Debug)]
pub enum CommandError {
    Spawn(std::io::Error),
    Timeout(Duration),
    Failed { code: Option<i32>, stderr: String },
    InvalidOutput(std::string::FromUtf8Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Spawn(e) => write!(f, "failed to run special agent: {}", e),
            CommandError::Timeout(d) => write!(f, "special agent timed out after {:?}", d),
            CommandError::Failed { code: Some(code), stderr } => {
                write!(f, "special agent exited with code {}: {}", code, stderr.trim())
            }
            CommandError::Failed { code: None, stderr } => {
                write!(f, "special agent terminated by signal: {}", stderr.trim())
            }
            CommandError::InvalidOutput(e) => write!(f, "special agent output is not UTF-8: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Spawn(e) => Some(e),
            CommandError::InvalidOutput(e) => Some(e),
            _ => None,
        }
    }
}

/// A fully built special agent invocation.
#[derive(Debug, Clone)]
pub struct AgentCommand {
    executable: PathBuf,
    args: Vec<String>,
}

impl AgentCommand {
    pub fn new(executable: PathBuf, args: Vec<String>) -> Self {
        AgentCommand { executable, args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Command line suitable for logs, with the password masked.
    pub fn display_redacted(&self) -> String {
        let mut line = self.executable.display().to_string();
        for arg in redact(&self.args) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }

    /// Runs the agent and returns whatever it wrote to stdout.
    pub async fn run(&self, limit: Duration) -> Result<String, CommandError> {
        info!("Running {}", self.display_redacted());

        let child = Command::new(&self.executable)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(CommandError::Spawn)?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result.map_err(CommandError::Spawn)?,
            Err(_) => {
                warn!("{} did not finish within {:?}", self.executable.display(), limit);
                return Err(CommandError::Timeout(limit));
            }
        };

        if !output.status.success() {
            return Err(CommandError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        debug!("{} wrote {} bytes", self.executable.display(), output.stdout.len());
        String::from_utf8(output.stdout).map_err(CommandError::InvalidOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> AgentCommand {
        AgentCommand::new(
            PathBuf::from("/opt/agents/agent_ucs_bladecenter"),
            args.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_display_redacted_masks_password() {
        let cmd = command(&["-u", "admin", "-p", "hunter2", "10.0.0.5"]);
        assert_eq!(
            cmd.display_redacted(),
            "/opt/agents/agent_ucs_bladecenter -u admin -p *** 10.0.0.5"
        );
        assert_eq!(cmd.args()[3], "hunter2");
    }

    #[test]
    fn test_display_redacted_never_shows_password() {
        for (username, password) in [("-p", "hunter2"), ("admin", "-p"), ("hunter2", "hunter2")] {
            let cmd = command(&["-u", username, "-p", password, "10.0.0.5"]);
            let line = cmd.display_redacted();
            let shown: Vec<&str> = line.split(' ').skip(1).collect();
            assert!(
                !shown.contains(&password),
                "password {:?} visible in {:?}",
                password,
                line
            );
            assert!(line.ends_with(" 10.0.0.5"));
        }
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let cmd = AgentCommand::new(PathBuf::from("/nonexistent/agent_ucs_bladecenter"), vec![]);
        let err = cmd.run(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn(_)));
    }
}
