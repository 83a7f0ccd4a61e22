use log::info;
use std::path::Path;
use std::time::Duration;

pub mod arguments;
pub mod command;
pub mod config;
pub mod special_agent;

use command::AgentCommand;
use special_agent::SpecialAgentRegistry;

/// Builds the agent command described by the settings file and either runs it or prints it.
pub async fn main_logic<P: AsRef<Path>>(settings_path: P) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config::Settings::load_settings(settings_path)?;
    let command = build_command(&settings, &SpecialAgentRegistry::builtin())?;

    match settings.executable_path() {
        Some(_) => {
            let output = command.run(Duration::from_secs(settings.timeout_seconds)).await?;
            print!("{}", output);
        }
        None => {
            info!("No agent_dir configured, not running the agent");
            println!("{}", command.display_redacted());
        }
    }
    Ok(())
}

pub fn build_command(
    settings: &config::Settings,
    registry: &SpecialAgentRegistry,
) -> Result<AgentCommand, Box<dyn std::error::Error>> {
    let agent = registry
        .get(&settings.agent)
        .ok_or_else(|| format!("unknown special agent: {}", settings.agent))?;
    let args = agent.arguments(&settings.params, &settings.host.name, &settings.host.address)?;
    let executable = settings
        .executable_path()
        .unwrap_or_else(|| agent.executable().into());
    Ok(AgentCommand::new(executable, args))
}
