use log::{error, info};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/settings.toml".to_string());
    info!("Loading special agent settings from {}", settings_path);

    if let Err(e) = ucs_bladecenter_agent::main_logic(&settings_path).await {
        error!("Special agent invocation failed: {}", e);
        std::process::exit(1);
    }
}
