use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the effective configuration")]
    Show,
}

pub fn handle(cmd: ConfigCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let storage_dir = config
                .storage_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|e| format!("<unavailable: {}>", e));

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "config": config,
                        "storage_dir": storage_dir,
                    }))?);
                }
                OutputFormat::Text => {
                    println!("Environment:  {:?}", config.environment);
                    println!("API URL:      {}", config.api.base_url);
                    println!("Timeout:      {}s", config.api.timeout_secs);
                    println!("Login route:  {}", config.session.login_route);
                    println!("Storage:      {}", storage_dir);
                }
            }
            Ok(())
        }
    }
}
