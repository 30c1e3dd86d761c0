pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "institute-admin")]
#[command(about = "Institute admin CLI - command-line client for the institute/franchise admin API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Record operations on admin collections")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },

    #[command(about = "Upload a file to the backend")]
    Upload(commands::upload::UploadArgs),

    #[command(about = "Inspect client configuration")]
    Config {
        #[command(subcommand)]
        cmd: commands::config::ConfigCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let app_config = crate::config::config();

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, app_config, output_format).await,
        Commands::Data { cmd } => commands::data::handle(cmd, app_config, output_format).await,
        Commands::Upload(args) => commands::upload::handle(args, app_config, output_format).await,
        Commands::Config { cmd } => commands::config::handle(cmd, app_config, output_format),
    }
}
