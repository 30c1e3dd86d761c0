use clap::Subcommand;
use serde_json::json;

use crate::api::auth::{admin_login, logout, Credentials};
use crate::cli::config::{build_client, open_session};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub const PASSWORD_ENV: &str = "INSTITUTE_ADMIN_PASSWORD";

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in as an administrator")]
    Login {
        #[arg(help = "Admin email")]
        email: String,
        #[arg(long, help = "Password (falls back to INSTITUTE_ADMIN_PASSWORD)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(
    cmd: AuthCommands,
    config: &AppConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => std::env::var(PASSWORD_ENV).map_err(|_| {
                    anyhow::anyhow!("No password given; pass --password or set {}", PASSWORD_ENV)
                })?,
            };

            let client = build_client(config)?;
            let outcome = admin_login(&client, &Credentials { email: email.clone(), password }).await?;

            output_success(
                &output_format,
                &format!("Signed in as {}", email),
                Some(json!({ "user": outcome.user })),
            )
        }
        AuthCommands::Logout => {
            let client = build_client(config)?;
            logout(&client)?;
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Status => {
            let session = open_session(config)?;

            match session.token_key() {
                Some(key) => {
                    let user = session.user();
                    match output_format {
                        OutputFormat::Json => {
                            println!("{}", serde_json::to_string_pretty(&json!({
                                "authenticated": true,
                                "token_key": key,
                                "user": user,
                            }))?);
                        }
                        OutputFormat::Text => {
                            println!("Signed in (token stored under '{}')", key);
                            if let Some(user) = user {
                                println!("User: {}", user);
                            }
                        }
                    }
                }
                None => match output_format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&json!({
                            "authenticated": false
                        }))?);
                    }
                    OutputFormat::Text => println!("Not signed in"),
                },
            }

            Ok(())
        }
        AuthCommands::Whoami => {
            let client = build_client(config)?;

            match client.current_user().await {
                Some(user) => output_payload(&output_format, "user", &user),
                None => Err(anyhow::anyhow!("Could not determine the current user")),
            }
        }
    }
}
