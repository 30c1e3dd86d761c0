use clap::Parser;
use institute_admin::cli::utils::output_error;
use institute_admin::cli::{Cli, OutputFormat};
use institute_admin::error::ApiError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so INSTITUTE_API_URL and friends apply
    let _ = dotenvy::dotenv();

    let config = institute_admin::config::config();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting institute-admin in {:?} mode against {}", config.environment, config.api.base_url);

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = institute_admin::cli::run(cli).await {
        match (&output_format, e.downcast_ref::<ApiError>()) {
            (OutputFormat::Json, Some(api_err)) => {
                output_error(&output_format, api_err.user_message(), Some(api_err.error_code()), api_err.status())?;
            }
            (OutputFormat::Json, None) => {
                output_error(&output_format, &e.to_string(), None, None)?;
            }
            _ => match std::env::var("CLI_VERBOSE").as_deref() {
                Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
                _ => eprintln!("Error: {e}"),
            },
        }
        std::process::exit(1);
    }

    Ok(())
}
