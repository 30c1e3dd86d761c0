use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::api::resources::upload_file;
use crate::cli::config::build_client;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Args)]
pub struct UploadArgs {
    #[arg(help = "File to upload")]
    pub file: PathBuf,

    #[arg(long, default_value = "file", help = "Multipart field name")]
    pub field: String,
}

pub async fn handle(
    args: UploadArgs,
    config: &AppConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let uploaded = upload_file(&client, &args.file, &args.field).await?;

    output_success(
        &output_format,
        &format!("Uploaded {}", args.file.display()),
        Some(json!({ "upload": uploaded })),
    )
}
