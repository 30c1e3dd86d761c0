use std::io::Read;

use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::api::{Resource, ResourceApi};
use crate::cli::config::build_client;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List records in a collection")]
    List {
        #[arg(value_enum, help = "Collection")]
        resource: Resource,
        #[arg(long, help = "JSON object of query parameters (page, limit, search, ...)")]
        filter: Option<String>,
    },

    #[command(about = "Show a single record")]
    Get {
        #[arg(value_enum, help = "Collection")]
        resource: Resource,
        #[arg(help = "Record ID")]
        id: String,
    },

    #[command(about = "Create record from stdin")]
    Create {
        #[arg(value_enum, help = "Collection")]
        resource: Resource,
    },

    #[command(about = "Update record from stdin")]
    Update {
        #[arg(value_enum, help = "Collection")]
        resource: Resource,
        #[arg(help = "Record ID to update")]
        id: String,
    },

    #[command(about = "Delete record")]
    Delete {
        #[arg(value_enum, help = "Collection")]
        resource: Resource,
        #[arg(help = "Record ID to delete")]
        id: String,
    },
}

pub async fn handle(
    cmd: DataCommands,
    config: &AppConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let client = build_client(config)?;

    match cmd {
        DataCommands::List { resource, filter } => {
            let api = ResourceApi::new(&client, resource);
            let records = match filter {
                Some(filter) => api.list_with_query(&query_pairs(&filter)?).await?,
                None => api.list().await?,
            };

            if records.as_array().map_or(false, |items| items.is_empty()) {
                return output_empty_collection(
                    &output_format,
                    &resource.to_string(),
                    &format!("No {} found", resource),
                );
            }

            output_payload(&output_format, &resource.to_string(), &records)
        }
        DataCommands::Get { resource, id } => {
            let record = ResourceApi::new(&client, resource).fetch(&id).await?;
            output_payload(&output_format, "record", &record)
        }
        DataCommands::Create { resource } => {
            let body = read_stdin_json()?;
            let record = ResourceApi::new(&client, resource).create(&body).await?;
            output_success(
                &output_format,
                &format!("Created record in {}", resource),
                Some(json!({ "record": record })),
            )
        }
        DataCommands::Update { resource, id } => {
            let body = read_stdin_json()?;
            let record = ResourceApi::new(&client, resource).update(&id, &body).await?;
            output_success(
                &output_format,
                &format!("Updated {} record {}", resource, id),
                Some(json!({ "record": record })),
            )
        }
        DataCommands::Delete { resource, id } => {
            ResourceApi::new(&client, resource).remove(&id).await?;
            output_success(
                &output_format,
                &format!("Deleted {} record {}", resource, id),
                Some(json!({ "id": id })),
            )
        }
    }
}

fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read record from stdin")?;

    serde_json::from_str(&input).context("stdin is not valid JSON")
}
