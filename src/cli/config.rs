use std::sync::Arc;

use anyhow::Context;

use crate::api::{ApiClient, SessionExpired};
use crate::config::AppConfig;
use crate::session::{FileSessionStore, SessionContext};

/// Session persisted in the CLI's config directory
pub fn open_session(config: &AppConfig) -> anyhow::Result<SessionContext> {
    let dir = config.storage_dir()?;
    let store = FileSessionStore::open(&dir)
        .with_context(|| format!("failed to open session storage in {}", dir.display()))?;
    tracing::debug!("Using session file {}", store.path().display());
    Ok(SessionContext::new(Arc::new(store)))
}

/// Client wired to the on-disk session, with the CLI's expiry notice
pub fn build_client(config: &AppConfig) -> anyhow::Result<ApiClient> {
    let session = open_session(config)?;
    let client = ApiClient::new(config, session)
        .context("failed to initialize API client")?
        .on_session_expired(notify_session_expired);
    Ok(client)
}

fn notify_session_expired(event: &SessionExpired) {
    tracing::info!("Session expired, login route is {}", event.login_route);
    eprintln!(
        "Session expired ({}). Sign in again with `institute-admin auth login <email>`.",
        event.message
    );
}
