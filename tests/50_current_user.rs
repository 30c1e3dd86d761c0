mod common;

use anyhow::Result;
use serde_json::json;

use common::BackendState;
use institute_admin::session::SessionContext;

fn signed_in() -> Result<SessionContext> {
    let session = SessionContext::in_memory();
    session.set_token(common::GOOD_TOKEN)?;
    Ok(session)
}

#[tokio::test]
async fn primary_endpoint_answers() -> Result<()> {
    let backend = common::spawn_backend_with(BackendState {
        primary_me: true,
        ..Default::default()
    })
    .await?;
    let client = backend.client(signed_in()?);

    let user = client.current_user().await;
    assert_eq!(user, Some(json!({"id": "a1", "source": "primary"})));
    assert_eq!(backend.state.hits(), vec!["/api/auth/me"]);
    Ok(())
}

#[tokio::test]
async fn falls_back_to_legacy_endpoint() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let client = backend.client(signed_in()?);

    let user = client.current_user().await;
    assert_eq!(user, Some(json!({"id": "a1", "source": "legacy"})));
    assert_eq!(backend.state.hits(), vec!["/api/auth/me", "/api/admin/me"]);
    Ok(())
}

#[tokio::test]
async fn both_failing_yields_none() -> Result<()> {
    let backend = common::spawn_backend().await?;
    let client = backend.client(SessionContext::in_memory());

    assert_eq!(client.current_user().await, None);
    // One attempt each, no further retries
    assert_eq!(backend.state.hits(), vec!["/api/auth/me", "/api/admin/me"]);
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_yields_none() -> Result<()> {
    let base_url = common::closed_base_url().await?;
    let config = institute_admin::config::AppConfig::for_base_url(base_url);
    let client = institute_admin::api::ApiClient::new(&config, SessionContext::in_memory())?;

    assert_eq!(client.current_user().await, None);
    Ok(())
}
