use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{ApiClient, ApiResult};
use crate::error::ApiError;

pub const ADMIN_LOGIN_PATH: &str = "/auth/admin-login";

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Result of a successful admin login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: Option<Value>,
}

/// Sign in and persist the issued token (and user, when the backend sends it)
pub async fn admin_login(client: &ApiClient, credentials: &Credentials) -> ApiResult<LoginOutcome> {
    let response = client.post(ADMIN_LOGIN_PATH, credentials).await?;
    let status = response.status;
    let payload = response.into_payload();

    let login: LoginResponse = serde_json::from_value(payload)
        .map_err(|e| ApiError::payload(Some(status), format!("Unexpected login response: {}", e)))?;

    let token = login
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::payload(Some(status), "Login response did not include a token"))?;

    let session = client.session();
    session
        .set_token(&token)
        .map_err(|e| ApiError::payload(Some(status), format!("Failed to store session: {}", e)))?;

    let user = login.user.filter(|u| !u.is_null());
    if let Some(user) = &user {
        if let Err(e) = session.set_user(user) {
            tracing::warn!("Failed to cache signed-in user: {}", e);
        }
    }

    tracing::info!("Signed in as {}", credentials.email);
    Ok(LoginOutcome { token, user })
}

/// Forget the local session; the backend keeps no server-side session to end
pub fn logout(client: &ApiClient) -> Result<(), crate::session::SessionError> {
    client.session().clear_session()?;
    tracing::info!("Signed out");
    Ok(())
}
