// Normalized API client errors
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Message used when neither the body nor the transport says anything useful
pub const FALLBACK_MESSAGE: &str = "Unexpected error";

/// What actually went wrong underneath a normalized [`ApiError`]
#[derive(Debug, Error)]
pub enum FailureDetail {
    /// No usable response: DNS, refused connection, timeout, broken body stream
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("upstream responded with {status}")]
    Upstream {
        status: StatusCode,
        body: Option<Value>,
    },

    /// A success response whose payload did not have the expected shape
    #[error("unexpected response payload: {0}")]
    Payload(String),

    /// The request could not be built (bad path, bad header value)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Uniform failure shape for every request made through the client.
///
/// Callers read [`user_message`](Self::user_message) for display and
/// [`status`](Self::status) for branching; the underlying cause stays
/// reachable through [`detail`](Self::detail) and `Error::source`.
#[derive(Debug, Error)]
#[error("{user_message}")]
pub struct ApiError {
    status: Option<u16>,
    user_message: String,
    #[source]
    detail: FailureDetail,
}

impl ApiError {
    /// Failure where a response came back with a non-success status
    pub fn upstream(status: StatusCode, body: Option<Value>) -> Self {
        let transport_message = format!("Request failed with status code {}", status.as_u16());
        let user_message = user_message(body.as_ref(), Some(&transport_message));
        Self {
            status: Some(status.as_u16()),
            user_message,
            detail: FailureDetail::Upstream { status, body },
        }
    }

    /// Failure where no usable response exists, or the body stream broke
    pub fn transport(status: Option<StatusCode>, err: reqwest::Error) -> Self {
        let transport_message = transport_message(&err);
        Self {
            status: status.map(|s| s.as_u16()),
            user_message: user_message(None, Some(&transport_message)),
            detail: FailureDetail::Transport(err),
        }
    }

    pub fn payload(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: status.map(|s| s.as_u16()),
            user_message: user_message(None, Some(&message)),
            detail: FailureDetail::Payload(message),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: None,
            user_message: user_message(None, Some(&message)),
            detail: FailureDetail::InvalidRequest(message),
        }
    }

    /// HTTP status, absent for network failures
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Human-readable message, never empty
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn detail(&self) -> &FailureDetail {
        &self.detail
    }

    /// Error body returned by the backend, if any
    pub fn body(&self) -> Option<&Value> {
        match &self.detail {
            FailureDetail::Upstream { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// No response was received at all
    pub fn is_network(&self) -> bool {
        self.status.is_none() && matches!(self.detail, FailureDetail::Transport(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(&self.detail, FailureDetail::Transport(err) if err.is_timeout())
    }

    /// Stable code for machine-readable CLI output
    pub fn error_code(&self) -> &'static str {
        match (&self.detail, self.status) {
            (FailureDetail::Transport(err), _) if err.is_timeout() => "TIMEOUT",
            (FailureDetail::Transport(_), None) => "NETWORK_ERROR",
            (FailureDetail::InvalidRequest(_), _) => "INVALID_REQUEST",
            (FailureDetail::Payload(_), _) => "INVALID_PAYLOAD",
            (_, Some(400)) => "BAD_REQUEST",
            (_, Some(401)) => "UNAUTHORIZED",
            (_, Some(403)) => "FORBIDDEN",
            (_, Some(404)) => "NOT_FOUND",
            (_, Some(409)) => "CONFLICT",
            (_, Some(422)) => "UNPROCESSABLE_ENTITY",
            (_, Some(429)) => "TOO_MANY_REQUESTS",
            (_, Some(s)) if s >= 500 => "SERVER_ERROR",
            (_, Some(_)) => "CLIENT_ERROR",
            (_, None) => "NETWORK_ERROR",
        }
    }
}

/// Pick the message shown to a user: body `message`, body `error`, the
/// transport's own message, then [`FALLBACK_MESSAGE`]. Blank strings and
/// non-string fields are skipped.
pub fn user_message(body: Option<&Value>, transport_message: Option<&str>) -> String {
    body.and_then(|b| text_field(b, "message"))
        .or_else(|| body.and_then(|b| text_field(b, "error")))
        .or_else(|| non_blank(transport_message))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key) {
        Some(Value::String(s)) => non_blank(Some(s)),
        _ => None,
    }
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        "Network Error: could not connect to server".to_string()
    } else if err.is_body() || err.is_decode() {
        format!("Failed to read response: {}", err)
    } else {
        err.to_string()
    }
}
