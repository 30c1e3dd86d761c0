//! Client for the institute admin REST backend.
//!
//! [`ApiClient`] owns the request pipeline: bearer-token attachment before
//! every request, normalization of every failure into [`ApiError`], and
//! session teardown on 401. [`unwrap`] strips the optional `{ data: ... }`
//! envelope so callers always see the payload itself.

pub mod auth;
pub mod client;
pub mod envelope;
pub mod resources;

pub use client::{
    unwrap, unwrap_as, ApiClient, ApiResponse, ApiResult, ClientBuildError, SessionExpired,
    SessionExpiredHook, CURRENT_USER_PATH, LEGACY_CURRENT_USER_PATH,
};
pub use envelope::{unwrap_body, Body};
pub use resources::{Resource, ResourceApi};

pub use crate::error::{ApiError, FailureDetail};
