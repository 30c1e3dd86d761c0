//! Authenticated client and command-line front end for the institute admin API.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
