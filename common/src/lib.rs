//! Shared building blocks for the blog services.
//!
//! - `auth`: credential hashing, bearer tokens, identity extraction and
//!   ownership checks
//! - `config`: environment-driven configuration
//! - `errors`: service error type and HTTP mapping
//! - `middleware`: request id and authentication gate
//! - `models`: user and post DTOs
//! - `response`: the JSON envelope every endpoint returns

pub mod auth;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
