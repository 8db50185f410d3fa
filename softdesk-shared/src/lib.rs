//! # SoftDesk Shared Library
//!
//! Data layer and access rules shared by the SoftDesk API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: users, projects, contributors, issues and comments
//! - `auth`: passwords, tokens, the authenticated caller and the access policy
//! - `scoping`: path-id resolution and parent-scoped lookups

pub mod auth;
pub mod db;
pub mod models;
pub mod scoping;

/// Current version of the SoftDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
