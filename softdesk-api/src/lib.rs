//! # SoftDesk API Server Library
//!
//! HTTP layer of the SoftDesk issue tracker: accounts, projects, their
//! contributors, issues and comments.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `projection`: List and detail response shapes
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod projection;
pub mod routes;
