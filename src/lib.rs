//! layoffwatch: a curated tracker of AI-attributed layoffs.
//!
//! Editors review news articles surfaced by a discovery provider and publish
//! verified layoff records to a public feed.

pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;

pub use config::Settings;
pub use error::{AppError, AppResult};
