//! Article recommendation engine.
//!
//! Users with enough reading history get collaborative filtering over a binary
//! user-by-article matrix; users with little history get content-based suggestions
//! from TF-IDF text similarity; unknown users get the most-read articles.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::EngineConfig;
pub use db::InteractionDataset;
pub use error::{EngineError, EngineResult};
pub use models::{InteractionRecord, Recommendation, Strategy};
pub use services::RecommendationEngine;
