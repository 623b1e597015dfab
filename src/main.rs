use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use article_recommender::{
    models::UserId, EngineConfig, InteractionDataset, Recommendation, RecommendationEngine,
    Strategy,
};

#[derive(Debug, Serialize)]
struct UserRecommendations {
    user_id: UserId,
    strategy: Strategy,
    recommendations: Vec<Recommendation>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env()?;

    let user_ids: Vec<UserId> = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<UserId>()
                .with_context(|| format!("Invalid user id: {}", arg))
        })
        .collect::<anyhow::Result<_>>()?;

    if user_ids.is_empty() {
        anyhow::bail!("Usage: article-recommender <user-id>...");
    }

    let dataset = Arc::new(
        InteractionDataset::from_json_path(&config.dataset_path)
            .with_context(|| format!("Failed to load dataset from {}", config.dataset_path))?,
    );
    let count = config.default_count;
    let engine = Arc::new(RecommendationEngine::from_config(config)?);

    // Each request is CPU-bound and reads the same immutable snapshot
    let tasks: Vec<_> = user_ids
        .into_iter()
        .map(|user_id| {
            let engine = Arc::clone(&engine);
            let dataset = Arc::clone(&dataset);
            tokio::task::spawn_blocking(move || {
                engine
                    .recommend_with_strategy(&dataset, user_id, count)
                    .map(|(strategy, recommendations)| UserRecommendations {
                        user_id,
                        strategy,
                        recommendations,
                    })
            })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        match task.await? {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!(error = %e, "Recommendation request failed"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
