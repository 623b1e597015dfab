use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

/// Environment variable prefix for all engine settings
pub const ENV_PREFIX: &str = "RECOMMENDER_";

/// How users are compared in the collaborative strategy
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserSimilarity {
    /// Raw co-read count. Biased toward users with many reads.
    #[default]
    Dot,
    /// Co-read count divided by the product of both presence vector norms
    Cosine,
}

/// Where the content similarity matrix is persisted between runs
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    File,
    Redis,
    None,
}

/// Engine configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Minimum interaction rows for the collaborative strategy (inclusive)
    #[serde(default = "default_collaborative_threshold")]
    pub collaborative_threshold: usize,

    /// Recommendations returned when the caller does not ask for a count
    #[serde(default = "default_count")]
    pub default_count: usize,

    /// Per-seed percentile cutoff used by the content strategy
    #[serde(default = "default_similarity_percentile")]
    pub similarity_percentile: f64,

    /// Upper bound on candidates taken from one seed row
    #[serde(default = "default_max_candidates_per_seed")]
    pub max_candidates_per_seed: usize,

    #[serde(default)]
    pub user_similarity: UserSimilarity,

    /// Drop rows missing a description or link before building the user-item matrix
    #[serde(default)]
    pub strict_completeness: bool,

    /// Lowercase article text before tokenizing
    #[serde(default = "default_lowercase_documents")]
    pub lowercase_documents: bool,

    #[serde(default)]
    pub cache_backend: CacheBackend,

    /// Similarity cache file (file backend)
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Redis connection URL (redis backend)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// JSON interaction dataset read by the binary
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
}

fn default_collaborative_threshold() -> usize {
    10
}

fn default_count() -> usize {
    10
}

fn default_similarity_percentile() -> f64 {
    99.0
}

fn default_max_candidates_per_seed() -> usize {
    256
}

fn default_lowercase_documents() -> bool {
    true
}

fn default_cache_path() -> String {
    "content_similarity.json".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_dataset_path() -> String {
    "data/interactions.json".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collaborative_threshold: default_collaborative_threshold(),
            default_count: default_count(),
            similarity_percentile: default_similarity_percentile(),
            max_candidates_per_seed: default_max_candidates_per_seed(),
            user_similarity: UserSimilarity::default(),
            strict_completeness: false,
            lowercase_documents: default_lowercase_documents(),
            cache_backend: CacheBackend::default(),
            cache_path: default_cache_path(),
            redis_url: default_redis_url(),
            dataset_path: default_dataset_path(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<EngineConfig>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot work with
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=100.0).contains(&self.similarity_percentile) {
            return Err(EngineError::InvalidInput(format!(
                "similarity_percentile must be within [0, 100], got {}",
                self.similarity_percentile
            )));
        }
        if self.collaborative_threshold == 0 {
            return Err(EngineError::InvalidInput(
                "collaborative_threshold must be at least 1".to_string(),
            ));
        }
        if self.max_candidates_per_seed == 0 {
            return Err(EngineError::InvalidInput(
                "max_candidates_per_seed must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.collaborative_threshold, 10);
        assert_eq!(config.similarity_percentile, 99.0);
        assert_eq!(config.user_similarity, UserSimilarity::Dot);
        assert_eq!(config.cache_backend, CacheBackend::File);
        assert!(config.lowercase_documents);
        assert!(!config.strict_completeness);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_iter_with_overrides() {
        let vars = vec![
            ("COLLABORATIVE_THRESHOLD".to_string(), "5".to_string()),
            ("USER_SIMILARITY".to_string(), "cosine".to_string()),
            ("CACHE_BACKEND".to_string(), "none".to_string()),
        ];
        let config: EngineConfig = envy::from_iter(vars).unwrap();

        assert_eq!(config.collaborative_threshold, 5);
        assert_eq!(config.user_similarity, UserSimilarity::Cosine);
        assert_eq!(config.cache_backend, CacheBackend::None);
        assert_eq!(config.default_count, 10);
    }

    #[test]
    fn test_validate_rejects_bad_percentile() {
        let config = EngineConfig {
            similarity_percentile: 120.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = EngineConfig {
            collaborative_threshold: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
