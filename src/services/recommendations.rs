use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::{CacheBackend, EngineConfig},
    db::{
        create_redis_client, FileSimilarityStore, InteractionDataset, RedisSimilarityStore,
        SimilarityStore,
    },
    error::EngineResult,
    models::{Recommendation, Strategy, UserId},
    services::{
        collaborative::CollaborativeRecommender,
        content::ContentRecommender,
        popularity::top_ranked_articles,
        similarity_index::{ContentModel, TextSimilarityIndex},
        text::{StopwordMatch, TfidfVectorizer, Tokenizer},
    },
};

/// Picks the strategy for a user
///
/// Unknown users get popular articles, users with at least `collaborative_threshold`
/// interaction rows get collaborative filtering, everyone else content similarity.
pub fn select_strategy(
    dataset: &InteractionDataset,
    user_id: UserId,
    collaborative_threshold: usize,
) -> Strategy {
    match dataset.interaction_count(user_id) {
        0 => Strategy::Popularity,
        n if n >= collaborative_threshold => Strategy::Collaborative,
        _ => Strategy::Content,
    }
}

/// Generates personalized article recommendations
///
/// Holds no per-user state: the dataset and user id are passed on every call. The only
/// shared state is the content similarity index, which is built once per corpus and
/// reused across requests.
pub struct RecommendationEngine {
    config: EngineConfig,
    collaborative: CollaborativeRecommender,
    content: ContentRecommender,
    content_model: ContentModel,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig, store: Option<Arc<dyn SimilarityStore>>) -> Self {
        let vectorizer = TfidfVectorizer::new(
            Tokenizer::new(StopwordMatch::Verbatim),
            config.lowercase_documents,
        );

        Self {
            collaborative: CollaborativeRecommender::new(
                config.user_similarity,
                config.strict_completeness,
            ),
            content: ContentRecommender::new(
                config.similarity_percentile,
                config.max_candidates_per_seed,
            ),
            content_model: ContentModel::new(vectorizer, store),
            config,
        }
    }

    /// Builds an engine with the similarity cache backend named in the configuration
    pub fn from_config(config: EngineConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let store: Option<Arc<dyn SimilarityStore>> = match config.cache_backend {
            CacheBackend::File => Some(Arc::new(FileSimilarityStore::new(&config.cache_path))),
            CacheBackend::Redis => {
                let client = create_redis_client(&config.redis_url)?;
                Some(Arc::new(RedisSimilarityStore::new(client)))
            }
            CacheBackend::None => None,
        };

        tracing::info!(
            backend = ?config.cache_backend,
            threshold = config.collaborative_threshold,
            "Recommendation engine configured"
        );

        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Up to `count` recommendations for `user_id`
    pub fn recommend(
        &self,
        dataset: &InteractionDataset,
        user_id: UserId,
        count: usize,
    ) -> EngineResult<Vec<Recommendation>> {
        self.recommend_with_strategy(dataset, user_id, count)
            .map(|(_, recommendations)| recommendations)
    }

    /// Same as [`recommend`](Self::recommend), also reporting the strategy used
    pub fn recommend_with_strategy(
        &self,
        dataset: &InteractionDataset,
        user_id: UserId,
        count: usize,
    ) -> EngineResult<(Strategy, Vec<Recommendation>)> {
        let span = tracing::info_span!("recommend", request_id = %Uuid::new_v4(), user_id);
        let _enter = span.enter();

        let strategy = select_strategy(dataset, user_id, self.config.collaborative_threshold);
        let recommendations = if count == 0 {
            Vec::new()
        } else {
            match strategy {
                Strategy::Popularity => top_ranked_articles(dataset, count),
                Strategy::Collaborative => self.collaborative.recommend(dataset, user_id, count),
                Strategy::Content => match self.content_model.index_for(dataset)? {
                    Some(index) => {
                        self.content
                            .recommend(&index, &dataset.user_titles(user_id), count)
                    }
                    None => Vec::new(),
                },
            }
        };

        tracing::info!(
            strategy = %strategy,
            requested = count,
            returned = recommendations.len(),
            "Recommendations generated"
        );

        Ok((strategy, recommendations))
    }

    /// Titles similar in content to `title`
    pub fn similar_articles(
        &self,
        dataset: &InteractionDataset,
        title: &str,
        count: usize,
    ) -> EngineResult<Vec<String>> {
        Ok(self
            .content_index(dataset)?
            .map(|index| self.content.similar_articles(&index, title, count))
            .unwrap_or_default())
    }

    /// The content similarity index for the dataset's corpus, `None` when it is empty
    pub fn content_index(
        &self,
        dataset: &InteractionDataset,
    ) -> EngineResult<Option<Arc<TextSimilarityIndex>>> {
        self.content_model.index_for(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::InteractionRecord;
    use proptest::prelude::*;
    use crate::models::Strategy;

    fn engine() -> RecommendationEngine {
        let config = EngineConfig {
            cache_backend: CacheBackend::None,
            similarity_percentile: 50.0,
            ..EngineConfig::default()
        };
        RecommendationEngine::new(config, None)
    }

    fn reads(user_id: UserId, articles: &[u64]) -> Vec<InteractionRecord> {
        articles
            .iter()
            .map(|&a| {
                InteractionRecord::new(
                    user_id,
                    a,
                    format!("Article {}", a),
                    Some(format!("topic{} notes", a % 3).as_str()),
                    Some(format!("http://a/{}", a).as_str()),
                )
            })
            .collect()
    }

    #[test]
    fn test_select_strategy_boundaries() {
        let mut records = reads(1, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        records.extend(reads(2, &[1, 2, 3, 4, 5, 6, 7, 8, 9]));
        records.extend(reads(3, &[1]));
        let dataset = InteractionDataset::new(records);

        assert_eq!(select_strategy(&dataset, 1, 10), Strategy::Collaborative);
        assert_eq!(select_strategy(&dataset, 2, 10), Strategy::Content);
        assert_eq!(select_strategy(&dataset, 3, 10), Strategy::Content);
        assert_eq!(select_strategy(&dataset, 4, 10), Strategy::Popularity);
    }

    #[test]
    fn test_rereads_count_toward_threshold() {
        let dataset = InteractionDataset::new(reads(1, &[7; 10]));
        assert_eq!(select_strategy(&dataset, 1, 10), Strategy::Collaborative);
    }

    #[test]
    fn test_zero_count_is_empty_for_every_strategy() {
        let mut records = reads(1, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        records.extend(reads(2, &[1, 2]));
        let dataset = InteractionDataset::new(records);
        let engine = engine();

        for user in [1, 2, 99] {
            assert!(engine.recommend(&dataset, user, 0).unwrap().is_empty());
        }
    }

    #[test]
    fn test_empty_dataset_returns_popularity_with_nothing() {
        let (strategy, recs) = engine()
            .recommend_with_strategy(&InteractionDataset::default(), 1, 5)
            .unwrap();
        assert_eq!(strategy, Strategy::Popularity);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_content_path_propagates_engine_unavailable() {
        let dataset =
            InteractionDataset::new(vec![InteractionRecord::new(1, 1, "The", None, None)]);
        let result = engine().recommend(&dataset, 1, 5);
        assert!(matches!(result, Err(EngineError::EngineUnavailable(_))));
    }

    #[test]
    fn test_from_config_without_cache() {
        let config = EngineConfig {
            cache_backend: CacheBackend::None,
            ..EngineConfig::default()
        };
        let engine = RecommendationEngine::from_config(config).unwrap();
        assert_eq!(engine.config().collaborative_threshold, 10);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = EngineConfig {
            similarity_percentile: -1.0,
            cache_backend: CacheBackend::None,
            ..EngineConfig::default()
        };
        assert!(RecommendationEngine::from_config(config).is_err());
    }

    proptest! {
        #[test]
        fn prop_recommend_is_idempotent(
            reads_by_user in proptest::collection::vec((0u64..5, 0u64..12), 1..60),
            target in 0u64..6,
            count in 0usize..8,
        ) {
            let dataset = InteractionDataset::new(
                reads_by_user.iter().flat_map(|&(u, a)| reads(u, &[a])).collect(),
            );
            let engine = engine();

            let first = engine.recommend(&dataset, target, count).unwrap();
            let second = engine.recommend(&dataset, target, count).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert!(first.len() <= count);
        }
    }
}
