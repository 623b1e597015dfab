pub mod collaborative;
pub mod content;
pub mod popularity;
pub mod recommendations;
pub mod similarity_index;
pub mod text;

pub use collaborative::{CollaborativeRecommender, UserItemMatrix};
pub use content::ContentRecommender;
pub use popularity::top_ranked_articles;
pub use recommendations::{select_strategy, RecommendationEngine};
pub use similarity_index::{ContentModel, TextSimilarityIndex};
