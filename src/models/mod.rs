pub mod interaction;
pub mod recommendation;
pub mod similarity;

pub use interaction::{ArticleId, ArticleRow, InteractionRecord, UserId};
pub use recommendation::{Recommendation, Strategy, NO_LINK};
pub use similarity::{CachedSimilarity, SimilarityMatrix};
