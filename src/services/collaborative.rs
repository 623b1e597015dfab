use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    config::UserSimilarity,
    db::InteractionDataset,
    models::{ArticleId, InteractionRecord, Recommendation, UserId},
};

/// Binary user-by-article presence matrix
///
/// Users and articles are indexed in ascending id order. A cell is 1.0 when the user
/// read the article at least once and 0.0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct UserItemMatrix {
    users: Vec<UserId>,
    articles: Vec<ArticleId>,
    user_index: HashMap<UserId, usize>,
    article_index: HashMap<ArticleId, usize>,
    cells: Vec<f64>,
}

impl UserItemMatrix {
    pub fn build<'a>(records: impl IntoIterator<Item = &'a InteractionRecord>) -> Self {
        let mut pairs: BTreeMap<UserId, HashSet<ArticleId>> = BTreeMap::new();
        let mut article_ids: HashSet<ArticleId> = HashSet::new();
        for record in records {
            pairs
                .entry(record.user_id)
                .or_default()
                .insert(record.article_id);
            article_ids.insert(record.article_id);
        }

        let users: Vec<UserId> = pairs.keys().copied().collect();
        let mut articles: Vec<ArticleId> = article_ids.into_iter().collect();
        articles.sort_unstable();

        let user_index: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let article_index: HashMap<ArticleId, usize> =
            articles.iter().enumerate().map(|(i, &a)| (a, i)).collect();

        let mut cells = vec![0.0; users.len() * articles.len()];
        for (user, read) in &pairs {
            let row = user_index[user];
            for article in read {
                cells[row * articles.len() + article_index[article]] = 1.0;
            }
        }

        Self {
            users,
            articles,
            user_index,
            article_index,
            cells,
        }
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn articles(&self) -> &[ArticleId] {
        &self.articles
    }

    pub fn row(&self, user_id: UserId) -> Option<&[f64]> {
        let row = *self.user_index.get(&user_id)?;
        let width = self.articles.len();
        Some(&self.cells[row * width..(row + 1) * width])
    }

    pub fn get(&self, user_id: UserId, article_id: ArticleId) -> f64 {
        match (self.row(user_id), self.article_index.get(&article_id)) {
            (Some(row), Some(&col)) => row[col],
            _ => 0.0,
        }
    }

    /// Every other user scored against `user_id`, most similar first
    ///
    /// Equal scores are ordered by ascending user id. Returns an empty list when the
    /// user is not in the matrix.
    pub fn similar_users(&self, user_id: UserId, metric: UserSimilarity) -> Vec<(UserId, f64)> {
        let Some(target) = self.row(user_id) else {
            return Vec::new();
        };
        let target_norm = norm(target);

        let mut scored: Vec<(UserId, f64)> = self
            .users
            .iter()
            .filter(|&&other| other != user_id)
            .filter_map(|&other| {
                let row = self.row(other)?;
                let dot: f64 = row.iter().zip(target).map(|(a, b)| a * b).sum();
                let score = match metric {
                    UserSimilarity::Dot => dot,
                    UserSimilarity::Cosine => {
                        let denominator = norm(row) * target_norm;
                        if denominator > 0.0 {
                            dot / denominator
                        } else {
                            0.0
                        }
                    }
                };
                Some((other, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
    }
}

fn norm(row: &[f64]) -> f64 {
    row.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Articles each user read, most-read first
///
/// Ties keep the order in which the user first read the articles.
fn most_viewed_by_user(records: &[&InteractionRecord]) -> HashMap<UserId, Vec<ArticleId>> {
    // (count, first position) per (user, article)
    let mut counts: HashMap<UserId, HashMap<ArticleId, (usize, usize)>> = HashMap::new();
    for (position, record) in records.iter().enumerate() {
        let entry = counts
            .entry(record.user_id)
            .or_default()
            .entry(record.article_id)
            .or_insert((0, position));
        entry.0 += 1;
    }

    counts
        .into_iter()
        .map(|(user, articles)| {
            let mut ranked: Vec<(ArticleId, (usize, usize))> = articles.into_iter().collect();
            ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
            (user, ranked.into_iter().map(|(article, _)| article).collect())
        })
        .collect()
}

/// Recommends articles read by the users whose reading history overlaps most with
/// the target user's
#[derive(Debug, Clone, Copy)]
pub struct CollaborativeRecommender {
    metric: UserSimilarity,
    strict_completeness: bool,
}

impl Default for CollaborativeRecommender {
    fn default() -> Self {
        Self::new(UserSimilarity::Dot, false)
    }
}

impl CollaborativeRecommender {
    pub fn new(metric: UserSimilarity, strict_completeness: bool) -> Self {
        Self {
            metric,
            strict_completeness,
        }
    }

    /// Rows taking part in the similarity computation
    ///
    /// Every record carries a user and article id. In strict mode records missing a
    /// description or link are dropped as well.
    fn usable_records<'a>(&self, dataset: &'a InteractionDataset) -> Vec<&'a InteractionRecord> {
        dataset
            .records()
            .iter()
            .filter(|r| !self.strict_completeness || r.is_complete())
            .collect()
    }

    /// Ranked article ids for `user_id`, at most `count`
    pub fn recommend_article_ids(
        &self,
        dataset: &InteractionDataset,
        user_id: UserId,
        count: usize,
    ) -> Vec<ArticleId> {
        if count == 0 {
            return Vec::new();
        }

        let records = self.usable_records(dataset);
        let matrix = UserItemMatrix::build(records.iter().copied());
        let similar_users = matrix.similar_users(user_id, self.metric);
        if similar_users.is_empty() {
            return Vec::new();
        }

        let most_viewed = most_viewed_by_user(&records);
        let already_read: HashSet<ArticleId> = most_viewed
            .get(&user_id)
            .map(|articles| articles.iter().copied().collect())
            .unwrap_or_default();

        let mut recommendations: Vec<ArticleId> = Vec::new();
        'users: for (similar_user, _) in &similar_users {
            let Some(candidates) = most_viewed.get(similar_user) else {
                continue;
            };
            for &article in candidates {
                if !recommendations.contains(&article) && !already_read.contains(&article) {
                    recommendations.push(article);
                }
                if recommendations.len() >= count {
                    break 'users;
                }
            }
        }

        tracing::debug!(
            user_id,
            similar_users = similar_users.len(),
            found = recommendations.len(),
            "Collaborative candidates collected"
        );

        recommendations
    }

    /// Up to `count` recommendations for `user_id`, most relevant first
    pub fn recommend(
        &self,
        dataset: &InteractionDataset,
        user_id: UserId,
        count: usize,
    ) -> Vec<Recommendation> {
        let article_ids = self.recommend_article_ids(dataset, user_id, count);
        let records = self.usable_records(dataset);

        let mut titles: HashSet<String> = HashSet::new();
        article_ids
            .into_iter()
            .filter_map(|article_id| {
                records
                    .iter()
                    .copied()
                    .find(|r| r.article_id == article_id)
            })
            .filter(|record| titles.insert(record.title.clone()))
            .map(|record| {
                Recommendation::new(
                    record.title.clone(),
                    record.description_or_empty(),
                    record.link_or_empty(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read(user_id: UserId, article_id: ArticleId) -> InteractionRecord {
        InteractionRecord::new(
            user_id,
            article_id,
            format!("Article {}", article_id),
            Some("desc"),
            Some("http://link"),
        )
    }

    #[test]
    fn test_matrix_marks_presence_not_counts() {
        let records = vec![read(1, 10), read(1, 10), read(1, 10), read(2, 20)];
        let matrix = UserItemMatrix::build(&records);

        assert_eq!(matrix.users(), &[1, 2]);
        assert_eq!(matrix.articles(), &[10, 20]);
        assert_eq!(matrix.get(1, 10), 1.0);
        assert_eq!(matrix.get(1, 20), 0.0);
        assert_eq!(matrix.get(2, 20), 1.0);
        assert_eq!(matrix.row(1), Some(&[1.0, 0.0][..]));
        assert_eq!(matrix.row(3), None);
    }

    #[test]
    fn test_similar_users_dot_product_with_id_tiebreak() {
        let records = vec![
            read(1, 1),
            read(1, 2),
            read(1, 3),
            read(4, 1),
            read(2, 1),
            read(2, 2),
            read(3, 1),
            read(5, 9),
        ];
        let matrix = UserItemMatrix::build(&records);
        let similar = matrix.similar_users(1, UserSimilarity::Dot);

        assert_eq!(similar, vec![(2, 2.0), (3, 1.0), (4, 1.0), (5, 0.0)]);
    }

    #[test]
    fn test_cosine_favors_proportional_overlap() {
        // User 2 shares one article and read nothing else; user 3 shares two of many
        let mut records = vec![read(1, 1), read(1, 2), read(2, 1), read(3, 1), read(3, 2)];
        for article in 100..120 {
            records.push(read(3, article));
        }
        let matrix = UserItemMatrix::build(&records);

        let dot = matrix.similar_users(1, UserSimilarity::Dot);
        assert_eq!(dot[0].0, 3);

        let cosine = matrix.similar_users(1, UserSimilarity::Cosine);
        assert_eq!(cosine[0].0, 2);
    }

    #[test]
    fn test_unknown_target_has_no_similar_users() {
        let records = vec![read(1, 1)];
        let matrix = UserItemMatrix::build(&records);
        assert!(matrix.similar_users(42, UserSimilarity::Dot).is_empty());
    }

    #[test]
    fn test_candidates_follow_similar_users_read_frequency() {
        let dataset = InteractionDataset::new(vec![
            read(1, 1),
            read(1, 2),
            read(2, 1),
            read(2, 2),
            read(2, 7),
            read(2, 8),
            read(2, 8),
            read(3, 1),
            read(3, 9),
        ]);

        let ids = CollaborativeRecommender::default().recommend_article_ids(&dataset, 1, 10);
        // User 2 (2 shared) before user 3 (1 shared); article 8 read twice by user 2
        assert_eq!(ids, vec![8, 7, 9]);
    }

    #[test]
    fn test_count_limits_results() {
        let dataset = InteractionDataset::new(vec![
            read(1, 1),
            read(2, 1),
            read(2, 2),
            read(2, 3),
            read(2, 4),
        ]);
        let recs = CollaborativeRecommender::default().recommend(&dataset, 1, 2);
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_zero_count_and_unknown_user_are_empty() {
        let dataset = InteractionDataset::new(vec![read(1, 1), read(2, 2)]);
        let recommender = CollaborativeRecommender::default();
        assert!(recommender.recommend(&dataset, 1, 0).is_empty());
        assert!(recommender.recommend(&dataset, 99, 5).is_empty());
    }

    #[test]
    fn test_missing_metadata_becomes_empty_string() {
        let dataset = InteractionDataset::new(vec![
            read(1, 1),
            read(2, 1),
            InteractionRecord::new(2, 5, "No metadata", None, None),
        ]);

        let recs = CollaborativeRecommender::default().recommend(&dataset, 1, 5);
        assert_eq!(recs, vec![Recommendation::new("No metadata", "", "")]);
    }

    #[test]
    fn test_strict_completeness_drops_incomplete_rows() {
        let dataset = InteractionDataset::new(vec![
            read(1, 1),
            read(2, 1),
            InteractionRecord::new(2, 5, "No metadata", None, None),
            read(2, 6),
        ]);

        let strict = CollaborativeRecommender::new(UserSimilarity::Dot, true);
        let recs = strict.recommend(&dataset, 1, 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Article 6");
    }

    #[test]
    fn test_titles_are_unique_in_output() {
        // Two article ids sharing one title
        let dataset = InteractionDataset::new(vec![
            read(1, 1),
            read(2, 1),
            InteractionRecord::new(2, 5, "Duplicate", Some("a"), Some("x")),
            InteractionRecord::new(2, 6, "Duplicate", Some("b"), Some("y")),
        ]);

        let recs = CollaborativeRecommender::default().recommend(&dataset, 1, 5);
        assert_eq!(recs, vec![Recommendation::new("Duplicate", "a", "x")]);
    }

    proptest! {
        #[test]
        fn prop_never_recommends_already_read(
            reads in proptest::collection::vec((0u64..6, 0u64..15), 1..80),
            target in 0u64..6,
            count in 0usize..12,
        ) {
            let dataset = InteractionDataset::new(
                reads.iter().map(|&(u, a)| read(u, a)).collect(),
            );
            let read_by_target: HashSet<ArticleId> = reads
                .iter()
                .filter(|(u, _)| *u == target)
                .map(|(_, a)| *a)
                .collect();

            let ids = CollaborativeRecommender::default()
                .recommend_article_ids(&dataset, target, count);

            prop_assert!(ids.len() <= count);
            prop_assert!(ids.iter().all(|a| !read_by_target.contains(a)));
            let unique: HashSet<_> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len());
        }
    }
}
