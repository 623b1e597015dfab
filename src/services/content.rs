use std::collections::HashSet;

use crate::{
    models::Recommendation,
    services::similarity_index::TextSimilarityIndex,
};

/// Recommends articles whose text is close to articles the user already read
///
/// For each seed row, every article at or above the row's similarity percentile is a
/// candidate. The cutoff adapts to each row's score distribution, so the number of
/// candidates per seed varies.
#[derive(Debug, Clone, Copy)]
pub struct ContentRecommender {
    percentile: f64,
    max_candidates_per_seed: usize,
}

impl Default for ContentRecommender {
    fn default() -> Self {
        Self::new(99.0, 256)
    }
}

impl ContentRecommender {
    pub fn new(percentile: f64, max_candidates_per_seed: usize) -> Self {
        Self {
            percentile,
            max_candidates_per_seed,
        }
    }

    /// Up to `count` titles similar to `read_titles`, excluding the titles themselves
    ///
    /// Seeds are the corpus rows carrying one of `read_titles`, visited in corpus order.
    pub fn recommend_titles(
        &self,
        index: &TextSimilarityIndex,
        read_titles: &[String],
        count: usize,
    ) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }

        let read: HashSet<&str> = read_titles.iter().map(String::as_str).collect();
        let seeds = index
            .articles()
            .iter()
            .enumerate()
            .filter(|(_, article)| read.contains(article.title.as_str()))
            .map(|(row, _)| row);

        let mut recommendations: Vec<String> = Vec::new();
        'seeds: for seed in seeds {
            let candidates =
                index.rows_above_percentile(seed, self.percentile, self.max_candidates_per_seed);
            for row in candidates {
                let title = &index.articles()[row].title;
                if !recommendations.contains(title) && !read.contains(title.as_str()) {
                    recommendations.push(title.clone());
                }
                if recommendations.len() >= count {
                    break 'seeds;
                }
            }
        }

        recommendations
    }

    /// Up to `count` recommendations for a reader of `read_titles`
    pub fn recommend(
        &self,
        index: &TextSimilarityIndex,
        read_titles: &[String],
        count: usize,
    ) -> Vec<Recommendation> {
        self.recommend_titles(index, read_titles, count)
            .into_iter()
            .filter_map(|title| {
                let article = index.first_row_for_title(&title)?;
                Some(Recommendation::new(
                    title,
                    article.description.clone(),
                    article.link.clone(),
                ))
            })
            .collect()
    }

    /// Up to `count` titles similar to a single article, the article itself excluded
    pub fn similar_articles(
        &self,
        index: &TextSimilarityIndex,
        title: &str,
        count: usize,
    ) -> Vec<String> {
        let Some(row) = index.rows_for_title(title).next() else {
            return Vec::new();
        };

        let mut similar: Vec<String> = Vec::new();
        for candidate in
            index.rows_above_percentile(row, self.percentile, self.max_candidates_per_seed)
        {
            let candidate_title = &index.articles()[candidate].title;
            if candidate_title != title && !similar.contains(candidate_title) {
                similar.push(candidate_title.clone());
            }
            if similar.len() >= count {
                break;
            }
        }
        similar
    }
}
