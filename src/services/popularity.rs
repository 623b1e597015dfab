use std::collections::HashMap;

use crate::{
    db::InteractionDataset,
    models::{Recommendation, NO_LINK},
};

/// The `count` most-read titles across all users
///
/// Reads are counted per title, re-reads included. Titles with equal counts keep the
/// order in which they first appear in the dataset. An article without a link gets
/// the `"#"` placeholder.
pub fn top_ranked_articles(dataset: &InteractionDataset, count: usize) -> Vec<Recommendation> {
    if count == 0 {
        return Vec::new();
    }

    // title -> (reads, first position)
    let mut reads: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, record) in dataset.records().iter().enumerate() {
        reads.entry(record.title.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = reads
        .into_iter()
        .map(|(title, (count, first))| (title, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(count)
        .map(|(_, _, first)| {
            let record = &dataset.records()[first];
            let link = match record.link_or_empty() {
                "" => NO_LINK,
                link => link,
            };
            Recommendation::new(record.title.clone(), record.description_or_empty(), link)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InteractionRecord;

    fn reads(
        user: u64,
        article: u64,
        title: &str,
        link: Option<&str>,
        times: usize,
    ) -> Vec<InteractionRecord> {
        (0..times)
            .map(|_| InteractionRecord::new(user, article, title, Some("about"), link))
            .collect()
    }

    #[test]
    fn test_most_read_title_wins() {
        let mut records = reads(1, 2, "Python Basics", Some("http://py"), 10);
        records.extend(reads(2, 1, "Intro to SQL", Some("http://sql"), 50));
        let dataset = InteractionDataset::new(records);

        let top = top_ranked_articles(&dataset, 1);
        assert_eq!(
            top,
            vec![Recommendation::new("Intro to SQL", "about", "http://sql")]
        );
    }

    #[test]
    fn test_ties_keep_dataset_order() {
        let mut records = reads(1, 3, "Gamma", Some("g"), 2);
        records.extend(reads(1, 1, "Alpha", Some("a"), 2));
        records.extend(reads(1, 2, "Beta", Some("b"), 3));
        let dataset = InteractionDataset::new(records);

        let titles: Vec<String> = top_ranked_articles(&dataset, 3)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Beta", "Gamma", "Alpha"]);
    }

    #[test]
    fn test_missing_or_empty_link_becomes_placeholder() {
        let mut records = reads(1, 1, "No link", None, 2);
        records.extend(reads(1, 2, "Empty link", Some(""), 1));
        let dataset = InteractionDataset::new(records);

        let top = top_ranked_articles(&dataset, 5);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|r| r.link == "#"));
    }

    #[test]
    fn test_zero_count_and_empty_dataset() {
        let dataset = InteractionDataset::new(reads(1, 1, "Only", None, 1));
        assert!(top_ranked_articles(&dataset, 0).is_empty());
        assert!(top_ranked_articles(&InteractionDataset::default(), 3).is_empty());
    }
}
