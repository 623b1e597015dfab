use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{ArticleId, ArticleRow, InteractionRecord, UserId};

/// One row as it appears in a dataset file, before identity checks
#[derive(Debug, Deserialize)]
struct RawInteractionRow {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    article_id: Option<ArticleId>,
    #[serde(default, alias = "doc_full_name")]
    title: Option<String>,
    #[serde(default, alias = "doc_description")]
    description: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

impl RawInteractionRow {
    /// `None` when the row has no user or article id
    fn into_record(self) -> Option<InteractionRecord> {
        Some(InteractionRecord {
            user_id: self.user_id?,
            article_id: self.article_id?,
            title: self.title.unwrap_or_default(),
            description: self.description,
            link: self.link,
        })
    }
}

/// Read-only view over the interaction log supplied by the surrounding application
///
/// The engine never mutates a dataset in place. Callers share one snapshot across
/// requests (typically behind an `Arc`) and swap in a new one to reflect new reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionDataset {
    records: Vec<InteractionRecord>,
}

impl InteractionDataset {
    pub fn new(records: Vec<InteractionRecord>) -> Self {
        Self { records }
    }

    /// Loads a JSON array of interaction records
    ///
    /// Rows without a user or article id are dropped. A missing title becomes the empty
    /// string. Only input that is not a JSON array of objects is an error.
    pub fn from_json_reader<R: Read>(reader: R) -> EngineResult<Self> {
        let rows: Vec<RawInteractionRow> = serde_json::from_reader(reader)
            .map_err(|e| EngineError::InvalidInput(format!("Malformed dataset: {}", e)))?;

        let total = rows.len();
        let records: Vec<InteractionRecord> = rows
            .into_iter()
            .filter_map(RawInteractionRow::into_record)
            .collect();

        let dropped = total - records.len();
        if dropped > 0 {
            tracing::warn!(
                dropped,
                total,
                "Skipped dataset rows without a user or article id"
            );
        }

        Ok(Self::new(records))
    }

    /// Loads a JSON array of interaction records from a file
    pub fn from_json_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_json_reader(BufReader::new(file))?;

        tracing::info!(
            path = %path.display(),
            records = dataset.len(),
            "Interaction dataset loaded"
        );

        Ok(dataset)
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.records.iter().any(|r| r.user_id == user_id)
    }

    /// Number of interaction rows for a user, re-reads included
    pub fn interaction_count(&self, user_id: UserId) -> usize {
        self.records.iter().filter(|r| r.user_id == user_id).count()
    }

    /// Distinct titles the user has read, in dataset order
    pub fn user_titles(&self, user_id: UserId) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| seen.insert(r.title.as_str()))
            .map(|r| r.title.clone())
            .collect()
    }

    /// Distinct (title, description, link) triples, first occurrence first
    pub fn articles(&self) -> Vec<ArticleRow> {
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for record in &self.records {
            let row = record.article_row();
            if seen.insert(row.clone()) {
                rows.push(row);
            }
        }
        rows
    }

    /// First record carrying this title
    pub fn first_record_for_title(&self, title: &str) -> Option<&InteractionRecord> {
        self.records.iter().find(|r| r.title == title)
    }

    /// First record for this article id
    pub fn first_record_for_article(&self, article_id: ArticleId) -> Option<&InteractionRecord> {
        self.records.iter().find(|r| r.article_id == article_id)
    }

    /// Returns a new snapshot that also records `record` as read
    ///
    /// Nothing is added when the user already has a row for that title. The current
    /// snapshot is left untouched so in-flight requests keep a consistent view.
    pub fn with_interaction(&self, record: InteractionRecord) -> Self {
        let already_read = self
            .records
            .iter()
            .any(|r| r.user_id == record.user_id && r.title == record.title);

        let mut records = self.records.clone();
        if !already_read {
            records.push(record);
        }
        Self { records }
    }
}

impl From<Vec<InteractionRecord>> for InteractionDataset {
    fn from(records: Vec<InteractionRecord>) -> Self {
        Self::new(records)
    }
}
