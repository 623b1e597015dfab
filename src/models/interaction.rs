use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type ArticleId = u64;

/// One "user read article" event, with the article's metadata denormalized onto it
///
/// The same (user, article) pair may appear many times (re-reads).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub article_id: ArticleId,
    #[serde(alias = "doc_full_name")]
    pub title: String,
    #[serde(default, alias = "doc_description")]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl InteractionRecord {
    pub fn new(
        user_id: UserId,
        article_id: ArticleId,
        title: impl Into<String>,
        description: Option<&str>,
        link: Option<&str>,
    ) -> Self {
        Self {
            user_id,
            article_id,
            title: title.into(),
            description: description.map(str::to_string),
            link: link.map(str::to_string),
        }
    }

    /// Description, or the empty string when missing
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Link, or the empty string when missing
    pub fn link_or_empty(&self) -> &str {
        self.link.as_deref().unwrap_or("")
    }

    /// Whether every metadata field is present
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && self.description.is_some() && self.link.is_some()
    }

    /// The article part of this record, with missing fields as empty strings
    pub fn article_row(&self) -> ArticleRow {
        ArticleRow {
            title: self.title.clone(),
            description: self.description_or_empty().to_string(),
            link: self.link_or_empty().to_string(),
        }
    }
}

/// A distinct (title, description, link) triple from the corpus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ArticleRow {
    pub title: String,
    pub description: String,
    pub link: String,
}

impl ArticleRow {
    /// Text fed to the vectorizer: description, a space, then title
    pub fn document(&self) -> String {
        format!("{} {}", self.description, self.title)
    }
}
