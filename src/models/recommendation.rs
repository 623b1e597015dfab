use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Placeholder link used by the popularity strategy when an article has none
pub const NO_LINK: &str = "#";

/// A single recommended article returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub link: String,
}

impl Recommendation {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
        }
    }
}

/// Which strategy produced a recommendation list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Unknown user: globally most-read articles
    Popularity,
    /// Enough history: articles read by similar users
    Collaborative,
    /// Little history: articles similar in text to what the user read
    Content,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Popularity => write!(f, "popularity"),
            Strategy::Collaborative => write!(f, "collaborative"),
            Strategy::Content => write!(f, "content"),
        }
    }
}
