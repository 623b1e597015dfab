//! Article text normalization: character cleanup, stopword removal, lemmatization.

use std::collections::{HashMap, HashSet};

/// English stopwords (the NLTK list)
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// How tokens are compared against the stopword list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopwordMatch {
    /// Compare the token as it appears in the text. The list is lowercase, so "The"
    /// survives while "the" is dropped.
    #[default]
    Verbatim,
    /// Compare the lowercased token
    CaseInsensitive,
}

/// Irregular plurals and words the suffix rules would mangle
const LEMMA_EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "people"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("data", "data"),
    ("analyses", "analysis"),
    ("bases", "basis"),
    ("buses", "bus"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("halves", "half"),
    ("selves", "self"),
    ("series", "series"),
    ("species", "species"),
    ("news", "news"),
];

/// Singulars ending in `-ie` or `-che`: their plurals only drop the final `s`, where the
/// `-ies` and `-ches` rules would produce a non-word
const PLAIN_PLURAL_NOUNS: &[&str] = &[
    "ache",
    "avalanche",
    "brownie",
    "cache",
    "calorie",
    "cliche",
    "cookie",
    "die",
    "freebie",
    "genie",
    "goalie",
    "headache",
    "hoodie",
    "lie",
    "moustache",
    "movie",
    "mustache",
    "newbie",
    "niche",
    "pie",
    "prairie",
    "psyche",
    "quiche",
    "rookie",
    "selfie",
    "smoothie",
    "tie",
    "zombie",
];

/// Rule-based English noun lemmatizer
///
/// Applies WordNet's noun detachment rules (`-ies` to `-y`, `-ches` to `-ch`, plain `-s`
/// and so on) with an exception table and a list of `-ie`/`-che` singulars standing in
/// for the dictionary lookup. Tokens containing digits are returned unchanged.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<&'static str, &'static str>,
    plain_plurals: HashSet<&'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            exceptions: LEMMA_EXCEPTIONS.iter().copied().collect(),
            plain_plurals: PLAIN_PLURAL_NOUNS.iter().copied().collect(),
        }
    }

    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.exceptions.get(word) {
            return (*lemma).to_string();
        }
        if word.len() <= 3 || word.chars().any(|c| c.is_ascii_digit()) {
            return word.to_string();
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        if let Some(stem) = word.strip_suffix('s') {
            if self.plain_plurals.contains(stem) {
                return stem.to_string();
            }
        }

        if word.len() > 4 {
            if let Some(stem) = word.strip_suffix("ies") {
                return format!("{}y", stem);
            }
        }
        for suffix in ["sses", "ches", "shes", "xes", "zes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if let Some(stem) = word.strip_suffix('s') {
            return stem.to_string();
        }

        word.to_string()
    }
}

/// Splits article text into normalized terms
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<&'static str>,
    stopword_match: StopwordMatch,
    lemmatizer: Lemmatizer,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(StopwordMatch::default())
    }
}

impl Tokenizer {
    pub fn new(stopword_match: StopwordMatch) -> Self {
        Self {
            stopwords: ENGLISH_STOPWORDS.iter().copied().collect(),
            stopword_match,
            lemmatizer: Lemmatizer::new(),
        }
    }

    pub fn stopword_match(&self) -> StopwordMatch {
        self.stopword_match
    }

    fn is_stopword(&self, token: &str) -> bool {
        match self.stopword_match {
            StopwordMatch::Verbatim => self.stopwords.contains(token),
            StopwordMatch::CaseInsensitive => {
                self.stopwords.contains(token.to_lowercase().as_str())
            }
        }
    }

    /// Tokenizes one document
    ///
    /// Every character outside `[A-Za-z0-9]` becomes a separator. Stopwords are removed
    /// before lowercasing, then each remaining token is lowercased and lemmatized.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();

        cleaned
            .split_whitespace()
            .filter(|token| !self.is_stopword(token))
            .map(|token| self.lemmatizer.lemmatize(&token.to_lowercase()))
            .collect()
    }
}
