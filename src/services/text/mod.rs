pub mod tfidf;
pub mod tokenize;

pub use tfidf::{TfidfMatrix, TfidfVectorizer};
pub use tokenize::{Lemmatizer, StopwordMatch, Tokenizer, ENGLISH_STOPWORDS};
