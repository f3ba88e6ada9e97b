use crate::{
    config::IndexConfig,
    error::{Error, Result},
    stopwords::StopwordFilter,
};
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// One normalized token: the lowercased word as written and the index term it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub word: String,
    pub term: String,
}

/// Text normalization shared by indexing and querying. Both sides must go
/// through the same instance configuration or terms will not line up.
pub struct Tokenizer {
    stemmer: Option<Stemmer>,
    stopwords: StopwordFilter,
    regex: Regex,
}

impl Tokenizer {
    pub fn new() -> Result<Self> {
        Self::from_config(&IndexConfig::default())
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        let mut stopwords = if config.stop_words {
            StopwordFilter::english()
        } else {
            StopwordFilter::empty()
        };
        stopwords.add_stopwords(config.extra_stop_words.as_slice());

        Ok(Self {
            stemmer: config
                .stemming
                .then(|| Stemmer::create(Algorithm::English)),
            stopwords,
            regex: Regex::new(r"\b\w+\b")
                .map_err(|e| Error::Generic(format!("Failed to compile regex: {e}")))?,
        })
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|token| token.term).collect()
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let lowered = text.to_lowercase();

        self.regex
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| !self.stopwords.is_stopword(word))
            .map(|word| Token {
                word: word.to_string(),
                term: self.stem(word),
            })
            .collect()
    }

    fn stem(&self, word: &str) -> String {
        self.stemmer
            .as_ref()
            .map_or_else(|| word.to_string(), |stemmer| stemmer.stem(word).into_owned())
    }
}
