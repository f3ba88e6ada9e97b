use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

/// Words the general English list treats as filler but that carry meaning in
/// course titles ("Intro to ML", "Big Data", "Working with Excel").
const COURSE_VOCABULARY: &[&str] = &[
    "ml", "ai", "data", "course", "information", "big", "new", "work", "working", "use",
    "using", "example", "examples", "group", "groups", "order", "problem", "problems", "state",
    "value", "values", "number", "numbers", "case", "cases", "point", "part", "parts", "high",
    "large", "open", "show", "test", "tests", "interest", "research", "beginning", "begin",
    "beginner", "beginners", "advanced", "fundamentals",
];

/// Lowercase stop-word set applied before stemming.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    stopwords: HashSet<String>,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self::english()
    }
}

impl StopwordFilter {
    /// The `stop-words` English list minus the course vocabulary it would swallow.
    pub fn english() -> Self {
        let mut filter = Self {
            stopwords: get(LANGUAGE::English)
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        };
        filter.remove_stopwords(COURSE_VOCABULARY);
        filter
    }

    /// A filter that keeps every word.
    pub fn empty() -> Self {
        Self {
            stopwords: HashSet::new(),
        }
    }

    pub fn add_stopwords<S: AsRef<str>>(&mut self, words: &[S]) {
        for word in words {
            self.stopwords.insert(word.as_ref().trim().to_lowercase());
        }
    }

    pub fn remove_stopwords<S: AsRef<str>>(&mut self, words: &[S]) {
        for word in words {
            self.stopwords.remove(&word.as_ref().trim().to_lowercase());
        }
    }

    /// Expects an already lowercased word.
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_list_covers_function_words() {
        let filter = StopwordFilter::english();
        for word in ["the", "to", "and", "for", "of", "with", "more"] {
            assert!(filter.is_stopword(word), "{word} should be a stop word");
        }
        for word in ["python", "deep", "learning", "ml", "data", "course", "intro"] {
            assert!(!filter.is_stopword(word), "{word} should be kept");
        }
    }

    #[test]
    fn extra_words_are_lowercased() {
        let mut filter = StopwordFilter::empty();
        assert!(!filter.is_stopword("the"));

        filter.add_stopwords(&["Course", " FREE "]);
        assert!(filter.is_stopword("course"));
        assert!(filter.is_stopword("free"));

        filter.remove_stopwords(&["COURSE"]);
        assert!(!filter.is_stopword("course"));
        assert!(filter.is_stopword("free"));
    }
}
