use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::{
    catalog::Catalog,
    config::{Config, SearchConfig},
    error::Result,
    inverted_index::{CourseID, FieldWeights, SearchIndex, TermID, TF, TFIDF},
    tokenizer::Tokenizer,
};

use super::{
    filter::{ResultFilter, SkillLevel},
    response::{ResponseFormatter, EMPTY_QUERY_MESSAGE},
    search_result::{rank_order, RankedResult},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub skill_level: SkillLevel,
    pub min_rating: f64,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, skill_level: SkillLevel, min_rating: f64) -> Self {
        Self {
            query: query.into(),
            skill_level,
            min_rating,
        }
    }
}

struct QueryTerm {
    term_id: TermID,
    tf: TF,
    word: String,
}

#[derive(Default)]
struct Match {
    score: f64,
    words: Vec<String>,
}

/// The loaded catalog and its index. Every query method takes `&self`, so one
/// engine can serve concurrent queries without locking.
///
/// Relevance of a course has two parts:
///
/// - `text`: the dot product of the query's TF-IDF vector `q` with the course's
///   unit-length TF-IDF vector over title, skills and description.
/// - `title`: when every distinct title term of the course occurs in the query,
///   `|q|` times the sum of the query weights of those title terms; else zero.
///
/// `score = text + title`. Both parts only grow as matching words are added to
/// the query. Query weights are at least 1 and `text` never exceeds `|q|`, so a
/// query spelling out a course's title puts that course ahead of every course
/// whose title terms differ.
pub struct SearchEngine {
    catalog: Catalog,
    index: SearchIndex,
    tokenizer: Tokenizer,
    settings: SearchConfig,
    formatter: ResponseFormatter,
}

impl SearchEngine {
    pub fn new(catalog: Catalog, config: &Config) -> Result<Self> {
        config.validate()?;

        let tokenizer = Tokenizer::from_config(&config.index)?;
        let index = SearchIndex::build(&catalog, &tokenizer, FieldWeights::from(&config.index));

        Ok(Self {
            catalog,
            index,
            tokenizer,
            settings: config.search.clone(),
            formatter: ResponseFormatter::new(&config.response),
        })
    }

    pub fn with_defaults(catalog: Catalog) -> Result<Self> {
        Self::new(catalog, &Config::default())
    }

    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub const fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn search(&self, query: &str) -> Vec<RankedResult<'_>> {
        let start = Instant::now();

        let query_terms = self.query_terms(query);
        if query_terms.is_empty() {
            debug!(query, "query has no indexed terms");
            return Vec::new();
        }

        let mut matches: BTreeMap<CourseID, Match> = BTreeMap::new();
        let mut query_weights: BTreeMap<TermID, TFIDF> = BTreeMap::new();

        for term in &query_terms {
            let query_weight = self.index.query_weight(term.term_id, term.tf);
            query_weights.insert(term.term_id, query_weight);
            for posting in self.index.postings(term.term_id) {
                let entry = matches.entry(posting.course_id).or_default();
                entry.score += query_weight * posting.tf_idf;
                entry.words.push(term.word.clone());
            }
        }

        let query_norm = query_weights.values().map(|w| w * w).sum::<f64>().sqrt();
        for (&course_id, entry) in &mut matches {
            entry.score += query_norm * self.title_coverage(course_id, &query_weights);
        }

        let threshold = self.settings.relevance_threshold;
        let mut results: Vec<RankedResult<'_>> = matches
            .into_iter()
            .filter(|(_, m)| m.score > threshold)
            .filter_map(|(course_id, m)| {
                self.catalog
                    .get(course_id)
                    .map(|course| RankedResult::new(course_id, course, m.score, m.words))
            })
            .collect();

        results.sort_by(rank_order);
        if let Some(max_results) = self.settings.max_results {
            results.truncate(max_results);
        }

        let elapsed = start.elapsed();
        debug!(
            query,
            terms = query_terms.len(),
            matches = results.len(),
            ?elapsed,
            "search finished"
        );
        if elapsed > Duration::from_millis(self.settings.slow_query_ms) {
            warn!(query, ?elapsed, "slow query");
        }

        results
    }

    /// Searches and applies the request's filter. Blank queries yield no results.
    pub fn search_filtered(&self, request: &SearchRequest) -> Result<Vec<RankedResult<'_>>> {
        let filter = ResultFilter::new(request.skill_level, request.min_rating)?;
        Ok(filter.apply(self.search(&request.query)))
    }

    pub fn generate_response(&self, query: &str, results: &[RankedResult<'_>]) -> String {
        self.formatter.format(query, results)
    }

    /// Full request cycle: validate, search, filter, and render.
    pub fn respond(&self, request: &SearchRequest) -> Result<String> {
        let query = request.query.trim();
        if query.is_empty() {
            return Ok(EMPTY_QUERY_MESSAGE.to_string());
        }

        let results = self.search_filtered(request)?;
        Ok(self.generate_response(query, &results))
    }

    /// Sum of the query weights of the course's title terms, or zero unless the
    /// query holds all of them.
    fn title_coverage(
        &self,
        course_id: CourseID,
        query_weights: &BTreeMap<TermID, TFIDF>,
    ) -> f64 {
        let title = self.index.title_terms(course_id);
        if title.is_empty() {
            return 0.0;
        }
        title
            .iter()
            .map(|id| query_weights.get(id).copied())
            .sum::<Option<f64>>()
            .unwrap_or(0.0)
    }

    /// Query terms known to the index, deduplicated in first-seen order.
    fn query_terms(&self, query: &str) -> Vec<QueryTerm> {
        let mut query_terms: Vec<QueryTerm> = Vec::new();

        for token in self.tokenizer.analyze(query) {
            let Some(term_id) = self.index.term_id(&token.term) else {
                continue;
            };
            match query_terms.iter_mut().find(|t| t.term_id == term_id) {
                Some(existing) => existing.tf += 1,
                None => query_terms.push(QueryTerm {
                    term_id,
                    tf: 1,
                    word: token.word,
                }),
            }
        }

        query_terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{CourseRecord, Difficulty},
        error::Error,
    };

    fn course(title: &str, difficulty: Difficulty, rating: f64) -> CourseRecord {
        CourseRecord::new(title, difficulty, rating).unwrap()
    }

    fn engine() -> SearchEngine {
        SearchEngine::with_defaults(Catalog::new(vec![
            course("Intro to ML", Difficulty::Beginner, 4.2),
            course("Advanced Deep Learning", Difficulty::Advanced, 4.8),
            course("Python for Data Analysis", Difficulty::Beginner, 3.9),
        ]))
        .unwrap()
    }

    fn titles<'a>(results: &'a [RankedResult<'_>]) -> Vec<&'a str> {
        results.iter().map(|r| r.course.title()).collect()
    }

    #[test]
    fn finds_matching_course() {
        let engine = engine();
        let results = engine.search("deep learning");

        assert_eq!(titles(&results), vec!["Advanced Deep Learning"]);
        assert_eq!(results[0].matched_words, vec!["deep", "learning"]);
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn blank_and_unknown_queries_return_nothing() {
        let engine = engine();
        assert!(engine.search("").is_empty());
        assert!(engine.search("   ").is_empty());
        assert!(engine.search("the of and").is_empty());
        assert!(engine.search("nonexistent topic xyz").is_empty());
    }

    #[test]
    fn stemming_is_symmetric() {
        let engine = engine();
        assert_eq!(titles(&engine.search("LEARNED")), vec!["Advanced Deep Learning"]);
        assert_eq!(titles(&engine.search("PYTHON")), vec!["Python for Data Analysis"]);
    }

    #[test]
    fn equal_scores_order_by_rating_then_catalog_order() {
        let engine = SearchEngine::with_defaults(Catalog::new(vec![
            course("SQL Basics", Difficulty::Beginner, 3.5),
            course("SQL Basics", Difficulty::Beginner, 4.5),
            course("SQL Basics", Difficulty::Beginner, 3.5),
        ]))
        .unwrap();

        let ids: Vec<_> = engine.search("sql").iter().map(|r| r.course_id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
    }

    #[test]
    fn exact_title_beats_a_shorter_title_with_a_sparse_description() {
        let description = "pandas numpy matplotlib seaborn statistics regression \
            classification clustering forecasting sampling hypothesis testing \
            visualization dashboards reporting cleaning wrangling merging pivoting \
            grouping aggregation outliers imputation scaling encoding features \
            pipelines notebooks jupyter deployment";
        let engine = SearchEngine::with_defaults(Catalog::new(vec![
            course("Python Data", Difficulty::Beginner, 3.0).with_description(description),
            course("Python", Difficulty::Beginner, 5.0),
        ]))
        .unwrap();

        let results = engine.search("Python Data");
        assert_eq!(titles(&results), vec!["Python Data", "Python"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn title_coverage_needs_every_title_term() {
        let engine = engine();
        let term = |word: &str| {
            let terms = engine.tokenizer.tokenize(word);
            engine.index().term_id(&terms[0]).unwrap()
        };
        let (python, data, analysis) = (term("python"), term("data"), term("analysis"));

        let partial = BTreeMap::from([(python, 1.5), (data, 2.0)]);
        assert_eq!(engine.title_coverage(2, &partial), 0.0);

        let full = BTreeMap::from([(python, 1.5), (data, 2.0), (analysis, 2.5)]);
        assert!((engine.title_coverage(2, &full) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn threshold_and_max_results_apply() {
        let catalog = Catalog::new(vec![
            course("Python", Difficulty::Beginner, 4.0),
            course("Python and SQL and Spark and Excel", Difficulty::Beginner, 4.0),
            course("Python Python", Difficulty::Beginner, 4.0),
        ]);

        let mut config = Config::default();
        config.search.max_results = Some(2);
        let engine = SearchEngine::new(catalog.clone(), &config).unwrap();
        assert_eq!(engine.search("python").len(), 2);

        let mut config = Config::default();
        config.search.relevance_threshold = 100.0;
        let engine = SearchEngine::new(catalog, &config).unwrap();
        assert!(engine.search("python").is_empty());
    }

    #[test]
    fn respond_runs_the_whole_pipeline() {
        let engine = engine();

        let text = engine
            .respond(&SearchRequest::new("deep learning", SkillLevel::NoPreference, 4.0))
            .unwrap();
        assert!(text.contains("Advanced Deep Learning"));
        assert!(!text.contains("Intro to ML"));

        let text = engine
            .respond(&SearchRequest::new("  ", SkillLevel::NoPreference, 4.0))
            .unwrap();
        assert_eq!(text, EMPTY_QUERY_MESSAGE);
    }

    #[test]
    fn respond_rejects_bad_filters() {
        let engine = engine();
        let err = engine
            .respond(&SearchRequest::new("python", SkillLevel::NoPreference, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchEngine>();

        let engine = engine();
        let expected: Vec<_> = engine.search("python data").iter().map(|r| r.course_id).collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        engine
                            .search("python data")
                            .iter()
                            .map(|r| r.course_id)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn empty_catalog_is_searchable() {
        let engine = SearchEngine::with_defaults(Catalog::default()).unwrap();
        assert!(engine.search("python").is_empty());
    }
}
