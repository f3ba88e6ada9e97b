use std::{collections::BTreeMap, time::Instant};

use tracing::info;

use super::{
    constants::{DESCRIPTION_WEIGHT, SKILLS_WEIGHT, TITLE_WEIGHT},
    term_map::{CourseID, TermID, Vocabulary, TF, TFIDF},
};
use crate::{catalog::Catalog, config::IndexConfig, tokenizer::Tokenizer};

/// Per-field multipliers applied to term counts. A zero weight leaves the field out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWeights {
    pub title: TF,
    pub skills: TF,
    pub description: TF,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: TITLE_WEIGHT,
            skills: SKILLS_WEIGHT,
            description: DESCRIPTION_WEIGHT,
        }
    }
}

impl From<&IndexConfig> for FieldWeights {
    fn from(config: &IndexConfig) -> Self {
        Self {
            title: config.title_weight,
            skills: config.skills_weight,
            description: config.description_weight,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TermIndex {
    pub course_id: CourseID,
    pub tf_idf: TFIDF,
}

/// Unit-length term weights of one course, sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    terms: Vec<(TermID, TFIDF)>,
}

impl TermVector {
    fn from_counts(term_count: &BTreeMap<TermID, TF>, idf: &[f64]) -> Self {
        let raw: Vec<(TermID, TFIDF)> = term_count
            .iter()
            .map(|(&id, &tf)| (id, calculate_tf_idf(tf, idf[id])))
            .collect();

        let norm = raw.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Self::default();
        }

        Self {
            terms: raw.into_iter().map(|(id, w)| (id, w / norm)).collect(),
        }
    }

    pub fn get(&self, term_id: TermID) -> Option<TFIDF> {
        self.terms
            .binary_search_by_key(&term_id, |&(id, _)| id)
            .ok()
            .map(|pos| self.terms[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermID, TFIDF)> + '_ {
        self.terms.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Read-only TF-IDF index over a catalog, built once.
///
/// Course weights are `(1 + ln tf) * idf`, normalized to unit length per course,
/// with `idf = ln((1 + N) / (1 + df)) + 1`. The smoothed idf never reaches zero,
/// so a term that appears in every course still counts.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    vocabulary: Vocabulary,
    doc_freq: Vec<usize>,
    idf: Vec<f64>,
    postings: Vec<Vec<TermIndex>>,
    documents: Vec<TermVector>,
    titles: Vec<Vec<TermID>>,
}

impl SearchIndex {
    pub fn build(catalog: &Catalog, tokenizer: &Tokenizer, weights: FieldWeights) -> Self {
        let start = Instant::now();

        let mut vocabulary = Vocabulary::new();
        let mut counts: Vec<BTreeMap<TermID, TF>> = Vec::with_capacity(catalog.len());
        let mut titles: Vec<Vec<TermID>> = Vec::with_capacity(catalog.len());

        for (_, course) in catalog.iter() {
            let mut term_count = BTreeMap::new();

            let mut title = update_term_count(
                course.title(),
                tokenizer,
                &mut vocabulary,
                &mut term_count,
                weights.title,
            );
            title.sort_unstable();
            title.dedup();
            titles.push(title);

            for skill in course.skills() {
                update_term_count(
                    skill,
                    tokenizer,
                    &mut vocabulary,
                    &mut term_count,
                    weights.skills,
                );
            }
            update_term_count(
                course.description(),
                tokenizer,
                &mut vocabulary,
                &mut term_count,
                weights.description,
            );

            counts.push(term_count);
        }

        let mut doc_freq = vec![0; vocabulary.len()];
        for term_count in &counts {
            for &id in term_count.keys() {
                doc_freq[id] += 1;
            }
        }

        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| calculate_idf(df, catalog.len()))
            .collect();

        let mut postings: Vec<Vec<TermIndex>> = vec![Vec::new(); vocabulary.len()];
        let documents: Vec<TermVector> = counts
            .iter()
            .enumerate()
            .map(|(course_id, term_count)| {
                let vector = TermVector::from_counts(term_count, &idf);
                for (id, tf_idf) in vector.iter() {
                    postings[id].push(TermIndex { course_id, tf_idf });
                }
                vector
            })
            .collect();

        info!(
            courses = documents.len(),
            terms = vocabulary.len(),
            elapsed = ?start.elapsed(),
            "built search index"
        );

        Self {
            vocabulary,
            doc_freq,
            idf,
            postings,
            documents,
            titles,
        }
    }

    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn term_id(&self, term: &str) -> Option<TermID> {
        self.vocabulary.get(term)
    }

    /// Number of courses containing `term`.
    pub fn doc_freq(&self, term: &str) -> usize {
        self.term_id(term).map_or(0, |id| self.doc_freq[id])
    }

    pub fn idf(&self, term_id: TermID) -> f64 {
        self.idf.get(term_id).copied().unwrap_or(0.0)
    }

    pub fn postings(&self, term_id: TermID) -> &[TermIndex] {
        self.postings
            .get(term_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn term_vector(&self, course_id: CourseID) -> Option<&TermVector> {
        self.documents.get(course_id)
    }

    /// Distinct title terms of a course, sorted. Empty when titles are not indexed.
    pub fn title_terms(&self, course_id: CourseID) -> &[TermID] {
        self.titles
            .get(course_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Normalized weight of `term` in a course, zero when absent.
    pub fn weight(&self, course_id: CourseID, term: &str) -> TFIDF {
        self.term_id(term)
            .zip(self.term_vector(course_id))
            .and_then(|(id, vector)| vector.get(id))
            .unwrap_or(0.0)
    }

    /// Query-side weight for a term occurring `tf` times in the query.
    pub fn query_weight(&self, term_id: TermID, tf: TF) -> TFIDF {
        calculate_tf_idf(tf, self.idf(term_id))
    }

    pub fn num_courses(&self) -> usize {
        self.documents.len()
    }
}

/// Adds `weight` per occurrence of each term in `text` and returns the term ids seen.
fn update_term_count(
    text: &str,
    tokenizer: &Tokenizer,
    vocabulary: &mut Vocabulary,
    term_count: &mut BTreeMap<TermID, TF>,
    weight: TF,
) -> Vec<TermID> {
    if weight == 0 {
        return Vec::new();
    }

    tokenizer
        .tokenize(text)
        .iter()
        .map(|term| {
            let id = vocabulary.intern(term);
            let count = term_count.entry(id).or_insert(0);
            *count = count.saturating_add(weight);
            id
        })
        .collect()
}

fn calculate_idf(df: usize, n: usize) -> f64 {
    ((1.0 + n as f64) / (1.0 + df as f64)).ln() + 1.0
}

fn calculate_tf_idf(tf: TF, idf: f64) -> TFIDF {
    if tf == 0 {
        return 0.0;
    }
    (1.0 + f64::from(tf).ln()) * idf
}
