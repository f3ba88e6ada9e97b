use std::cmp::Ordering;

use serde::Serialize;

use crate::{catalog::CourseRecord, inverted_index::CourseID};

/// A catalog course matched by a query. Borrows the record from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult<'a> {
    pub course_id: CourseID,
    pub course: &'a CourseRecord,
    pub score: f64,
    /// Query words that matched this course, in query order.
    pub matched_words: Vec<String>,
}

impl<'a> RankedResult<'a> {
    pub const fn new(
        course_id: CourseID,
        course: &'a CourseRecord,
        score: f64,
        matched_words: Vec<String>,
    ) -> Self {
        Self {
            course_id,
            course,
            score,
            matched_words,
        }
    }
}

/// Score descending, then rating descending, then catalog order.
pub fn rank_order(a: &RankedResult<'_>, b: &RankedResult<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.course.rating().total_cmp(&a.course.rating()))
        .then_with(|| a.course_id.cmp(&b.course_id))
}
