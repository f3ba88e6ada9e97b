mod course;
pub mod loader;

pub use course::{CourseRecord, Difficulty, MAX_RATING, MIN_RATING};
pub use loader::{load_catalog, LoadReport};

use crate::inverted_index::term_map::CourseID;

/// Courses in source order. Positions are the course ids used by the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    courses: Vec<CourseRecord>,
}

impl Catalog {
    pub const fn new(courses: Vec<CourseRecord>) -> Self {
        Self { courses }
    }

    pub fn get(&self, course_id: CourseID) -> Option<&CourseRecord> {
        self.courses.get(course_id)
    }

    pub fn courses(&self) -> &[CourseRecord] {
        &self.courses
    }

    pub fn iter(&self) -> impl Iterator<Item = (CourseID, &CourseRecord)> {
        self.courses.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl FromIterator<CourseRecord> for Catalog {
    fn from_iter<T: IntoIterator<Item = CourseRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
