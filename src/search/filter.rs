use std::{fmt, str::FromStr};

use crate::{
    catalog::{CourseRecord, Difficulty, MAX_RATING, MIN_RATING},
    error::{Error, Result},
};

use super::search_result::RankedResult;

const NO_PREFERENCE: &str = "No preference";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkillLevel {
    #[default]
    NoPreference,
    Only(Difficulty),
}

impl SkillLevel {
    pub fn matches(self, difficulty: Difficulty) -> bool {
        match self {
            Self::NoPreference => true,
            Self::Only(level) => level == difficulty,
        }
    }
}

impl From<Difficulty> for SkillLevel {
    fn from(difficulty: Difficulty) -> Self {
        Self::Only(difficulty)
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPreference => f.write_str(NO_PREFERENCE),
            Self::Only(level) => write!(f, "{level}"),
        }
    }
}

impl FromStr for SkillLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NO_PREFERENCE) {
            return Ok(Self::NoPreference);
        }
        s.parse::<Difficulty>().map(Self::Only).map_err(|_| {
            Error::InvalidArgument(format!(
                "skill level '{s}' is not one of Beginner, Intermediate, Advanced, {NO_PREFERENCE}"
            ))
        })
    }
}

/// Post-ranking predicate. Drops courses without reordering the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultFilter {
    skill_level: SkillLevel,
    min_rating: f64,
}

impl ResultFilter {
    /// `min_rating` must lie in [1.0, 5.0]; it is never clamped.
    pub fn new(skill_level: SkillLevel, min_rating: f64) -> Result<Self> {
        if !(MIN_RATING..=MAX_RATING).contains(&min_rating) {
            return Err(Error::InvalidArgument(format!(
                "minimum rating {min_rating} is outside [{MIN_RATING:.1}, {MAX_RATING:.1}]"
            )));
        }
        Ok(Self {
            skill_level,
            min_rating,
        })
    }

    pub fn matches(&self, course: &CourseRecord) -> bool {
        self.skill_level.matches(course.difficulty()) && course.rating() >= self.min_rating
    }

    pub fn apply<'a>(&self, results: Vec<RankedResult<'a>>) -> Vec<RankedResult<'a>> {
        results
            .into_iter()
            .filter(|result| self.matches(result.course))
            .collect()
    }
}

pub fn filter(
    results: Vec<RankedResult<'_>>,
    skill_level: SkillLevel,
    min_rating: f64,
) -> Result<Vec<RankedResult<'_>>> {
    Ok(ResultFilter::new(skill_level, min_rating)?.apply(results))
}
