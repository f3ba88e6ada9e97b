use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    /// Lenient mapping for catalog source values, accepting common synonyms.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "beginner" | "basic" | "easy" | "introductory" | "entry" | "entry level" => {
                Some(Self::Beginner)
            }
            "intermediate" | "medium" | "moderate" => Some(Self::Intermediate),
            "advanced" | "expert" | "hard" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    /// Strict: only the three level names, in any case.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown difficulty '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
    title: String,
    description: String,
    skills: Vec<String>,
    difficulty: Difficulty,
    rating: f64,
    url: String,
    platform: String,
}

impl CourseRecord {
    /// Fails on an empty title or a non-numeric rating. Finite ratings outside
    /// [1.0, 5.0] are clamped.
    pub fn new(title: impl Into<String>, difficulty: Difficulty, rating: f64) -> Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(Error::Catalog("course title is empty".to_string()));
        }
        if !rating.is_finite() {
            return Err(Error::Catalog(format!("rating for '{title}' is not a number")));
        }

        Ok(Self {
            title,
            description: String::new(),
            skills: Vec::new(),
            difficulty,
            rating: rating.clamp(MIN_RATING, MAX_RATING),
            url: String::new(),
            platform: String::new(),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = Vec::new();
        for skill in skills {
            let skill = skill.into().trim().to_string();
            if !skill.is_empty() && !self.skills.contains(&skill) {
                self.skills.push(skill);
            }
        }
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub const fn rating(&self) -> f64 {
        self.rating
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}
