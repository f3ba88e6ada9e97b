use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    inverted_index::constants::{
        DESCRIPTION_WEIGHT, MAX_FIELD_WEIGHT, SKILLS_WEIGHT, TITLE_WEIGHT,
    },
};

pub const CONFIG_ENV: &str = "COURSE_FINDER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "course_finder.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub response: ResponseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub title_weight: u32,
    pub skills_weight: u32,
    pub description_weight: u32,
    pub stemming: bool,
    pub stop_words: bool,
    pub extra_stop_words: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            title_weight: TITLE_WEIGHT,
            skills_weight: SKILLS_WEIGHT,
            description_weight: DESCRIPTION_WEIGHT,
            stemming: true,
            stop_words: true,
            extra_stop_words: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results scoring at or below this value are dropped.
    pub relevance_threshold: f64,
    pub max_results: Option<usize>,
    /// Queries slower than this are logged as warnings.
    pub slow_query_ms: u64,
    pub default_skill_level: String,
    pub default_min_rating: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.0,
            max_results: None,
            slow_query_ms: 250,
            default_skill_level: "Beginner".to_string(),
            default_min_rating: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub description_chars: usize,
    pub show_rationale: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            description_chars: 200,
            show_rationale: true,
        }
    }
}

impl Config {
    /// Resolves the config file from `explicit_path`, then `COURSE_FINDER_CONFIG`,
    /// then `course_finder.toml` in the working directory. Only the implicit file
    /// may be absent.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read config {}: {e}", path.display())))?;
        let config = Self::from_toml(&raw)
            .map_err(|e| Error::Config(format!("parse config {}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        const THRESHOLD: &str = "COURSE_FINDER_RELEVANCE_THRESHOLD";
        const MAX_RESULTS: &str = "COURSE_FINDER_MAX_RESULTS";
        const DESCRIPTION_CHARS: &str = "COURSE_FINDER_DESCRIPTION_CHARS";

        if let Some(value) = lookup(THRESHOLD) {
            self.search.relevance_threshold = parse_env(THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(MAX_RESULTS) {
            self.search.max_results = Some(parse_env(MAX_RESULTS, &value)?);
        }
        if let Some(value) = lookup(DESCRIPTION_CHARS) {
            self.response.description_chars = parse_env(DESCRIPTION_CHARS, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.search.relevance_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::Config(format!(
                "search.relevance_threshold must be a finite value >= 0, got {threshold}"
            )));
        }
        if self.search.max_results == Some(0) {
            return Err(Error::Config(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        let min_rating = self.search.default_min_rating;
        if !(1.0..=5.0).contains(&min_rating) {
            return Err(Error::Config(format!(
                "search.default_min_rating must be within [1.0, 5.0], got {min_rating}"
            )));
        }
        if self.response.description_chars == 0 {
            return Err(Error::Config(
                "response.description_chars must be at least 1".to_string(),
            ));
        }
        let weights = [
            ("index.title_weight", self.index.title_weight),
            ("index.skills_weight", self.index.skills_weight),
            ("index.description_weight", self.index.description_weight),
        ];
        for (key, weight) in weights {
            if weight > MAX_FIELD_WEIGHT {
                return Err(Error::Config(format!(
                    "{key} must be at most {MAX_FIELD_WEIGHT}, got {weight}"
                )));
            }
        }
        if weights.iter().all(|&(_, weight)| weight == 0) {
            return Err(Error::Config(
                "at least one index field weight must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value}: {e}")))
}
