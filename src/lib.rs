pub mod catalog;
pub mod config;
pub mod error;
pub mod inverted_index;
pub mod search;
pub mod stopwords;
pub mod tokenizer;

pub use catalog::{Catalog, CourseRecord, Difficulty};
pub use config::Config;
pub use error::{Error, Result};
pub use search::{RankedResult, SearchEngine, SearchRequest, SkillLevel};
