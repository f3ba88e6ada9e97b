pub mod constants;
pub mod search_index;
pub mod term_map;

pub use search_index::{FieldWeights, SearchIndex, TermIndex, TermVector};
pub use term_map::{CourseID, TermID, Vocabulary, TF, TFIDF};
