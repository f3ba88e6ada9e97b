pub mod engine;
pub mod filter;
pub mod response;
pub mod search_result;

pub use engine::{SearchEngine, SearchRequest};
pub use filter::{filter, ResultFilter, SkillLevel};
pub use response::{no_results_message, ResponseFormatter, EMPTY_QUERY_MESSAGE};
pub use search_result::RankedResult;
