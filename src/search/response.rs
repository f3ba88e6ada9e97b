use crate::config::ResponseConfig;

use super::search_result::RankedResult;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a search query to find relevant courses!";
const ELLIPSIS: &str = "...";

pub fn no_results_message(query: &str) -> String {
    format!(
        "No courses found matching \"{query}\". Try broader keywords or relax the skill level and rating filters."
    )
}

/// Renders ranked results as Markdown blocks, in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFormatter {
    description_chars: usize,
    show_rationale: bool,
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new(&ResponseConfig::default())
    }
}

impl ResponseFormatter {
    pub fn new(config: &ResponseConfig) -> Self {
        Self {
            description_chars: config.description_chars.max(1),
            show_rationale: config.show_rationale,
        }
    }

    pub fn format(&self, query: &str, results: &[RankedResult<'_>]) -> String {
        if results.is_empty() {
            return no_results_message(query);
        }

        let noun = if results.len() == 1 { "course" } else { "courses" };
        let mut blocks = vec![format!(
            "Found {} {noun} matching \"{query}\":",
            results.len()
        )];

        blocks.extend(
            results
                .iter()
                .enumerate()
                .map(|(rank, result)| self.format_result(rank + 1, result)),
        );

        blocks.join("\n\n")
    }

    fn format_result(&self, rank: usize, result: &RankedResult<'_>) -> String {
        let course = result.course;
        let mut lines = vec![
            format!("### {rank}. {}", course.title()),
            format!("- **Difficulty:** {}", course.difficulty()),
            format!("- **Rating:** {:.1}/5.0", course.rating()),
        ];

        if !course.platform().is_empty() {
            lines.push(format!("- **Platform:** {}", course.platform()));
        }

        if self.show_rationale && !result.matched_words.is_empty() {
            let words = result
                .matched_words
                .iter()
                .map(|word| format!("\"{word}\""))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "- **Why:** matches {words} (relevance {:.3})",
                result.score
            ));
        }

        if !course.description().is_empty() {
            lines.push(format!(
                "- **About:** {}",
                truncate_description(course.description(), self.description_chars)
            ));
        }

        let link = if course.url().is_empty() {
            "not available"
        } else {
            course.url()
        };
        lines.push(format!("- **Link:** {link}"));

        lines.join("\n")
    }
}

/// Cuts `text` to at most `max_chars` characters, preferring a word boundary.
fn truncate_description(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    let head = &text[..cut];
    let at_boundary = text[cut..].starts_with(char::is_whitespace);
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 && !at_boundary => &head[..space],
        _ => head,
    };

    format!(
        "{}{ELLIPSIS}",
        head.trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
    )
}
