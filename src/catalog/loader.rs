use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use scraper::Html;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{Catalog, CourseRecord, Difficulty, MAX_RATING, MIN_RATING};
use crate::error::{Error, Result};

const JSON_EXTENSIONS: [&str; 1] = ["json"];
const JSON_LINES_EXTENSIONS: [&str; 2] = ["jsonl", "ndjson"];
const CSV_EXTENSIONS: [&str; 1] = ["csv"];
const SKILL_SEPARATORS: [char; 4] = [',', ';', '|', '\n'];

/// One catalog row as it appears in the source, before normalization.
#[derive(Debug, Default, Deserialize)]
struct RawCourse {
    #[serde(default, alias = "course_title", alias = "name")]
    title: Option<String>,
    #[serde(default, alias = "course_description")]
    description: Option<String>,
    #[serde(default, alias = "tags", alias = "curriculum")]
    skills: Option<RawSkills>,
    #[serde(default, alias = "level", alias = "skill_level")]
    difficulty: Option<String>,
    #[serde(default, alias = "ratings")]
    rating: Option<RawRating>,
    #[serde(default, alias = "link", alias = "course_url")]
    url: Option<String>,
    #[serde(default)]
    platform: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSkills {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRating {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    courses: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    pub clamped: usize,
}

#[derive(Default)]
struct CatalogBuilder {
    courses: Vec<CourseRecord>,
    report: LoadReport,
}

impl CatalogBuilder {
    fn push_value(&mut self, value: Value, source: &str) {
        match serde_json::from_value::<RawCourse>(value) {
            Ok(raw) => self.push_raw(raw, source),
            Err(e) => {
                warn!(source, error = %e, "skipping malformed catalog row");
                self.report.skipped += 1;
            }
        }
    }

    fn push_raw(&mut self, raw: RawCourse, source: &str) {
        match normalize(raw, source) {
            Ok((course, clamped)) => {
                if clamped {
                    self.report.clamped += 1;
                }
                self.courses.push(course);
                self.report.loaded += 1;
            }
            Err(e) => {
                warn!(source, error = %e, "skipping invalid catalog row");
                self.report.skipped += 1;
            }
        }
    }

    fn push_json(&mut self, raw: &str, source: &str) -> Result<()> {
        let rows = match serde_json::from_str::<Value>(raw)? {
            Value::Array(rows) => rows,
            value @ Value::Object(_) => serde_json::from_value::<CatalogFile>(value)?.courses,
            _ => {
                return Err(Error::Catalog(format!(
                    "{source}: expected an array of courses or an object with a 'courses' array"
                )))
            }
        };

        for (row, value) in rows.into_iter().enumerate() {
            self.push_value(value, &format!("{source}#{row}"));
        }
        Ok(())
    }

    fn push_json_lines<R: BufRead>(&mut self, reader: R, source: &str) -> Result<()> {
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row_source = format!("{source}:{}", line_no + 1);
            match serde_json::from_str::<Value>(&line) {
                Ok(value) => self.push_value(value, &row_source),
                Err(e) => {
                    warn!(source = %row_source, error = %e, "skipping unparsable catalog line");
                    self.report.skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// Rows are matched to fields by header, so column order does not matter.
    fn push_csv<R: Read>(&mut self, reader: R, source: &str) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for (row, record) in reader.deserialize::<RawCourse>().enumerate() {
            // Data rows start on line 2, after the header.
            let row_source = format!("{source}:{}", row + 2);
            match record {
                Ok(raw) => self.push_raw(raw, &row_source),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!(source = %row_source, error = %e, "skipping malformed catalog row");
                    self.report.skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn push_file(&mut self, path: &Path) -> Result<()> {
        let source = path.display().to_string();
        if has_extension(path, &JSON_LINES_EXTENSIONS) {
            self.push_json_lines(BufReader::new(File::open(path)?), &source)
        } else if has_extension(path, &CSV_EXTENSIONS) {
            self.push_csv(BufReader::new(File::open(path)?), &source)
        } else {
            let raw = std::fs::read_to_string(path)?;
            self.push_json(&raw, &source)
        }
    }

    fn finish(self) -> (Catalog, LoadReport) {
        (Catalog::new(self.courses), self.report)
    }
}

/// Loads a catalog from a JSON, JSON Lines or CSV file, or from every such file
/// under a directory in file-name order. Bad rows are dropped with a warning;
/// only unreadable files or malformed JSON documents fail the load.
pub fn load_catalog(path: &Path) -> Result<(Catalog, LoadReport)> {
    let mut builder = CatalogBuilder::default();

    if path.is_dir() {
        let mut files = 0;
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                has_extension(e.path(), &JSON_EXTENSIONS)
                    || has_extension(e.path(), &JSON_LINES_EXTENSIONS)
                    || has_extension(e.path(), &CSV_EXTENSIONS)
            })
        {
            builder.push_file(entry.path())?;
            files += 1;
        }
        if files == 0 {
            return Err(Error::Catalog(format!(
                "no .json, .jsonl or .csv catalog files under {}",
                path.display()
            )));
        }
    } else {
        builder.push_file(path)?;
    }

    let (catalog, report) = builder.finish();
    info!(
        path = %path.display(),
        loaded = report.loaded,
        skipped = report.skipped,
        clamped = report.clamped,
        "loaded course catalog"
    );

    Ok((catalog, report))
}

/// Parses a catalog from an in-memory JSON document.
pub fn parse_catalog(raw: &str) -> Result<(Catalog, LoadReport)> {
    let mut builder = CatalogBuilder::default();
    builder.push_json(raw, "<memory>")?;
    Ok(builder.finish())
}

fn normalize(raw: RawCourse, source: &str) -> Result<(CourseRecord, bool)> {
    let title = raw.title.unwrap_or_default();

    let difficulty_raw = raw
        .difficulty
        .ok_or_else(|| Error::Catalog(format!("'{title}' has no difficulty")))?;
    let difficulty = Difficulty::normalize(&difficulty_raw).ok_or_else(|| {
        Error::Catalog(format!("'{title}' has unknown difficulty '{difficulty_raw}'"))
    })?;

    let rating = match raw.rating {
        Some(RawRating::Number(n)) => Some(n),
        Some(RawRating::Text(text)) => parse_rating_text(&text),
        None => None,
    }
    .ok_or_else(|| Error::Catalog(format!("'{title}' has no numeric rating")))?;

    let clamped = rating.is_finite() && !(MIN_RATING..=MAX_RATING).contains(&rating);
    if clamped {
        warn!(source, title = %title, rating, "clamping rating into [1.0, 5.0]");
    }

    let skills = match raw.skills {
        Some(RawSkills::List(list)) => list,
        Some(RawSkills::Text(text)) => text
            .split(&SKILL_SEPARATORS[..])
            .map(String::from)
            .collect(),
        None => Vec::new(),
    };

    let course = CourseRecord::new(title, difficulty, rating)?
        .with_description(clean_description(&raw.description.unwrap_or_default()))
        .with_skills(skills)
        .with_url(raw.url.unwrap_or_default().trim())
        .with_platform(raw.platform.unwrap_or_default().trim());

    Ok((course, clamped))
}

/// Accepts "4.5" and "4.5/5" style values.
fn parse_rating_text(text: &str) -> Option<f64> {
    text.split('/').next()?.trim().parse().ok()
}

/// Strips HTML markup when present and collapses whitespace.
fn clean_description(raw: &str) -> String {
    let text = if raw.contains('<') {
        Html::parse_fragment(raw)
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        raw.to_string()
    };

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn parses_array_with_aliases() {
        let (catalog, report) = parse_catalog(
            r#"[
                {"title": "Intro to ML", "difficulty": "beginner", "ratings": 4.2,
                 "tags": "ml, python; statistics", "link": "https://example.com/ml"},
                {"course_title": "Advanced Deep Learning", "level": "Expert", "rating": "4.8/5",
                 "skills": ["deep learning", "pytorch"], "platform": "Analytics Vidhya"}
            ]"#,
        )
        .unwrap();

        assert_eq!(report, LoadReport { loaded: 2, skipped: 0, clamped: 0 });
        let ml = catalog.get(0).unwrap();
        assert_eq!(ml.title(), "Intro to ML");
        assert_eq!(ml.difficulty(), Difficulty::Beginner);
        assert_eq!(ml.skills(), ["ml", "python", "statistics"]);
        assert_eq!(ml.url(), "https://example.com/ml");

        let dl = catalog.get(1).unwrap();
        assert_eq!(dl.difficulty(), Difficulty::Advanced);
        assert!((dl.rating() - 4.8).abs() < f64::EPSILON);
        assert_eq!(dl.platform(), "Analytics Vidhya");
    }

    #[test]
    fn drops_bad_rows_and_keeps_order() {
        let (catalog, report) = parse_catalog(
            r#"{"courses": [
                {"title": "First", "difficulty": "Beginner", "rating": 4.0},
                {"title": "", "difficulty": "Beginner", "rating": 4.0},
                {"title": "No Level", "rating": 4.0},
                {"title": "Odd Level", "difficulty": "wizard", "rating": 4.0},
                {"title": "No Rating", "difficulty": "Beginner"},
                {"title": "Bad Rating", "difficulty": "Beginner", "rating": "great"},
                {"title": "Wrong Types", "difficulty": 3, "rating": 4.0},
                {"title": "Last", "difficulty": "Intermediate", "rating": 7.5}
            ]}"#,
        )
        .unwrap();

        assert_eq!(report, LoadReport { loaded: 2, skipped: 6, clamped: 1 });
        let titles: Vec<_> = catalog.courses().iter().map(CourseRecord::title).collect();
        assert_eq!(titles, ["First", "Last"]);
        assert!((catalog.get(1).unwrap().rating() - MAX_RATING).abs() < f64::EPSILON);
    }

    #[test]
    fn non_catalog_document_is_an_error() {
        assert!(matches!(parse_catalog("42"), Err(Error::Catalog(_))));
        assert!(matches!(parse_catalog("[{"), Err(Error::SerdeJson(_))));
    }

    #[test]
    fn html_descriptions_are_reduced_to_text() {
        assert_eq!(
            clean_description("<p>Learn <b>SQL</b> &amp; databases</p>\n"),
            "Learn SQL & databases"
        );
        assert_eq!(clean_description("  plain\t text  "), "plain text");
    }

    #[test]
    fn loads_json_lines_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.jsonl");
        fs::write(
            &path,
            "{\"title\": \"A\", \"difficulty\": \"Beginner\", \"rating\": 4.0}\n\
             not json\n\
             \n\
             {\"title\": \"B\", \"difficulty\": \"Advanced\", \"rating\": 3.5}\n",
        )
        .unwrap();

        let (catalog, report) = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn loads_csv_with_original_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.csv");
        fs::write(
            &path,
            "title,description,curriculum,difficulty,ratings,course_url\n\
             Intro to ML,Basics of machine learning,\"ml, python\",Beginner,4.2,https://example.com/ml\n\
             Advanced Deep Learning,\"Neural nets, CNNs\",,advanced,4.8/5,\n\
             Broken,No level here,,,4.0,\n\
             Too Good, , ,Intermediate,9,\n",
        )
        .unwrap();

        let (catalog, report) = load_catalog(&path).unwrap();
        assert_eq!(report, LoadReport { loaded: 3, skipped: 1, clamped: 1 });

        let ml = catalog.get(0).unwrap();
        assert_eq!(ml.title(), "Intro to ML");
        assert_eq!(ml.difficulty(), Difficulty::Beginner);
        assert!((ml.rating() - 4.2).abs() < f64::EPSILON);
        assert_eq!(ml.skills(), ["ml", "python"]);
        assert_eq!(ml.url(), "https://example.com/ml");

        let dl = catalog.get(1).unwrap();
        assert_eq!(dl.description(), "Neural nets, CNNs");
        assert_eq!(dl.difficulty(), Difficulty::Advanced);
        assert!((dl.rating() - 4.8).abs() < f64::EPSILON);
        assert!(dl.skills().is_empty());

        assert!((catalog.get(2).unwrap().rating() - MAX_RATING).abs() < f64::EPSILON);
    }

    #[test]
    fn loads_directory_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"[{"title": "Second", "difficulty": "Beginner", "rating": 4.0}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"title\": \"First\", \"difficulty\": \"Beginner\", \"rating\": 4.0}\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (catalog, _) = load_catalog(dir.path()).unwrap();
        let titles: Vec<_> = catalog.courses().iter().map(CourseRecord::title).collect();
        assert_eq!(titles, ["First", "Second"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_catalog(dir.path()), Err(Error::Catalog(_))));
    }
}
