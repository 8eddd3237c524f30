//! Batch import of per-company question datasets.
//!
//! Each source file is a JSON array of raw records. Records from every
//! source are merged into one canonical question per problem: the first
//! source to mention a problem fixes its title, difficulty and URL, while
//! `companies` and `topics` grow as append-only sets. The merged set is
//! applied to the store with upserts, so re-running the import over the same
//! or overlapping sources is safe.

use chrono::Utc;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use url::Url;

use crate::database::{DatabaseManager, Difficulty, Question, Result as DbResult, UpsertOutcome};

/// Base used to resolve site-relative problem links.
pub const BASE_PROBLEM_URL: &str = "https://leetcode.com";

static PROBLEM_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/problems/([^/]+)").expect("problem slug pattern"));

/// One record as it appears in a source file. Only `title` and `link` are
/// expected; the datasets are inconsistent about the rest, including whether
/// `topics` is a string or an array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestionRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topics: Option<TopicList>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TopicList {
    One(String),
    Many(Vec<String>),
}

impl TopicList {
    fn into_vec(self) -> Vec<String> {
        match self {
            TopicList::One(topic) => vec![topic],
            TopicList::Many(topics) => topics,
        }
    }
}

/// End-of-run tally. Per-record and per-batch failures are recovered and
/// recorded here; they never abort the run.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub batches: usize,
    pub processed: usize,
    pub skipped: usize,
    pub unique: usize,
    pub batch_errors: Vec<BatchError>,
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Debug, Clone)]
pub struct BatchError {
    pub source: String,
    pub error: String,
}

/// In-memory merge map keyed by canonical id.
#[derive(Debug, Default)]
pub struct Importer {
    merged: HashMap<String, Question>,
    batches: usize,
    processed: usize,
    skipped: usize,
    batch_errors: Vec<BatchError>,
}

impl Importer {
    pub fn new() -> Self {
        Importer::default()
    }

    /// Parse one source file's payload and merge its records. A payload that
    /// is not a JSON array of records is tallied as a batch error and the
    /// run continues.
    pub fn ingest_json(&mut self, source: &str, payload: &str) {
        self.batches += 1;
        match serde_json::from_str::<Vec<RawQuestionRecord>>(payload) {
            Ok(records) => {
                info!("Processing {}: {} records", source, records.len());
                for record in records {
                    self.ingest_record(source, record);
                }
            }
            Err(e) => {
                warn!("Skipping malformed batch {}: {}", source, e);
                self.batch_errors.push(BatchError {
                    source: source.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn ingest_record(&mut self, source: &str, record: RawQuestionRecord) {
        self.processed += 1;

        let title = record
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let link = record
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        // A record needs a title for the question itself and enough material
        // to derive a canonical id; otherwise it is skipped, not an error.
        let (Some(title), Some(id)) = (title, canonical_id(link, title)) else {
            self.skipped += 1;
            return;
        };

        let topics: Vec<String> = record
            .topics
            .map(TopicList::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        match self.merged.get_mut(&id) {
            Some(existing) => {
                // Later sources only extend the sets; first writer wins for
                // every scalar field.
                if !existing.companies.iter().any(|c| c == source) {
                    existing.companies.push(source.to_string());
                }
                for topic in topics {
                    if !existing.topics.contains(&topic) {
                        existing.topics.push(topic);
                    }
                }
            }
            None => {
                let difficulty = record
                    .difficulty
                    .as_deref()
                    .and_then(Difficulty::parse)
                    .unwrap_or(Difficulty::Medium);
                let mut unique_topics: Vec<String> = Vec::new();
                for topic in topics {
                    if !unique_topics.contains(&topic) {
                        unique_topics.push(topic);
                    }
                }
                self.merged.insert(
                    id.clone(),
                    Question {
                        id,
                        title: title.to_string(),
                        difficulty,
                        topics: unique_topics,
                        companies: vec![source.to_string()],
                        source_url: link.map(resolve_source_url).unwrap_or_default(),
                        solved: false,
                        order: 0,
                        is_custom: false,
                        added_at: Utc::now(),
                    },
                );
            }
        }
    }

    /// Finish the merge: canonical questions sorted by id plus the tally.
    pub fn finish(self) -> (Vec<Question>, ImportReport) {
        let mut questions: Vec<Question> = self.merged.into_values().collect();
        questions.sort_by(|a, b| a.id.cmp(&b.id));
        let report = ImportReport {
            batches: self.batches,
            processed: self.processed,
            skipped: self.skipped,
            unique: questions.len(),
            batch_errors: self.batch_errors,
            inserted: 0,
            updated: 0,
        };
        (questions, report)
    }
}

/// Derive the canonical deduplication id for a record.
///
/// The slug after `/problems/` in the resolved link wins; otherwise the
/// title is slugified. Returns None only when neither yields anything,
/// which callers treat as a skip.
pub fn canonical_id(link: Option<&str>, title: Option<&str>) -> Option<String> {
    if let Some(link) = link {
        let resolved = resolve_source_url(link);
        if let Some(caps) = PROBLEM_SLUG_RE.captures(&resolved) {
            return Some(caps[1].to_lowercase());
        }
    }
    title.and_then(title_slug)
}

/// Lower-case the title, strip everything outside `[a-z0-9]` and collapse
/// each run of stripped characters into a single `-`.
pub fn title_slug(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Absolute links pass through; site-relative ones are resolved against the
/// problem base URL.
pub fn resolve_source_url(link: &str) -> String {
    if let Ok(url) = Url::parse(link) {
        return url.into();
    }
    Url::parse(BASE_PROBLEM_URL)
        .ok()
        .and_then(|base| base.join(link).ok())
        .map(Into::into)
        .unwrap_or_else(|| format!("{}{}", BASE_PROBLEM_URL, link))
}

/// Read every `*.json` file in the data directory. The file stem names the
/// source. An unreadable directory is fatal; an unreadable file is tallied
/// later as a batch error by handing the error text to the importer.
pub fn read_batch_dir(dir: &Path) -> std::io::Result<Vec<(String, String)>> {
    let mut batches = Vec::new();
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    entries.sort();

    for path in entries {
        let source = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        match fs::read_to_string(&path) {
            Ok(payload) => batches.push((source, payload)),
            // Hand the importer something unparseable so the failure shows
            // up in the batch-error tally instead of killing the run.
            Err(e) => batches.push((source, format!("<unreadable: {}>", e))),
        }
    }
    Ok(batches)
}

/// Apply the merged set to the store as per-question upserts. Store errors
/// here are fatal to the run, matching the contract that only persistence
/// failures abort an import.
pub async fn apply(db: &DatabaseManager, questions: &[Question]) -> DbResult<(usize, usize)> {
    let mut inserted = 0;
    let mut updated = 0;
    for question in questions {
        match db.upsert_merged_question(question).await? {
            UpsertOutcome::Inserted => inserted += 1,
            UpsertOutcome::Updated => updated += 1,
        }
    }
    Ok((inserted, updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: Option<&str>, link: Option<&str>) -> RawQuestionRecord {
        RawQuestionRecord {
            title: title.map(String::from),
            link: link.map(String::from),
            difficulty: None,
            topics: None,
        }
    }

    #[test]
    fn canonical_id_prefers_url_slug() {
        assert_eq!(
            canonical_id(Some("https://leetcode.com/problems/two-sum/"), Some("Two Sum")),
            Some("two-sum".to_string())
        );
        assert_eq!(
            canonical_id(Some("/problems/Valid-Anagram/"), None),
            Some("valid-anagram".to_string())
        );
    }

    #[test]
    fn canonical_id_falls_back_to_title_slug() {
        let id = canonical_id(Some("https://example.com/archive/123"), Some("3Sum Closest!"));
        assert_eq!(id, Some("3sum-closest".to_string()));

        let id = canonical_id(None, Some("Best Time to Buy & Sell Stock"));
        assert_eq!(id, Some("best-time-to-buy-sell-stock".to_string()));
    }

    #[test]
    fn title_slug_is_lowercase_alphanumeric_and_collapsed() {
        assert_eq!(title_slug("3Sum Closest!"), Some("3sum-closest".to_string()));
        assert_eq!(title_slug("  ***  "), None);
        assert_eq!(title_slug("A--B"), Some("a-b".to_string()));
    }

    #[test]
    fn relative_links_resolve_against_base() {
        assert_eq!(
            resolve_source_url("/problems/two-sum/"),
            "https://leetcode.com/problems/two-sum/"
        );
        assert_eq!(
            resolve_source_url("https://other.site/problems/x/"),
            "https://other.site/problems/x/"
        );
    }

    #[test]
    fn merge_unions_companies_and_topics() {
        let mut importer = Importer::new();
        importer.ingest_json(
            "Amazon",
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/", "topics": ["Array"]}]"#,
        );
        importer.ingest_json(
            "Google",
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/", "topics": ["Array", "DP"]}]"#,
        );

        let (questions, report) = importer.finish();
        assert_eq!(report.processed, 2);
        assert_eq!(report.unique, 1);
        let q = &questions[0];
        assert_eq!(q.companies, vec!["Amazon", "Google"]);
        assert_eq!(q.topics, vec!["Array", "DP"]);
    }

    #[test]
    fn first_writer_wins_for_scalar_fields() {
        let mut importer = Importer::new();
        importer.ingest_json(
            "Amazon",
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/", "difficulty": "Medium"}]"#,
        );
        importer.ingest_json(
            "Google",
            r#"[{"title": "Two Sum (again)", "link": "/problems/two-sum/", "difficulty": "Hard"}]"#,
        );

        let (questions, _) = importer.finish();
        assert_eq!(questions[0].difficulty, Difficulty::Medium);
        assert_eq!(questions[0].title, "Two Sum");
    }

    #[test]
    fn merge_is_idempotent_over_repeated_batches() {
        let payload =
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/", "topics": ["Array"]}]"#;

        let mut once = Importer::new();
        once.ingest_json("Amazon", payload);
        let (first, _) = once.finish();

        let mut twice = Importer::new();
        twice.ingest_json("Amazon", payload);
        twice.ingest_json("Amazon", payload);
        let (second, report) = twice.finish();

        assert_eq!(report.unique, 1);
        assert_eq!(first[0].companies, second[0].companies);
        assert_eq!(first[0].topics, second[0].topics);
        assert_eq!(first[0].title, second[0].title);
    }

    #[test]
    fn records_without_title_or_link_are_skipped() {
        let mut importer = Importer::new();
        importer.ingest_json(
            "Amazon",
            r#"[{"difficulty": "Easy"}, {"title": "", "link": ""}, {"title": "Two Sum", "link": "/problems/two-sum/"}]"#,
        );
        let (questions, report) = importer.finish();
        assert_eq!(report.processed, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn malformed_batch_is_tallied_and_run_continues() {
        let mut importer = Importer::new();
        importer.ingest_json("Broken", "{ not json");
        importer.ingest_json(
            "Amazon",
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/"}]"#,
        );
        let (questions, report) = importer.finish();
        assert_eq!(report.batch_errors.len(), 1);
        assert_eq!(report.batch_errors[0].source, "Broken");
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn topics_accept_string_or_array() {
        let mut importer = Importer::new();
        importer.ingest_json(
            "Amazon",
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/", "topics": "Array"}]"#,
        );
        importer.ingest_json(
            "Google",
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/", "topics": ["Hash Table"]}]"#,
        );
        let (questions, _) = importer.finish();
        assert_eq!(questions[0].topics, vec!["Array", "Hash Table"]);
    }

    #[test]
    fn unknown_difficulty_defaults_to_medium() {
        let mut importer = Importer::new();
        importer.ingest_json(
            "Amazon",
            r#"[{"title": "Two Sum", "link": "/problems/two-sum/", "difficulty": "Impossible"}]"#,
        );
        let (questions, _) = importer.finish();
        assert_eq!(questions[0].difficulty, Difficulty::Medium);
    }
}
