use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Question difficulty. Stored as plain text in the database, fixed to the
/// three levels the datasets use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Case-insensitive parse. Returns None for anything outside the three
    /// known levels; callers decide the fallback.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical interview question. `id` is the deduplication key derived from
/// the source URL or title; `companies` and `topics` are append-only sets
/// across imports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub topics: Vec<String>,
    pub companies: Vec<String>,
    pub source_url: String,
    pub solved: bool,
    pub order: i32,
    pub is_custom: bool,
    pub added_at: DateTime<Utc>,
}

/// Per-user completion aggregate. `total_completed` is derived state and must
/// always equal the set size; it is recomputed on every mutation, never
/// incremented independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    pub completed_question_ids: Vec<String>,
    pub total_completed: i32,
    pub last_updated: DateTime<Utc>,
}

impl Progress {
    /// The defined initial state for a user with no recorded progress.
    pub fn empty(user_id: &str) -> Self {
        Progress {
            user_id: user_id.to_string(),
            completed_question_ids: Vec::new(),
            total_completed: 0,
            last_updated: Utc::now(),
        }
    }
}

/// Cached stats fetched from the external LeetCode stats service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeetcodeStats {
    pub easy_solved: i32,
    pub medium_solved: i32,
    pub hard_solved: i32,
    pub total_solved: i32,
    pub acceptance_rate: f64,
    pub ranking: i32,
}

/// Registered account. The password hash is never serialized into responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub leetcode_username: String,
    pub last_leetcode_sync: Option<DateTime<Utc>>,
    pub leetcode_stats: LeetcodeStats,
    pub solved_problem_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_solved(&self, problem_id: &str) -> bool {
        self.solved_problem_ids.iter().any(|id| id == problem_id)
    }
}

/// Filters accepted by the question listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub company: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub search: Option<String>,
}

/// Difficulty-bucketed dashboard stats. Completed ids whose question no
/// longer exists count toward `total_completed` but land in no bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_completed: i32,
    pub easy: i64,
    pub medium: i64,
    pub hard: i64,
    pub last_active: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("MEDIUM"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse(" Hard "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("extreme"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn question_serializes_with_camel_case_fields() {
        let question = Question {
            id: "two-sum".into(),
            title: "Two Sum".into(),
            difficulty: Difficulty::Easy,
            topics: vec!["Array".into()],
            companies: vec!["Amazon".into()],
            source_url: "https://leetcode.com/problems/two-sum/".into(),
            solved: false,
            order: 0,
            is_custom: false,
            added_at: Utc::now(),
        };
        let json = serde_json::to_value(&question).expect("serialize");
        assert_eq!(json["sourceUrl"], "https://leetcode.com/problems/two-sum/");
        assert_eq!(json["isCustom"], false);
        assert_eq!(json["difficulty"], "Easy");
    }

    #[test]
    fn user_json_never_contains_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "secret-hash".into(),
            leetcode_username: String::new(),
            last_leetcode_sync: None,
            leetcode_stats: LeetcodeStats::default(),
            solved_problem_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("passwordHash"));
    }
}
