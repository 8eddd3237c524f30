pub mod models;
pub mod postgres;

pub use models::{
    Difficulty, LeetcodeStats, Progress, ProgressStats, Question, QuestionFilter, User,
};
pub use postgres::{DatabaseManager, UpsertOutcome};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
