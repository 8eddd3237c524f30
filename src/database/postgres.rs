use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use log::info;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use super::models::*;
use super::{DatabaseError, Result};
use crate::config::AppConfig;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    leetcode_username TEXT NOT NULL DEFAULT '',
    last_leetcode_sync TIMESTAMPTZ,
    easy_solved INT NOT NULL DEFAULT 0,
    medium_solved INT NOT NULL DEFAULT 0,
    hard_solved INT NOT NULL DEFAULT 0,
    total_solved INT NOT NULL DEFAULT 0,
    acceptance_rate DOUBLE PRECISION NOT NULL DEFAULT 0,
    ranking INT NOT NULL DEFAULT 0,
    solved_problem_ids TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS questions (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    topics TEXT[] NOT NULL DEFAULT '{}',
    companies TEXT[] NOT NULL DEFAULT '{}',
    source_url TEXT NOT NULL DEFAULT '',
    solved BOOLEAN NOT NULL DEFAULT FALSE,
    display_order INT NOT NULL DEFAULT 0,
    is_custom BOOLEAN NOT NULL DEFAULT FALSE,
    added_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_questions_difficulty ON questions (difficulty);
CREATE INDEX IF NOT EXISTS idx_questions_companies ON questions USING GIN (companies);

CREATE TABLE IF NOT EXISTS progress (
    user_id TEXT PRIMARY KEY,
    completed_question_ids TEXT[] NOT NULL DEFAULT '{}',
    total_completed INT NOT NULL DEFAULT 0,
    last_updated TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// Result of an importer upsert: whether the row was freshly inserted or an
/// existing row had its company/topic sets extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// The record store. All persistence goes through this type; it owns the
/// connection pool and the readiness state the health endpoint reports.
#[derive(Debug)]
pub struct DatabaseManager {
    pool: Pool,
}

impl DatabaseManager {
    /// Build the connection pool. No I/O happens here; connections are
    /// established lazily on first use.
    pub fn connect(config: &AppConfig) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.host = Some(config.db_host.clone());
        cfg.port = Some(config.db_port);
        cfg.dbname = Some(config.db_name.clone());
        cfg.user = Some(config.db_user.clone());
        cfg.password = Some(config.db_password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Pool creation failed: {}", e)))?;

        Ok(DatabaseManager { pool })
    }

    /// Verify connectivity and make sure the schema exists.
    pub async fn initialize(&self) -> Result<()> {
        let client = self.client().await?;

        client
            .query_one("SELECT 1 as ping", &[])
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Ping failed: {}", e)))?;

        client
            .batch_execute(SCHEMA)
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Schema setup failed: {}", e)))?;

        info!("Database connection established and schema ready");

        Ok(())
    }

    /// Live readiness probe for the health endpoint.
    pub async fn ping(&self) -> bool {
        match self.pool.get().await {
            Ok(client) => client.query_one("SELECT 1 as ping", &[]).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn client(&self) -> Result<deadpool_postgres::Client> {
        self.pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
    }

    // ---------- questions ----------

    pub async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        let client = self.client().await?;

        let difficulty = filter.difficulty.map(|d| d.as_str().to_string());
        let search_pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref company) = filter.company {
            params.push(company);
            clauses.push(format!("${} = ANY(companies)", params.len()));
        }
        if let Some(ref d) = difficulty {
            params.push(d);
            clauses.push(format!("difficulty = ${}", params.len()));
        }
        if let Some(ref pattern) = search_pattern {
            params.push(pattern);
            let n = params.len();
            clauses.push(format!(
                "(title ILIKE ${n} OR EXISTS (SELECT 1 FROM unnest(companies) AS c WHERE c ILIKE ${n}))"
            ));
        }

        let mut sql = String::from(
            "SELECT id, title, difficulty, topics, companies, source_url, solved, \
             display_order, is_custom, added_at FROM questions",
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY display_order, title");

        let rows = client
            .query(sql.as_str(), &params)
            .await
            .map_err(map_query_err)?;

        Ok(rows.iter().map(question_from_row).collect())
    }

    pub async fn distinct_companies(&self) -> Result<Vec<String>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT DISTINCT unnest(companies) AS company FROM questions ORDER BY company",
                &[],
            )
            .await
            .map_err(map_query_err)?;
        Ok(rows.iter().map(|row| row.get("company")).collect())
    }

    pub async fn questions_for_company(&self, company: &str) -> Result<Vec<Question>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, title, difficulty, topics, companies, source_url, solved, \
                 display_order, is_custom, added_at FROM questions \
                 WHERE $1 = ANY(companies) ORDER BY display_order, title",
                &[&company],
            )
            .await
            .map_err(map_query_err)?;
        Ok(rows.iter().map(question_from_row).collect())
    }

    pub async fn get_question(&self, id: &str) -> Result<Option<Question>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT id, title, difficulty, topics, companies, source_url, solved, \
                 display_order, is_custom, added_at FROM questions WHERE id = $1",
                &[&id],
            )
            .await
            .map_err(map_query_err)?;
        Ok(row.as_ref().map(question_from_row))
    }

    pub async fn insert_question(&self, question: &Question) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO questions \
                 (id, title, difficulty, topics, companies, source_url, solved, display_order, is_custom, added_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &question.id,
                    &question.title,
                    &question.difficulty.as_str(),
                    &question.topics,
                    &question.companies,
                    &question.source_url,
                    &question.solved,
                    &question.order,
                    &question.is_custom,
                    &question.added_at,
                ],
            )
            .await
            .map_err(map_query_err)?;
        Ok(())
    }

    pub async fn update_question(&self, question: &Question) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "UPDATE questions SET title = $2, difficulty = $3, topics = $4, companies = $5, \
                 source_url = $6, solved = $7, display_order = $8 WHERE id = $1",
                &[
                    &question.id,
                    &question.title,
                    &question.difficulty.as_str(),
                    &question.topics,
                    &question.companies,
                    &question.source_url,
                    &question.solved,
                    &question.order,
                ],
            )
            .await
            .map_err(map_query_err)?;
        Ok(())
    }

    /// Flip the solved flag on a question. Returns false when no such
    /// question exists; the caller treats that as a tolerated miss, not an
    /// error.
    pub async fn set_question_solved(&self, id: &str, solved: bool) -> Result<bool> {
        let client = self.client().await?;
        let affected = client
            .execute(
                "UPDATE questions SET solved = $2 WHERE id = $1",
                &[&id, &solved],
            )
            .await
            .map_err(map_query_err)?;
        Ok(affected > 0)
    }

    /// Importer upsert. On first insert all fields are set; on conflict only
    /// the company/topic sets are unioned in, so scalar fields keep their
    /// first-seen values and re-runs are idempotent.
    pub async fn upsert_merged_question(&self, question: &Question) -> Result<UpsertOutcome> {
        let client = self.client().await?;
        // xmax is 0 only for a freshly inserted row version.
        let row = client
            .query_one(
                "INSERT INTO questions \
                 (id, title, difficulty, topics, companies, source_url, solved, display_order, is_custom, added_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (id) DO UPDATE SET \
                   companies = (SELECT COALESCE(array_agg(DISTINCT c), '{}') \
                                FROM unnest(questions.companies || EXCLUDED.companies) AS c), \
                   topics = (SELECT COALESCE(array_agg(DISTINCT t), '{}') \
                             FROM unnest(questions.topics || EXCLUDED.topics) AS t) \
                 RETURNING (xmax = 0) AS inserted",
                &[
                    &question.id,
                    &question.title,
                    &question.difficulty.as_str(),
                    &question.topics,
                    &question.companies,
                    &question.source_url,
                    &question.solved,
                    &question.order,
                    &question.is_custom,
                    &question.added_at,
                ],
            )
            .await
            .map_err(map_query_err)?;

        if row.get::<_, bool>("inserted") {
            Ok(UpsertOutcome::Inserted)
        } else {
            Ok(UpsertOutcome::Updated)
        }
    }

    pub async fn count_questions(&self) -> Result<i64> {
        let client = self.client().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM questions", &[])
            .await
            .map_err(map_query_err)?;
        Ok(row.get(0))
    }

    // ---------- progress ----------

    pub async fn get_progress(&self, user_id: &str) -> Result<Option<Progress>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT user_id, completed_question_ids, total_completed, last_updated \
                 FROM progress WHERE user_id = $1",
                &[&user_id],
            )
            .await
            .map_err(map_query_err)?;
        Ok(row.map(|row| Progress {
            user_id: row.get("user_id"),
            completed_question_ids: row.get("completed_question_ids"),
            total_completed: row.get("total_completed"),
            last_updated: row.get("last_updated"),
        }))
    }

    pub async fn upsert_progress(&self, progress: &Progress) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO progress (user_id, completed_question_ids, total_completed, last_updated) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                   completed_question_ids = EXCLUDED.completed_question_ids, \
                   total_completed = EXCLUDED.total_completed, \
                   last_updated = EXCLUDED.last_updated",
                &[
                    &progress.user_id,
                    &progress.completed_question_ids,
                    &progress.total_completed,
                    &progress.last_updated,
                ],
            )
            .await
            .map_err(map_query_err)?;
        Ok(())
    }

    /// Count completed questions per difficulty by joining the id set
    /// against live question rows. Ids that no longer resolve contribute to
    /// no bucket.
    pub async fn difficulty_counts(&self, ids: &[String]) -> Result<(i64, i64, i64)> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT difficulty, COUNT(*) AS total FROM questions \
                 WHERE id = ANY($1) GROUP BY difficulty",
                &[&ids],
            )
            .await
            .map_err(map_query_err)?;

        let (mut easy, mut medium, mut hard) = (0i64, 0i64, 0i64);
        for row in &rows {
            let total: i64 = row.get("total");
            match Difficulty::parse(row.get("difficulty")) {
                Some(Difficulty::Easy) => easy = total,
                Some(Difficulty::Medium) => medium = total,
                Some(Difficulty::Hard) => hard = total,
                None => {}
            }
        }
        Ok((easy, medium, hard))
    }

    // ---------- users ----------

    pub async fn create_user(&self, user: &User) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO users \
                 (id, username, email, password_hash, leetcode_username, last_leetcode_sync, \
                  easy_solved, medium_solved, hard_solved, total_solved, acceptance_rate, ranking, \
                  solved_problem_ids, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
                &[
                    &user.id,
                    &user.username,
                    &user.email,
                    &user.password_hash,
                    &user.leetcode_username,
                    &user.last_leetcode_sync,
                    &user.leetcode_stats.easy_solved,
                    &user.leetcode_stats.medium_solved,
                    &user.leetcode_stats.hard_solved,
                    &user.leetcode_stats.total_solved,
                    &user.leetcode_stats.acceptance_rate,
                    &user.leetcode_stats.ranking,
                    &user.solved_problem_ids,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await
            .map_err(map_query_err)?;
        Ok(())
    }

    pub async fn user_exists(&self, email: &str, username: &str) -> Result<bool> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT 1 AS present FROM users WHERE email = $1 OR username = $2 LIMIT 1",
                &[&email, &username],
            )
            .await
            .map_err(map_query_err)?;
        Ok(row.is_some())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let client = self.client().await?;
        let row = client
            .query_opt(user_select("email = $1").as_str(), &[&email])
            .await
            .map_err(map_query_err)?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let client = self.client().await?;
        let row = client
            .query_opt(user_select("id = $1").as_str(), &[&id])
            .await
            .map_err(map_query_err)?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn set_leetcode_username(&self, id: Uuid, username: &str) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "UPDATE users SET leetcode_username = $2, updated_at = now() WHERE id = $1",
                &[&id, &username],
            )
            .await
            .map_err(map_query_err)?;
        Ok(())
    }

    pub async fn update_leetcode_stats(
        &self,
        id: Uuid,
        stats: &LeetcodeStats,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "UPDATE users SET easy_solved = $2, medium_solved = $3, hard_solved = $4, \
                 total_solved = $5, acceptance_rate = $6, ranking = $7, \
                 last_leetcode_sync = $8, updated_at = now() WHERE id = $1",
                &[
                    &id,
                    &stats.easy_solved,
                    &stats.medium_solved,
                    &stats.hard_solved,
                    &stats.total_solved,
                    &stats.acceptance_rate,
                    &stats.ranking,
                    &synced_at,
                ],
            )
            .await
            .map_err(map_query_err)?;
        Ok(())
    }
}

fn user_select(condition: &str) -> String {
    format!(
        "SELECT id, username, email, password_hash, leetcode_username, last_leetcode_sync, \
         easy_solved, medium_solved, hard_solved, total_solved, acceptance_rate, ranking, \
         solved_problem_ids, created_at, updated_at FROM users WHERE {}",
        condition
    )
}

fn question_from_row(row: &Row) -> Question {
    Question {
        id: row.get("id"),
        title: row.get("title"),
        // Unknown values cannot appear through this crate's writers; fall
        // back to Medium rather than failing the whole read.
        difficulty: Difficulty::parse(row.get("difficulty")).unwrap_or(Difficulty::Medium),
        topics: row.get("topics"),
        companies: row.get("companies"),
        source_url: row.get("source_url"),
        solved: row.get("solved"),
        order: row.get("display_order"),
        is_custom: row.get("is_custom"),
        added_at: row.get("added_at"),
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        leetcode_username: row.get("leetcode_username"),
        last_leetcode_sync: row.get("last_leetcode_sync"),
        leetcode_stats: LeetcodeStats {
            easy_solved: row.get("easy_solved"),
            medium_solved: row.get("medium_solved"),
            hard_solved: row.get("hard_solved"),
            total_solved: row.get("total_solved"),
            acceptance_rate: row.get("acceptance_rate"),
            ranking: row.get("ranking"),
        },
        solved_problem_ids: row.get("solved_problem_ids"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_query_err(e: tokio_postgres::Error) -> DatabaseError {
    if let Some(state) = e.code() {
        if *state == SqlState::UNIQUE_VIOLATION {
            return DatabaseError::DuplicateKey(e.to_string());
        }
    }
    DatabaseError::QueryFailed(e.to_string())
}
