use std::env;

/// Process configuration, read from individual environment variables with
/// development defaults. Call after `dotenvy::dotenv()`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
    pub leetcode_api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            db_host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            db_port: env::var("DB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5432),
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "codequest_db".to_string()),
            db_user: env::var("DB_USER").unwrap_or_else(|_| "codequest_user".to_string()),
            db_password: env::var("DB_PASSWORD").unwrap_or_else(|_| "".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "codequest_dev_secret_change_in_production".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            leetcode_api_base: env::var("LEETCODE_API_BASE")
                .unwrap_or_else(|_| "https://leetcode-stats-api.herokuapp.com".to_string()),
        }
    }
}
