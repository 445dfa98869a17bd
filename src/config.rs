use std::str::FromStr;

use anyhow::anyhow;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://review_desk.db";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 320;
pub const DEFAULT_GEMINI_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Missing keys are reported on each call, not at startup.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_addr: String,
    pub auth_jwt_secret: String,
    pub max_upload_bytes: usize,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let auth_jwt_secret = non_empty("AUTH_JWT_SECRET")
            .ok_or_else(|| anyhow!("AUTH_JWT_SECRET must be set"))?;

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            server_addr: non_empty("SERVER_ADDR")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            auth_jwt_secret,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
                .max(1024),
            gemini: GeminiConfig {
                api_key: non_empty("GEMINI_API_KEY"),
                model: non_empty("GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: non_empty("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                timeout_secs: parse_or(&lookup, "GEMINI_TIMEOUT_SECS", DEFAULT_GEMINI_TIMEOUT_SECS)
                    .max(1),
                temperature: parse_or(&lookup, "GEMINI_TEMPERATURE", DEFAULT_GEMINI_TEMPERATURE)
                    .clamp(0.0, 2.0),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
}
