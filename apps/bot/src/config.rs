use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::FixedOffset;

/// Tunables for the novelty-filtered idea pipeline.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Sequence-similarity ratio at or above which a title counts as a duplicate.
    pub similarity_threshold: f64,
    /// Drafts attempted before giving up for the day.
    pub max_attempts: u32,
    /// Alternate software / mixed ideas instead of sending software only.
    pub alternate_kinds: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.82,
            max_attempts: 4,
            alternate_kinds: false,
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub gemini_api_key: String,
    /// Fallback model when auto-detection finds nothing better.
    pub gemini_model: String,
    pub send_interval_minutes: u64,
    pub meal_send_hour: u32,
    pub meal_send_minute: u32,
    pub utc_offset: FixedOffset,
    /// Directory holding the history and summary files.
    pub data_dir: PathBuf,
    pub generation: GenerationConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(&lookup);
        let defaults = GenerationConfig::default();

        let meal_send_hour: u32 = env.parse("MEAL_SEND_HOUR", 17)?;
        let meal_send_minute: u32 = env.parse("MEAL_SEND_MINUTE", 30)?;
        anyhow::ensure!(meal_send_hour < 24, "MEAL_SEND_HOUR must be 0-23");
        anyhow::ensure!(meal_send_minute < 60, "MEAL_SEND_MINUTE must be 0-59");

        let similarity_threshold: f64 =
            env.parse("SIMILARITY_THRESHOLD", defaults.similarity_threshold)?;
        anyhow::ensure!(
            (0.0..=1.0).contains(&similarity_threshold),
            "SIMILARITY_THRESHOLD must be between 0.0 and 1.0"
        );
        let max_attempts: u32 = env.parse("MAX_ATTEMPTS", defaults.max_attempts)?;
        anyhow::ensure!(max_attempts > 0, "MAX_ATTEMPTS must be at least 1");

        let send_interval_minutes: u64 = env.parse("SEND_INTERVAL_MINUTES", 240)?;
        anyhow::ensure!(
            send_interval_minutes > 0,
            "SEND_INTERVAL_MINUTES must be at least 1"
        );

        let utc_offset = env.or("UTC_OFFSET", "+09:00");

        Ok(Config {
            telegram_bot_token: env.require("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: env.require("TELEGRAM_CHAT_ID")?,
            gemini_api_key: env.require("GEMINI_API_KEY")?,
            gemini_model: env.or("GEMINI_MODEL", "gemini-1.5-pro"),
            send_interval_minutes,
            meal_send_hour,
            meal_send_minute,
            utc_offset: parse_utc_offset(&utc_offset)
                .with_context(|| format!("UTC_OFFSET '{utc_offset}' must look like +09:00"))?,
            data_dir: PathBuf::from(env.or("DATA_DIR", ".")),
            generation: GenerationConfig {
                similarity_threshold,
                max_attempts,
                alternate_kinds: env.parse("ALTERNATE_IDEA_KINDS", defaults.alternate_kinds)?,
            },
            port: env.parse("PORT", 8080)?,
            rust_log: env.or("RUST_LOG", "info"),
        })
    }
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn require(&self, key: &str) -> Result<String> {
        (self.0)(key).with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match (self.0)(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value: '{raw}'")),
            None => Ok(default),
        }
    }
}

/// Parses `+HH:MM` / `-HH:MM` into a fixed offset.
fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => (1, raw),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().context("invalid hour component")?;
    let minutes: i32 = minutes.parse().context("invalid minute component")?;
    anyhow::ensure!(
        (0..=14).contains(&hours) && (0..60).contains(&minutes),
        "offset out of range"
    );

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .context("offset out of range")
}
