use std::env;
use std::time::Duration;

use crate::api::DEFAULT_ANALYSIS_GAMES;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Runtime settings resolved from the environment (after `.env` loading).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoutConfig {
    pub api_base: String,
    pub http_timeout: Duration,
    pub retry_limit: u32,
    pub retry_delay: Duration,
    pub n_games: u32,
    pub video_poll: Duration,
    pub demo: bool,
    pub fetch_parallelism: usize,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(10),
            retry_limit: 2,
            retry_delay: Duration::from_millis(400),
            n_games: DEFAULT_ANALYSIS_GAMES,
            video_poll: Duration::from_millis(1500),
            demo: false,
            fetch_parallelism: 6,
        }
    }
}

impl ScoutConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let opt = |key: &str| {
            lookup(key).and_then(|val| {
                let trimmed = val.trim().to_string();
                if trimmed.is_empty() { None } else { Some(trimmed) }
            })
        };
        let num = |key: &str, default: u64| {
            opt(key)
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(default)
        };

        let api_base = opt("SCOUT_API_URL")
            .or_else(|| opt("NEXT_PUBLIC_API_URL"))
            .map(|url| normalize_base_url(&url))
            .unwrap_or(defaults.api_base);

        Self {
            api_base,
            http_timeout: Duration::from_secs(num("SCOUT_HTTP_TIMEOUT_SECS", 10).clamp(1, 120)),
            retry_limit: num("SCOUT_RETRY_LIMIT", 2).min(6) as u32,
            retry_delay: Duration::from_millis(num("SCOUT_RETRY_DELAY_MS", 400).min(10_000)),
            n_games: num("SCOUT_N_GAMES", defaults.n_games as u64).clamp(1, 1000) as u32,
            video_poll: Duration::from_millis(num("SCOUT_VIDEO_POLL_MS", 1500).max(250)),
            demo: opt("SCOUT_DEMO").is_some_and(|val| parse_flag(&val)),
            fetch_parallelism: num("FETCH_PARALLELISM", 6).clamp(2, 32) as usize,
        }
    }
}

pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Loads `.env.local` then `.env`; missing files are fine.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
