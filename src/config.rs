use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub search_api_key: String,
    pub search_engine_id: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub max_search_results: u32,
    pub scrape_char_budget: usize,
    pub scrape_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            search_api_key: std::env::var("GOOGLE_CSE_API_KEY")
                .context("GOOGLE_CSE_API_KEY must be set")?,
            search_engine_id: std::env::var("GOOGLE_CSE_SEARCHENGINE_ID")
                .context("GOOGLE_CSE_SEARCHENGINE_ID must be set")?,
            gemini_api_key: std::env::var("GOOGLE_GEMINI_API_KEY")
                .context("GOOGLE_GEMINI_API_KEY must be set")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".into()),
            max_search_results: std::env::var("MAX_SEARCH_RESULTS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .context("MAX_SEARCH_RESULTS must be a number")?,
            scrape_char_budget: std::env::var("SCRAPE_CHAR_BUDGET")
                .unwrap_or_else(|_| "20000".into())
                .parse()
                .context("SCRAPE_CHAR_BUDGET must be a number")?,
            scrape_timeout_secs: std::env::var("SCRAPE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .context("SCRAPE_TIMEOUT_SECS must be a number")?,
            output_dir: std::env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| ".".into())
                .into(),
            log_dir: std::env::var("LOG_DIR")
                .unwrap_or_else(|_| "logs".into())
                .into(),
        })
    }
}
