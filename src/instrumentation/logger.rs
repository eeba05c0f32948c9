use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-section counters. Most degradations in the pipeline are silent at the
/// point of failure; this is where they become visible in aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionLog {
    pub title: String,
    pub query: String,
    pub num_results: u32,
    pub pages_scraped: u32,
    /// Pages that yielded no text: failed fetches and genuinely empty pages
    /// are indistinguishable downstream.
    pub empty_pages: u32,
    pub evidence_chars: u64,
    pub search_latency_ms: u64,
    pub scrape_latency_ms: u64,
    pub draft_latency_ms: u64,
    pub draft_input_tokens: u32,
    pub draft_output_tokens: u32,
    /// False when the section body is the error placeholder.
    pub drafted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: String,
    pub timestamp: String,
    pub topic: String,
    pub sections: Vec<SectionLog>,
    pub outline_latency_ms: u64,
    pub outline_input_tokens: u32,
    pub outline_output_tokens: u32,
    pub reformulated: bool,
    pub reformulation_latency_ms: u64,
    pub total_latency_ms: u64,
    pub total_llm_input_tokens: u32,
    pub total_llm_output_tokens: u32,
    pub output_path: String,
}

impl RunReport {
    pub fn total_tokens(&self) -> u32 {
        self.total_llm_input_tokens + self.total_llm_output_tokens
    }

    pub fn summary(&self) -> String {
        let pages: u32 = self.sections.iter().map(|s| s.pages_scraped).sum();
        let empty: u32 = self.sections.iter().map(|s| s.empty_pages).sum();
        let placeholders = self.sections.iter().filter(|s| !s.drafted).count();
        format!(
            "Sections: {} | Pages scraped: {} (empty: {}) | Draft placeholders: {} | Reformulated: {} | Total latency: {:.1}s | LLM tokens: {}",
            self.sections.len(),
            pages,
            empty,
            placeholders,
            if self.reformulated { "yes" } else { "no" },
            self.total_latency_ms as f64 / 1000.0,
            self.total_tokens(),
        )
    }
}

pub struct RunLogger {
    dir: PathBuf,
}

impl RunLogger {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).context("Failed to create logs directory")?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn write(&self, report: &RunReport) -> Result<()> {
        let path = self.dir.join("runs.jsonl");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;

        let json = serde_json::to_string(report).context("Failed to serialize run report")?;
        writeln!(file, "{}", json).context("Failed to write run report")?;

        Ok(())
    }
}
