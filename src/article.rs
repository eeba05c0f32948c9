use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// One drafted section, keyed by outline position.
#[derive(Debug, Clone)]
pub struct SectionDraft {
    pub title: String,
    pub html: String,
}

/// The assembled article as an ordered fragment sequence. Serialization is
/// deferred to `render`, so each fragment stays checkable on its own before
/// the reformulation pass replaces the whole string.
#[derive(Debug, Clone)]
pub struct Article {
    topic: String,
    sections: Vec<SectionDraft>,
}

impl Article {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn push_section(&mut self, draft: SectionDraft) {
        self.sections.push(draft);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str(&format!("<title>{}</title>\n", self.topic));
        out.push_str("</head>\n<body>\n");
        out.push_str(&format!("<h1>{}</h1>\n", self.topic));
        for section in &self.sections {
            out.push_str(&format!("<h2>{}</h2>\n", section.title));
            out.push_str(&section.html);
            out.push('\n');
        }
        out.push_str("</body>\n</html>");
        out
    }
}

/// Normalizes a model response into an HTML fragment. The model is not a
/// strict fragment emitter, so an explicit allow-list of wrappers is removed:
/// Markdown code fences and outer `<html>`/`<body>` tags.
pub fn sanitize_fragment(raw: &str) -> String {
    let without_fences = raw.replace("```html", "").replace("```", "");

    let mut out = without_fences.trim();
    for tag in ["<html>", "<body>"] {
        if let Some(rest) = out.strip_prefix(tag) {
            out = rest.trim_start();
        }
    }
    for tag in ["</html>", "</body>"] {
        if let Some(rest) = out.strip_suffix(tag) {
            out = rest.trim_end();
        }
    }
    out.trim().to_string()
}

pub fn output_filename(now: DateTime<Local>) -> String {
    format!("generated_article_{}.html", now.format("%Y%m%d_%H%M%S"))
}

/// Writes the final article under `dir` and returns the full path. Two runs
/// finishing within the same second collide; the later write wins.
pub fn write_article(html: &str, dir: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(output_filename(now));
    fs::write(&path, html)
        .with_context(|| format!("Failed to write article to {}", path.display()))?;
    Ok(path)
}
