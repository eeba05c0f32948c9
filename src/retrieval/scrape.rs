use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;

/// Tags whose entire subtree is invisible noise for evidence purposes.
const SKIP_TAGS: &[&str] = &["script", "style", "noscript"];

/// Tags that start a new line in the flattened text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "article",
    "section", "main", "blockquote", "pre",
];

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the raw response body for `url`.
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} fetching {}", status, url);
        }

        response.text().await.context("Failed to read response body")
    }
}

/// Fetches a page and flattens it to capped plain text. Every failure is
/// absorbed here: a page that cannot be fetched contributes no evidence, and
/// the run continues.
pub struct PageScraper {
    fetcher: Box<dyn PageFetcher>,
    char_budget: usize,
}

impl PageScraper {
    pub fn new(fetcher: Box<dyn PageFetcher>, char_budget: usize) -> Self {
        Self {
            fetcher,
            char_budget,
        }
    }

    pub async fn scrape(&self, url: &str) -> String {
        match self.fetcher.fetch(url).await {
            Ok(body) => html_to_text(&body, self.char_budget),
            Err(e) => {
                tracing::warn!(url, error = %e, "Failed to scrape page");
                String::new()
            }
        }
    }
}

/// Flattens HTML to visible plain text: script/style subtrees dropped,
/// whitespace runs collapsed, blank lines removed, output truncated to
/// `max_chars` characters.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let doc = Html::parse_document(html);

    let body_sel = Selector::parse("body").expect("static selector");
    let root = doc.select(&body_sel).next().unwrap_or_else(|| doc.root_element());

    let mut buf = String::new();
    collect_text(&root, &mut buf);

    let collapsed = collapse_whitespace(&buf);
    truncate_chars(&collapsed, max_chars).to_string()
}

fn collect_text(node: &ElementRef<'_>, buf: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                if BLOCK_TAGS.contains(&tag) {
                    buf.push('\n');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, buf);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
