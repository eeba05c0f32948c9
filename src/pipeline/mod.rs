pub mod drafter;
pub mod outline;
pub mod reformulator;

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;

use crate::article::{self, Article, SectionDraft};
use crate::config::Config;
use crate::instrumentation::{RunLogger, RunReport, SectionLog};
use crate::llm::{GeminiClient, SharedGenerator};
use crate::retrieval::{GoogleSearchClient, HttpFetcher, PageScraper, SearchProvider};

use drafter::{evidence_block, SectionDrafter};
use outline::OutlineGenerator;
use reformulator::Reformulator;

/// The whole run: outline once, then per section search → scrape → draft in
/// order, then assemble, reformulate, persist. Strictly sequential; the only
/// accumulating state is the article itself and the run report.
pub struct Pipeline {
    outline: OutlineGenerator,
    drafter: SectionDrafter,
    reformulator: Reformulator,
    search: Box<dyn SearchProvider>,
    scraper: PageScraper,
    config: Config,
    logger: RunLogger,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let llm: SharedGenerator = Arc::new(GeminiClient::new(
            &config.gemini_api_key,
            &config.gemini_model,
        ));
        let search = Box::new(GoogleSearchClient::new(
            &config.search_api_key,
            &config.search_engine_id,
        ));
        let fetcher = Box::new(HttpFetcher::new(config.scrape_timeout_secs)?);
        let scraper = PageScraper::new(fetcher, config.scrape_char_budget);
        let logger = RunLogger::new(&config.log_dir)?;

        Ok(Self::with_components(
            OutlineGenerator::new(llm.clone()),
            SectionDrafter::new(llm.clone()),
            Reformulator::new(llm),
            search,
            scraper,
            config,
            logger,
        ))
    }

    pub fn with_components(
        outline: OutlineGenerator,
        drafter: SectionDrafter,
        reformulator: Reformulator,
        search: Box<dyn SearchProvider>,
        scraper: PageScraper,
        config: Config,
        logger: RunLogger,
    ) -> Self {
        Self {
            outline,
            drafter,
            reformulator,
            search,
            scraper,
            config,
            logger,
        }
    }

    pub async fn run(&self, topic: &str, verbose: bool) -> Result<RunReport> {
        let run_start = Instant::now();

        let outline_start = Instant::now();
        let (outline, outline_response) = self.outline.generate(topic).await?;
        let outline_latency = outline_start.elapsed().as_millis() as u64;

        if verbose {
            eprintln!(
                "[outline] {} sections in {}ms",
                outline.sections.len(),
                outline_latency
            );
        }

        let mut article = Article::new(topic);
        let mut section_logs: Vec<SectionLog> = Vec::new();

        for spec in &outline.sections {
            if verbose {
                eprintln!("Processing section: {}", spec.title);
            }

            // Search failures abort the run; everything below degrades locally.
            let search_start = Instant::now();
            let urls = self
                .search
                .search(&spec.query, self.config.max_search_results)
                .await?;
            let search_latency = search_start.elapsed().as_millis() as u64;

            let scrape_start = Instant::now();
            let mut pages: Vec<(String, String)> = Vec::new();
            for url in &urls {
                let text = self.scraper.scrape(url).await;
                pages.push((url.clone(), text));
            }
            let scrape_latency = scrape_start.elapsed().as_millis() as u64;

            let empty_pages = pages.iter().filter(|(_, text)| text.is_empty()).count() as u32;
            let evidence = evidence_block(&pages);

            let draft_start = Instant::now();
            let (html, draft_response) = self.drafter.draft(&spec.prompt, &evidence).await;
            let draft_latency = draft_start.elapsed().as_millis() as u64;

            let (draft_input_tokens, draft_output_tokens) = draft_response
                .as_ref()
                .map(|r| (r.input_tokens, r.output_tokens))
                .unwrap_or((0, 0));

            if verbose {
                eprintln!(
                    "[section] {} results, {} pages scraped, search={}ms scrape={}ms draft={}ms",
                    urls.len(),
                    pages.len() as u32 - empty_pages,
                    search_latency,
                    scrape_latency,
                    draft_latency
                );
            }

            section_logs.push(SectionLog {
                title: spec.title.clone(),
                query: spec.query.clone(),
                num_results: urls.len() as u32,
                pages_scraped: pages.len() as u32,
                empty_pages,
                evidence_chars: evidence.chars().count() as u64,
                search_latency_ms: search_latency,
                scrape_latency_ms: scrape_latency,
                draft_latency_ms: draft_latency,
                draft_input_tokens,
                draft_output_tokens,
                drafted: draft_response.is_some(),
            });

            article.push_section(SectionDraft {
                title: spec.title.clone(),
                html,
            });
        }

        let assembled = article.render();

        if verbose {
            eprintln!("Initial article generated. Now reformulating...");
        }

        let reform_start = Instant::now();
        let (final_html, reform_response) = self.reformulator.reformulate(&assembled).await;
        let reformulation_latency = reform_start.elapsed().as_millis() as u64;

        let path = article::write_article(&final_html, &self.config.output_dir, chrono::Local::now())?;

        let (reform_input_tokens, reform_output_tokens) = reform_response
            .as_ref()
            .map(|r| (r.input_tokens, r.output_tokens))
            .unwrap_or((0, 0));
        let total_llm_input_tokens = outline_response.input_tokens
            + reform_input_tokens
            + section_logs.iter().map(|s| s.draft_input_tokens).sum::<u32>();
        let total_llm_output_tokens = outline_response.output_tokens
            + reform_output_tokens
            + section_logs.iter().map(|s| s.draft_output_tokens).sum::<u32>();

        let report = RunReport {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            topic: topic.to_string(),
            sections: section_logs,
            outline_latency_ms: outline_latency,
            outline_input_tokens: outline_response.input_tokens,
            outline_output_tokens: outline_response.output_tokens,
            reformulated: reform_response.is_some(),
            reformulation_latency_ms: reformulation_latency,
            total_latency_ms: run_start.elapsed().as_millis() as u64,
            total_llm_input_tokens,
            total_llm_output_tokens,
            output_path: path.display().to_string(),
        };

        self.logger.write(&report)?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{FailingGenerator, FnGenerator, ScriptedGenerator};
    use crate::retrieval::PageFetcher;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const OUTLINE_JSON: &str = r#"{
        "tableOfContents": [
            {"section": "Market Overview", "query": "EV market share Europe", "prompt": "Write about 'Market Overview' based on:"},
            {"section": "Policy Drivers", "query": "EU EV subsidies", "prompt": "Write about 'Policy Drivers' based on:"}
        ]
    }"#;

    struct ScriptedSearch(Mutex<VecDeque<Vec<String>>>);

    impl ScriptedSearch {
        fn new<const N: usize>(results: [Vec<String>; N]) -> Box<Self> {
            Box::new(Self(Mutex::new(results.into_iter().collect())))
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedSearch {
        async fn search(&self, _query: &str, _num: u32) -> Result<Vec<String>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted search ran out of results"))
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl SearchProvider for FailingSearch {
        async fn search(&self, _query: &str, _num: u32) -> Result<Vec<String>> {
            anyhow::bail!("search quota exceeded")
        }
    }

    struct StaticFetcher(&'static str);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl PageFetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            anyhow::bail!("connection refused: {}", url)
        }
    }

    fn test_config() -> Config {
        let base = std::env::temp_dir().join(format!("article-writer-test-{}", uuid::Uuid::new_v4()));
        Config {
            search_api_key: "unused".into(),
            search_engine_id: "unused".into(),
            gemini_api_key: "unused".into(),
            gemini_model: "gemini-1.5-flash".into(),
            max_search_results: 5,
            scrape_char_budget: 20_000,
            scrape_timeout_secs: 10,
            output_dir: base.join("out"),
            log_dir: base.join("logs"),
        }
    }

    /// Echoes the article back with a `<nav>` table of contents prepended, as
    /// a well-behaved reformulation model would.
    fn echo_reformulator() -> Reformulator {
        Reformulator::new(Arc::new(FnGenerator(Box::new(|prompt: &str| {
            let article = prompt
                .split("Here's the article:\n\n")
                .nth(1)
                .expect("reformulation prompt carries the article");
            Ok(format!(
                "<nav><a href=\"#market-overview\">Market Overview</a></nav>\n{}",
                article
            ))
        }))))
    }

    #[tokio::test]
    async fn two_section_run_writes_the_expected_article() {
        let config = test_config();
        let pipeline = Pipeline::with_components(
            OutlineGenerator::new(Arc::new(ScriptedGenerator::new([OUTLINE_JSON]))),
            SectionDrafter::new(Arc::new(ScriptedGenerator::new([
                "<p>Section text.</p>",
                "<p>Section text.</p>",
            ]))),
            echo_reformulator(),
            ScriptedSearch::new([
                vec!["https://a.example".to_string()],
                vec!["https://b.example".to_string()],
            ]),
            PageScraper::new(
                Box::new(StaticFetcher("<body><p>Sample content.</p></body>")),
                20_000,
            ),
            config.clone(),
            RunLogger::new(&config.log_dir).unwrap(),
        );

        let report = pipeline
            .run("Electric Vehicle Adoption in Europe", false)
            .await
            .unwrap();

        assert_eq!(report.sections.len(), 2);
        assert!(report.reformulated);
        assert!(report.sections.iter().all(|s| s.drafted));
        assert!(report.sections.iter().all(|s| s.empty_pages == 0));

        let filename = PathBuf::from(&report.output_path)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(filename.starts_with("generated_article_"));
        assert!(filename.ends_with(".html"));
        // generated_article_YYYYMMDD_HHMMSS.html
        assert_eq!(filename.len(), "generated_article_00000000_000000.html".len());

        let html = std::fs::read_to_string(&report.output_path).unwrap();
        assert!(html.contains("<title>Electric Vehicle Adoption in Europe</title>"));
        assert!(html.contains("<h1>Electric Vehicle Adoption in Europe</h1>"));
        assert!(html.contains("<nav>"));
        assert_eq!(html.matches("<h2>").count(), 2);
        assert!(html.contains("<h2>Market Overview</h2>"));
        assert!(html.contains("<h2>Policy Drivers</h2>"));
        assert!(!html.contains("```"));

        let log = std::fs::read_to_string(config.log_dir.join("runs.jsonl")).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    #[tokio::test]
    async fn empty_search_results_draft_from_empty_evidence() {
        let config = test_config();
        let outline = r#"{"tableOfContents": [{"section": "S", "query": "q", "prompt": "Write about S:"}]}"#;
        let pipeline = Pipeline::with_components(
            OutlineGenerator::new(Arc::new(ScriptedGenerator::new([outline]))),
            SectionDrafter::new(Arc::new(FnGenerator(Box::new(|prompt: &str| {
                // No evidence blocks at all after the instructions.
                assert!(!prompt.contains("Source:"));
                Ok("<p>Drafted without evidence.</p>".to_string())
            })))),
            echo_reformulator(),
            ScriptedSearch::new([vec![]]),
            PageScraper::new(Box::new(FailingFetcher), 20_000),
            config.clone(),
            RunLogger::new(&config.log_dir).unwrap(),
        );

        let report = pipeline.run("Topic", false).await.unwrap();
        assert_eq!(report.sections[0].num_results, 0);
        assert_eq!(report.sections[0].evidence_chars, 0);

        let html = std::fs::read_to_string(&report.output_path).unwrap();
        assert!(html.contains("<p>Drafted without evidence.</p>"));
    }

    #[tokio::test]
    async fn search_failure_aborts_the_run() {
        let config = test_config();
        let pipeline = Pipeline::with_components(
            OutlineGenerator::new(Arc::new(ScriptedGenerator::new([OUTLINE_JSON]))),
            SectionDrafter::new(Arc::new(FailingGenerator)),
            echo_reformulator(),
            Box::new(FailingSearch),
            PageScraper::new(Box::new(FailingFetcher), 20_000),
            config.clone(),
            RunLogger::new(&config.log_dir).unwrap(),
        );

        assert!(pipeline.run("Topic", false).await.is_err());
    }

    #[tokio::test]
    async fn scrape_draft_and_reformulation_failures_all_degrade() {
        let config = test_config();
        let pipeline = Pipeline::with_components(
            OutlineGenerator::new(Arc::new(ScriptedGenerator::new([OUTLINE_JSON]))),
            SectionDrafter::new(Arc::new(FailingGenerator)),
            Reformulator::new(Arc::new(FailingGenerator)),
            ScriptedSearch::new([
                vec!["https://a.example".to_string()],
                vec!["https://b.example".to_string()],
            ]),
            PageScraper::new(Box::new(FailingFetcher), 20_000),
            config.clone(),
            RunLogger::new(&config.log_dir).unwrap(),
        );

        let report = pipeline.run("Topic", false).await.unwrap();
        assert!(!report.reformulated);
        assert!(report.sections.iter().all(|s| !s.drafted));
        assert!(report.sections.iter().all(|s| s.empty_pages == 1));

        let html = std::fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(
            html.matches(drafter::DRAFT_PLACEHOLDER).count(),
            2,
            "each failed section carries the placeholder"
        );
    }

    #[tokio::test]
    async fn empty_outline_yields_title_only_article() {
        let config = test_config();
        let pipeline = Pipeline::with_components(
            OutlineGenerator::new(Arc::new(ScriptedGenerator::new(["{ not valid json }"]))),
            SectionDrafter::new(Arc::new(FailingGenerator)),
            echo_reformulator(),
            ScriptedSearch::new([]),
            PageScraper::new(Box::new(FailingFetcher), 20_000),
            config.clone(),
            RunLogger::new(&config.log_dir).unwrap(),
        );

        let report = pipeline.run("Topic", false).await.unwrap();
        assert!(report.sections.is_empty());

        let html = std::fs::read_to_string(&report.output_path).unwrap();
        assert!(html.contains("<h1>Topic</h1>"));
        assert_eq!(html.matches("<h2>").count(), 0);
    }
}
