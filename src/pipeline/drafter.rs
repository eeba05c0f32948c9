use crate::article::sanitize_fragment;
use crate::llm::{LlmResponse, SharedGenerator};

/// Substituted for a section whose model call failed; keeps the pipeline
/// alive with a visible marker in the article body.
pub const DRAFT_PLACEHOLDER: &str = "<p>Error generating content for this section.</p>";

const FORMAT_INSTRUCTIONS: &str = "\
Format everything as HTML code.
Create sub-sections if required.
Add a reference section at the end of the paragraph with the source URLs.
Format the reference section as a list of URLs, each with a number - the same number is referenced in the text where the URL is used.
Use only content from the provided sources.";

pub struct SectionDrafter {
    llm: SharedGenerator,
}

impl SectionDrafter {
    pub fn new(llm: SharedGenerator) -> Self {
        Self { llm }
    }

    /// Drafts one section from its writing prompt and the scraped evidence
    /// (one `Source: <url>` block per page). Model failures are absorbed into
    /// a placeholder fragment; the response is `None` in that case.
    pub async fn draft(&self, prompt: &str, evidence: &str) -> (String, Option<LlmResponse>) {
        let full_prompt = format!("{}.\n{}\n\n{}", prompt, FORMAT_INSTRUCTIONS, evidence);

        match self.llm.generate(&full_prompt).await {
            Ok(response) => {
                let html = sanitize_fragment(&response.text);
                (html, Some(response))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Section draft failed, inserting placeholder");
                (DRAFT_PLACEHOLDER.to_string(), None)
            }
        }
    }
}

/// Concatenated evidence for one section: every scraped page prefixed with
/// its source URL, in search-result order. Pages that scraped to nothing
/// still contribute their URL line.
pub fn evidence_block(pages: &[(String, String)]) -> String {
    let mut evidence = String::new();
    for (url, text) in pages {
        evidence.push_str(&format!("\n\nSource: {}\n{}", url, text));
    }
    evidence
}
