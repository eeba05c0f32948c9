use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::llm::{LlmResponse, SharedGenerator};

/// One outline entry: a section heading, the search query that gathers its
/// evidence, and the writing prompt used to draft it.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionSpec {
    #[serde(rename = "section")]
    pub title: String,
    pub query: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Outline {
    #[serde(rename = "tableOfContents")]
    pub sections: Vec<SectionSpec>,
}

#[derive(Debug, Error)]
pub enum OutlineError {
    /// The model response contained no `{...}` span at all. Fatal: without an
    /// outline there is no work to do.
    #[error("no JSON object found in model response")]
    NoJson,
    /// A JSON-looking span was found but did not decode into an outline.
    #[error("outline JSON failed to decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Two-stage extraction: locate the outermost brace span, then decode it.
/// The two failure modes stay distinct so the caller can apply its leniency
/// policy to exactly one of them.
pub fn parse_outline(text: &str) -> Result<Outline, OutlineError> {
    let start = text.find('{').ok_or(OutlineError::NoJson)?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or(OutlineError::NoJson)?;

    Ok(serde_json::from_str(&text[start..=end])?)
}

fn outline_prompt(topic: &str) -> String {
    format!(
        r#"How should I structure an overview article titled '{topic}'.
This should look like an article from McKinsey, BCG or the Financial Times.
Outline a Table of Content.
For each main section, return a query to ask a search engine like Google to get the most relevant content, and then the prompt to use in order to craft the paragraph based on scrapped content from the web pages' content.
The search queries should help gather the best content for the section, within the frame of the title.
For the prompt, use the same language as the title '{topic}'.
Return this as a JSON file, following this example:

{{
  "tableOfContents": [
    {{
      "section": "Introduction: The Evolving Landscape of Banking Fraud",
      "query": "Banking fraud trends 2024, 2025",
      "prompt": "Write two paragraphs about 'Introduction: The Evolving Landscape of Banking Fraud' based on the following aggregation of articles:"
    }},
    {{
      "section": "AI's Role in Antifraud: From Detection to Prevention",
      "query": "AI applications in banking fraud prevention",
      "prompt": "Write two paragraphs about 'AI's Role in Antifraud: From Detection to Prevention' based on the following aggregation of articles:"
    }},
    etc.
  ]
}}
"#
    )
}

pub struct OutlineGenerator {
    llm: SharedGenerator,
}

impl OutlineGenerator {
    pub fn new(llm: SharedGenerator) -> Self {
        Self { llm }
    }

    /// A response with no JSON at all aborts the run. A JSON block that fails
    /// to decode degrades to an empty outline: the run proceeds and produces
    /// an article with a title and no body.
    pub async fn generate(&self, topic: &str) -> Result<(Outline, LlmResponse)> {
        let response = self
            .llm
            .generate(&outline_prompt(topic))
            .await
            .context("Outline request to the model failed")?;

        let outline = match parse_outline(&response.text) {
            Ok(outline) => outline,
            Err(err @ OutlineError::NoJson) => return Err(err.into()),
            Err(OutlineError::Decode(e)) => {
                tracing::warn!(error = %e, "Outline JSON failed to decode, continuing with an empty outline");
                Outline::default()
            }
        };

        Ok((outline, response))
    }
}
