use crate::article::sanitize_fragment;
use crate::llm::{LlmResponse, SharedGenerator};

const REFORMULATE_PROMPT: &str = "\
Please enhance the following article's clarity, coherence, and style while maintaining its structure and information.
Make sure that it is a well-structured article, with a clear introduction, body and conclusion.
Make sure that it addresses the topic and the questions it raises.
Ensure the output is in valid HTML, preserving all tags and structure.
After the main title, include a table of contents with links to each section.
At the end, add a references section with URLs cited in the text.
Ensure reference numbers match the new order, are clickable, and navigate to the correct URL in the references section.
Avoid duplicating URLs in the references.

Here's the article:

";

pub struct Reformulator {
    llm: SharedGenerator,
}

impl Reformulator {
    pub fn new(llm: SharedGenerator) -> Self {
        Self { llm }
    }

    /// Whole-document rewrite pass: table of contents, consistent citation
    /// numbering, deduplicated references. Best-effort; on any model failure
    /// the assembled article is returned exactly as given.
    pub async fn reformulate(&self, article_html: &str) -> (String, Option<LlmResponse>) {
        let full_prompt = format!("{}{}", REFORMULATE_PROMPT, article_html);

        match self.llm.generate(&full_prompt).await {
            Ok(response) => {
                let html = sanitize_fragment(&response.text);
                (html, Some(response))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reformulation failed, keeping the assembled article");
                (article_html.to_string(), None)
            }
        }
    }
}
