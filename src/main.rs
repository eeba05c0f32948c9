mod article;
mod config;
mod instrumentation;
mod llm;
mod pipeline;
mod retrieval;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};

use config::Config;
use pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "article-writer",
    about = "Drafts an overview article on a topic from web research"
)]
struct Cli {
    /// Topic of the article; prompted for on stdin when omitted
    topic: Option<String>,

    /// Enable verbose per-section output
    #[arg(short, long)]
    verbose: bool,
}

fn read_topic() -> Result<String> {
    eprint!("Enter the topic for the article: ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read topic from stdin")?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let topic = match cli.topic {
        Some(topic) => topic,
        None => read_topic()?,
    };
    if topic.is_empty() {
        anyhow::bail!("Topic must not be empty");
    }

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run(&topic, cli.verbose).await?;

    println!("Article generated and saved as '{}'", report.output_path);
    println!("{}", report.summary());

    Ok(())
}
