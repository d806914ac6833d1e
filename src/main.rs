use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use pagepeek::{ScrapeBuilder, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};

/// Print a link preview (title, description, images, canonical link, icon)
/// for a web page as JSON.
#[derive(Debug, Parser)]
#[command(name = "pagepeek", version)]
struct Cli {
    /// Page to preview
    url: String,

    /// Canonical-link / escaped-fragment redirects to follow
    #[arg(long, env = "PAGEPEEK_MAX_REDIRECTS", default_value_t = DEFAULT_MAX_REDIRECTS)]
    max_redirects: u32,

    #[arg(long, env = "PAGEPEEK_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "PAGEPEEK_TIMEOUT_MS", default_value_t = 15_000)]
    timeout_ms: u64,

    /// Refuse pages larger than this (0 = no limit)
    #[arg(long, env = "PAGEPEEK_MAX_BODY_BYTES", default_value_t = 0)]
    max_body_bytes: u64,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let scraper = ScrapeBuilder::new(cli.url.as_str())
        .with_user_agent(cli.user_agent)
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_max_body_bytes(cli.max_body_bytes)
        .with_max_redirects(cli.max_redirects)
        .build()?;

    let document = scraper
        .scrape()
        .with_context(|| format!("Failed to preview {}", cli.url))?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&document.preview)?
    } else {
        serde_json::to_string(&document.preview)?
    };
    println!("{}", json);
    Ok(())
}
