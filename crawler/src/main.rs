use anyhow::{anyhow, Result};
use clap::Parser;
use crawler::{FetchConfig, Fetcher};
use reqwest::Url;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Scrape one okruh of driving-test questions to JSON")]
struct Cli {
    /// Question group to scrape
    #[arg(long, default_value_t = 1)]
    okruh: u32,
    /// Output JSON file path [default: okruh<N>.json]
    #[arg(long)]
    output: Option<String>,
    /// Site root
    #[arg(long, default_value = "https://www.autoskola-testy.cz/")]
    base: String,
    /// Pause between question pages, in milliseconds
    #[arg(long, default_value_t = 300)]
    delay_ms: u64,
    /// Page request timeout seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
    /// Image probe timeout seconds
    #[arg(long, default_value_t = 10)]
    probe_timeout_secs: u64,
    /// User-Agent string
    #[arg(long, default_value = "Mozilla/5.0")]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Cli::parse();
    let output = args.output.clone().unwrap_or_else(|| format!("okruh{}.json", args.okruh));
    if let Some(dir) = std::path::Path::new(&output).parent() {
        fs::create_dir_all(dir).ok();
    }

    let base = Url::parse(&args.base).map_err(|e| anyhow!("invalid --base {}: {e}", args.base))?;
    let fetcher = Fetcher::new(FetchConfig {
        base,
        user_agent: args.user_agent.clone(),
        page_timeout: Duration::from_secs(args.timeout_secs),
        probe_timeout: Duration::from_secs(args.probe_timeout_secs),
    })?;

    let links = fetcher.question_links(args.okruh).await?;
    eprintln!("okruh {}: {} question links found", args.okruh, links.len());

    let mut records = Vec::with_capacity(links.len());
    for (i, link) in links.iter().enumerate() {
        match fetcher.scrape_question(link).await {
            Ok(Some(rec)) => records.push(rec),
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %link, error = %e, "question page failed"),
        }
        eprint!("\r  {}/{} done", i + 1, links.len());
        sleep(Duration::from_millis(args.delay_ms)).await;
    }
    eprintln!();

    let mut out = BufWriter::new(File::create(&output)?);
    serde_json::to_writer_pretty(&mut out, &records)?;
    out.write_all(b"\n")?;
    out.flush()?;

    eprintln!("done: saved {} questions -> {}", records.len(), output);
    Ok(())
}
