//! Administrative CLI (spec §6 ambient tooling): a thin HTTP client against
//! a running server, replacing the teacher's gRPC `client.rs` demo with
//! requests against `/search` and the admin crawl endpoints. `clap` derive
//! style follows `foiacquire`'s `cli/commands.rs`.

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "crawly-admin")]
#[command(about = "Administrative client for the search engine core")]
#[command(version)]
struct Cli {
    /// Base URL of a running server.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search query against `/search`.
    Search {
        query: String,
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(long)]
        domain_filter: Option<String>,
    },
    /// Start a crawl session against `POST /crawl`.
    Crawl {
        url: String,
        #[arg(long)]
        max_pages: Option<usize>,
        #[arg(long)]
        max_depth: Option<u32>,
        #[arg(long)]
        template: Option<String>,
    },
    /// Check a crawl session's status against `GET /crawl/:id`.
    Status { session_id: String },
    /// Stop a running crawl session against `POST /crawl/:id/stop`.
    Stop { session_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let response = match cli.command {
        Commands::Search { query, page, limit, domain_filter } => {
            let mut request = client
                .get(format!("{}/search", cli.base_url))
                .query(&[("q", query.as_str()), ("page", &page.to_string()), ("limit", &limit.to_string())]);
            if let Some(domain_filter) = domain_filter.as_deref() {
                request = request.query(&[("domain_filter", domain_filter)]);
            }
            request.send().await?
        }
        Commands::Crawl { url, max_pages, max_depth, template } => {
            let body = serde_json::json!({
                "url": url,
                "maxPages": max_pages,
                "maxDepth": max_depth,
                "template": template,
            });
            client.post(format!("{}/crawl", cli.base_url)).json(&body).send().await?
        }
        Commands::Status { session_id } => client.get(format!("{}/crawl/{session_id}", cli.base_url)).send().await?,
        Commands::Stop { session_id } => client.post(format!("{}/crawl/{session_id}/stop", cli.base_url)).send().await?,
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    println!("{status}\n{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
