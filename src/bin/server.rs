//! Process entry point (spec §6): wires the crawler engine, content
//! storage, job queue, and HTTP surface together and serves `/search` plus
//! the admin crawl endpoints. Tracing setup follows `foiacquire`'s
//! `main.rs` (`EnvFilter` + `fmt` layer via `tracing_subscriber::registry`).

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crawly_search_core::config::CoreConfig;
use crawly_search_core::crawler::{CrawlMetrics, CrawlerManager, DomainManager, ReqwestFetcher, RobotsPolicy, ScraperContentParser};
use crawly_search_core::http::{self, AppState};
use crawly_search_core::models::CrawlConfig;
use crawly_search_core::queue::{self, JobQueue};
use crawly_search_core::storage::ContentStorage;
use crawly_search_core::storage::memory_store::InMemoryDocumentStore;
use crawly_search_core::storage::tantivy_index::TantivyFullTextIndex;
use crawly_search_core::templates::TemplateRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crawly_search_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::from_env();
    tracing::info!(bind = %config.http_bind_addr, "starting search engine core");

    let crawl_defaults = CrawlConfig::default();
    let domain_manager = Arc::new(DomainManager::new(crawl_defaults));
    let robots = Arc::new(RobotsPolicy::new(reqwest::Client::new()));
    let metrics = Arc::new(CrawlMetrics::new());
    let fetcher = Arc::new(ReqwestFetcher::new(reqwest::Client::new()));
    let parser = Arc::new(ScraperContentParser);

    let documents = Arc::new(InMemoryDocumentStore::new());
    let index = Arc::new(TantivyFullTextIndex::open_temporary(&config.index_name)?);
    let storage = Arc::new(ContentStorage::new(documents, index));

    let crawler_manager = Arc::new(CrawlerManager::new(domain_manager, robots, metrics, fetcher, parser, storage.clone()));

    let templates = Arc::new(TemplateRegistry::seeded(config.templates_path.as_deref())?);

    let job_queue = Arc::new(JobQueue::connect(&config.job_queue_redis_uri).await?);
    queue::install_default_handlers(&job_queue, crawler_manager.clone()).await;
    job_queue.start_workers(config.worker_count);

    let app_state = Arc::new(AppState::new(storage, crawler_manager, templates));
    let router = http::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.http_bind_addr).await?;
    tracing::info!(addr = %config.http_bind_addr, "listening");
    axum::serve(listener, router).await?;

    job_queue.stop_workers().await;
    Ok(())
}
