//! Error types for the crawler (C2).

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("failed to seed crawl: {0}")]
    Seed(String),

    #[error("failed to navigate {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to acquire a browser for {url}: {source}")]
    DriverUnavailable {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("crawl work directory error: {0}")]
    WorkDir(#[source] std::io::Error),
}
