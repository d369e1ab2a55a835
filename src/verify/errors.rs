//! Error types for the verifier (C6).

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("failed to navigate {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not decode screenshot as an image: {0}")]
    ImageDecode(#[source] image::ImageError),

    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("PageSpeed API returned an unexpected response shape: {0}")]
    PageSpeedShape(String),
}
