//! HTTP-backed [`FeatureSource`].

use async_trait::async_trait;
use envmap_feature_models::RemotePoint;
use envmap_http::RetryPolicy;

use crate::{FeatureSource, WfsError, WfsSource, gml::parse_feature_collection};

/// Fetches points with a single `GetFeature` request.
#[derive(Debug, Clone)]
pub struct HttpFeatureSource {
    client: reqwest::Client,
    source: WfsSource,
    retry: RetryPolicy,
}

impl HttpFeatureSource {
    /// Creates a source that issues requests through `client`.
    #[must_use]
    pub const fn new(client: reqwest::Client, source: WfsSource, retry: RetryPolicy) -> Self {
        Self {
            client,
            source,
            retry,
        }
    }
}

#[async_trait]
impl FeatureSource for HttpFeatureSource {
    fn id(&self) -> &str {
        &self.source.id
    }

    async fn fetch_points(&self) -> Result<Vec<RemotePoint>, WfsError> {
        let url = self.source.get_feature_url()?;
        log::info!("{}: GET {url}", self.source.id);

        let body = envmap_http::send_text(|| self.client.get(url.clone()), &self.retry).await?;
        log::debug!("{}: received {} bytes", self.source.id, body.len());

        parse_feature_collection(&body, &self.source)
    }
}
