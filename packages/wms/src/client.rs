//! HTTP-backed [`FeatureInfoClient`].

use async_trait::async_trait;
use envmap_http::RetryPolicy;

use crate::{FeatureInfo, FeatureInfoClient, FeatureInfoRequest, WmsError, parse_feature_info};

/// Sends `GetFeatureInfo` requests with a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFeatureInfoClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpFeatureInfoClient {
    /// Creates a client. Clicks are interactive, so callers usually pass
    /// [`RetryPolicy::interactive`].
    #[must_use]
    pub const fn new(client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl FeatureInfoClient for HttpFeatureInfoClient {
    async fn feature_info(
        &self,
        request: &FeatureInfoRequest,
    ) -> Result<Option<FeatureInfo>, WmsError> {
        let url = request.to_url()?;
        log::debug!("{}: GET {url}", request.layer_id);

        let body = envmap_http::send_text(|| self.client.get(url.clone()), &self.retry).await?;
        let info = parse_feature_info(&body)?;

        if info.is_none() {
            log::debug!("{}: no feature at ({}, {})", request.layer_id, request.i, request.j);
        }

        Ok(info)
    }
}
