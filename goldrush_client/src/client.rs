use crate::{
    error::GoldRushError,
    parser::normalize_page,
    types::{GoldRushResponse, PageData},
};
use async_trait::async_trait;
use config_manager::GoldRushConfig;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;
use volume_core::{FetchError, Page, PageRequest, PageSource};

/// Characters of an error body kept in the fetch error
const ERROR_BODY_LIMIT: usize = 200;

/// GoldRush API client serving wallet history pages
#[derive(Debug, Clone)]
pub struct GoldRushClient {
    client: Client,
    config: GoldRushConfig,
    base_url: Url,
}

impl GoldRushClient {
    /// Create a client; fails when the API key is missing or the base URL is unusable
    pub fn new(config: GoldRushConfig) -> Result<Self, GoldRushError> {
        config.require_api_key()?;

        let base_url = Url::parse(config.base_url.trim()).map_err(|_| GoldRushError::InvalidBaseUrl {
            url: config.base_url.clone(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GoldRushError::InvalidBaseUrl {
                url: config.base_url.clone(),
            });
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// `{base}/{chain}/address/{address}/{endpoint}/?page-number=..&page-size=..&quote-currency=..`
    pub fn page_url(&self, request: &PageRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                request.chain.as_str(),
                "address",
                request.address.as_str(),
                request.endpoint.path_segment(),
                "",
            ]);
        }
        url.query_pairs_mut()
            .append_pair("page-number", &request.page_number.to_string())
            .append_pair("page-size", &request.page_size.to_string())
            .append_pair("quote-currency", &self.config.quote_currency);
        url
    }

    /// Fetch and normalize one page; exactly one HTTP request, no retry
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<Page, FetchError> {
        let url = self.page_url(request);
        debug!("📡 GoldRush request: {}", url);

        let start_time = Instant::now();
        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.api_key.trim())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(
            "📨 {} page {} on chain {}: {} ({} bytes) in {:.2}s",
            request.endpoint,
            request.page_number,
            request.chain,
            status,
            body.len(),
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let detail: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
            let err = FetchError::from_status(status.as_u16(), &detail);
            if err.is_unsupported() {
                info!(
                    "⚠️ {} not available for {} on chain {} ({})",
                    request.endpoint, request.address, request.chain, status
                );
            } else {
                warn!(
                    "❌ GoldRush API error - Status: {}, Body: {}",
                    status, detail
                );
            }
            return Err(err);
        }

        let api_response: GoldRushResponse<PageData> =
            serde_json::from_str(&body).map_err(|e| {
                error!(
                    "❌ Failed to parse GoldRush {} response: {}",
                    request.endpoint, e
                );
                FetchError::Decode(e.to_string())
            })?;

        if api_response.error {
            let message = api_response
                .error_message
                .unwrap_or_else(|| "Unknown API error".to_string());
            error!("❌ API returned error flag: {}", message);
            return Err(match api_response.error_code.map(u16::try_from) {
                Some(Ok(code)) => FetchError::from_status(code, &message),
                _ => FetchError::Decode(message),
            });
        }

        let data = api_response
            .data
            .ok_or_else(|| FetchError::Decode("response has no data".to_string()))?;
        let page = normalize_page(&data, request.page_number);

        debug!(
            "✅ {} page {}: {} items, has_more={}",
            request.endpoint,
            page.number,
            page.items.len(),
            page.has_more
        );
        Ok(page)
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[async_trait]
impl PageSource for GoldRushClient {
    async fn fetch(&self, request: &PageRequest) -> Result<Page, FetchError> {
        self.fetch_page(request).await
    }
}
