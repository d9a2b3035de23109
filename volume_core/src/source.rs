use crate::{
    error::FetchError,
    types::{ChainId, Endpoint, Page},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Parameters of one page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub chain: ChainId,
    pub address: String,
    pub endpoint: Endpoint,
    /// Zero-based
    pub page_number: u32,
    pub page_size: u32,
}

/// Anything that can serve pages of the indexing API.
///
/// Implementations issue exactly one bounded request per call and never retry.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<Page, FetchError>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn fetch(&self, request: &PageRequest) -> Result<Page, FetchError> {
        (**self).fetch(request).await
    }
}
