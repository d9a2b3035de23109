//! Scripted page source for exercising the scanning pipeline without HTTP.

use crate::{
    error::FetchError,
    source::{PageRequest, PageSource},
    types::{ChainId, Endpoint, Item, Page},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

enum Script {
    Pages(Vec<Result<Page, FetchError>>),
    Repeat(Page),
}

/// Serves scripted responses per (chain, endpoint).
///
/// Unscripted combinations answer `NotImplemented`; page numbers past the end
/// of a script answer an empty page.
pub(crate) struct ScriptedSource {
    scripts: HashMap<(ChainId, Endpoint), Script>,
    latency: Duration,
    calls: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Append the response for the next page number of this endpoint
    pub(crate) fn respond(
        mut self,
        chain: &ChainId,
        endpoint: Endpoint,
        response: Result<Page, FetchError>,
    ) -> Self {
        let script = self
            .scripts
            .entry((chain.clone(), endpoint))
            .or_insert_with(|| Script::Pages(Vec::new()));
        if let Script::Pages(pages) = script {
            pages.push(response);
        }
        self
    }

    /// Answer every page number with the same page
    pub(crate) fn repeat(mut self, chain: &ChainId, endpoint: Endpoint, page: Page) -> Self {
        self.scripts
            .insert((chain.clone(), endpoint), Script::Repeat(page));
        self
    }

    /// Sleep this long inside every fetch
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn calls(&self) -> Vec<PageRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, endpoint: Endpoint) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint == endpoint)
            .map(|call| call.page_number)
            .collect()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch(&self, request: &PageRequest) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = match self
            .scripts
            .get(&(request.chain.clone(), request.endpoint))
        {
            None => Err(FetchError::NotImplemented),
            Some(Script::Repeat(page)) => Ok(page.clone()),
            Some(Script::Pages(pages)) => pages
                .get(request.page_number as usize)
                .cloned()
                .unwrap_or_else(|| Ok(Page::default())),
        };

        response.map(|page| Page {
            number: request.page_number,
            ..page
        })
    }
}

pub(crate) fn page(items: Vec<Item>, has_more: bool) -> Result<Page, FetchError> {
    Ok(Page {
        number: 0,
        items,
        has_more,
    })
}
