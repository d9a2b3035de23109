pub mod accumulator;
pub mod dispatcher;
pub mod error;
pub mod reconciler;
pub mod scanner;
pub mod source;
pub mod types;

#[cfg(test)]
mod testing;

pub use accumulator::{item_volume, page_volume, saturating_sum};
pub use dispatcher::total_volume;
pub use error::{FetchError, Result, VolumeError};
pub use reconciler::merge;
pub use scanner::{EndpointScan, StopReason};
pub use source::{PageRequest, PageSource};
pub use types::*;

use std::time::Duration;

/// Limits applied to every (chain, address) scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Wall-clock budget shared by both endpoint scans of one pair
    pub deadline: Duration,
    /// Maximum pages fetched per endpoint variant
    pub max_pages: u32,
    pub page_size: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            deadline: Duration::from_millis(8500),
            max_pages: 5,
            page_size: 100,
        }
    }
}

/// Multi-chain volume engine over a [`PageSource`].
///
/// The scanning operations live in [`scanner`], [`reconciler`] and [`dispatcher`].
pub struct VolumeEngine<S: PageSource> {
    source: S,
    settings: ScanSettings,
}

impl<S: PageSource> VolumeEngine<S> {
    pub fn new(source: S, settings: ScanSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
