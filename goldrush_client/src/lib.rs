pub mod client;
pub mod error;
pub mod parser;
pub mod types;

pub use client::GoldRushClient;
pub use error::GoldRushError;
pub use types::*;

use config_manager::{ScanConfig, SystemConfig};
use volume_core::{ScanSettings, VolumeEngine};

/// Scan limits from the `[scan]` configuration section
pub fn scan_settings(scan: &ScanConfig) -> ScanSettings {
    ScanSettings {
        deadline: scan.deadline(),
        max_pages: scan.max_pages,
        page_size: scan.page_size,
    }
}

/// Volume engine backed by the GoldRush API.
///
/// Fails with the missing API key configuration error before any scan can start.
pub fn volume_engine(config: &SystemConfig) -> Result<VolumeEngine<GoldRushClient>, GoldRushError> {
    let client = GoldRushClient::new(config.goldrush.clone())?;
    Ok(VolumeEngine::new(client, scan_settings(&config.scan)))
}
