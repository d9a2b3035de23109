use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use volume_core::{ChainId, ScanResult};

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// False while the GoldRush API key is missing
    pub scanning_enabled: bool,
}

/// Query for the single-pair endpoint
#[derive(Debug, Default, Deserialize)]
pub struct VolumeQuery {
    /// Include per-page trace lines
    pub trace: Option<bool>,
}

/// Query for the multi-chain wallet endpoint
#[derive(Debug, Default, Deserialize)]
pub struct WalletVolumeQuery {
    /// Comma-separated chain names or numeric ids; configured defaults when absent
    pub chains: Option<String>,
    pub trace: Option<bool>,
}

/// Volume of one (chain, address) pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    pub tx_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VolumeResponse {
    pub fn from_scan(result: ScanResult, include_trace: bool) -> Self {
        Self {
            volume: result.volume,
            tx_count: result.tx_count,
            trace: include_trace.then_some(result.trace),
            error: result.error,
        }
    }
}

/// Per-chain volumes of one wallet
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletVolumeResponse {
    pub address: String,
    pub chains: BTreeMap<ChainId, VolumeResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_volume: Decimal,
}
