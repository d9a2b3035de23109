use crate::types::*;
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use tracing::{info, warn};
use volume_core::{total_volume, ChainId};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        scanning_enabled: state.engine.is_some(),
    })
}

/// Volume of one wallet on one chain
pub async fn get_volume(
    State(state): State<AppState>,
    Path((chain, address)): Path<(String, String)>,
    Query(query): Query<VolumeQuery>,
) -> Result<Json<VolumeResponse>, ApiError> {
    let address = require_address(&address)?;
    let engine = state.engine()?;
    let chain = ChainId::resolve(&chain)?;

    info!("📊 Volume request for {} on chain {}", address, chain);
    let result = engine.scan_pair(&chain, address).await;
    if let Some(error) = &result.error {
        warn!("⚠️ Scan of {} on chain {} failed: {}", address, chain, error);
    }

    Ok(Json(VolumeResponse::from_scan(
        result,
        state.include_trace(query.trace),
    )))
}

/// Volumes of one wallet across many chains
pub async fn get_wallet_volume(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<WalletVolumeQuery>,
) -> Result<Json<WalletVolumeResponse>, ApiError> {
    let address = require_address(&address)?;
    let engine = state.engine()?;

    let names: Vec<String> = match query.chains.as_deref() {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        None => state.config.scan.default_chains.clone(),
    };
    if names.is_empty() {
        return Err(ApiError::BadRequest("No chains requested".to_string()));
    }
    let chains = names
        .iter()
        .map(|name| ChainId::resolve(name))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "📊 Wallet volume request for {} on {} chains",
        address,
        chains.len()
    );
    let results = engine.scan_wallet(address, &chains).await;
    let include_trace = state.include_trace(query.trace);

    Ok(Json(WalletVolumeResponse {
        address: address.to_string(),
        total_volume: total_volume(&results),
        chains: results
            .into_iter()
            .map(|(chain, result)| (chain, VolumeResponse::from_scan(result, include_trace)))
            .collect(),
    }))
}

fn require_address(address: &str) -> Result<&str, ApiError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ApiError::BadRequest("Missing chain or address".to_string()));
    }
    Ok(address)
}
