use crate::parser::{deserialize_nullable_vec, deserialize_quote};
use rust_decimal::Decimal;
use serde::Deserialize;

/// GoldRush API response wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct GoldRushResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: bool,
    pub error_message: Option<String>,
    pub error_code: Option<u32>,
}

/// `data` object shared by the transfers and transactions endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PageData {
    pub address: Option<String>,
    pub chain_id: Option<u64>,
    pub chain_name: Option<String>,
    pub quote_currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable_vec")]
    pub items: Vec<WalletItem>,
    pub pagination: Option<PaginationInfo>,
}

impl PageData {
    /// Missing pagination means this is the last page
    pub fn has_more(&self) -> bool {
        self.pagination
            .as_ref()
            .and_then(|p| p.has_more)
            .unwrap_or(false)
    }
}

/// Pagination info for API responses
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationInfo {
    pub has_more: Option<bool>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub total_count: Option<u64>,
}

/// One item from `transfers_v2`, `transactions_v2` or `transactions_v3`.
///
/// Only the quote-bearing fields are modelled; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletItem {
    pub tx_hash: Option<String>,
    #[serde(default, deserialize_with = "deserialize_quote")]
    pub value_quote: Option<Decimal>,
    /// An object with a `quote` on Solana, a raw native amount string on EVM chains
    #[serde(default)]
    pub fees_paid: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_nullable_vec")]
    pub transfers: Vec<TokenTransfer>,
}

/// Individual token transfer within a transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenTransfer {
    pub contract_ticker_symbol: Option<String>,
    pub transfer_type: Option<String>, // "IN" or "OUT"
    #[serde(default, deserialize_with = "deserialize_quote")]
    pub quote: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_quote")]
    pub delta_quote: Option<Decimal>,
}
