use crate::error::VolumeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Numeric chain id the indexing API uses for Solana mainnet
pub const SOLANA_CHAIN_ID: &str = "1399811149";

/// Chain names accepted in place of numeric ids
const CHAIN_ALIASES: &[(&str, &str)] = &[
    ("ethereum", "1"),
    ("base", "8453"),
    ("arbitrum", "42161"),
    ("optimism", "10"),
    ("bsc", "56"),
    ("polygon", "137"),
    ("avalanche", "43114"),
    ("solana", SOLANA_CHAIN_ID),
    ("zora", "7777777"),
    ("scroll", "534352"),
    ("blast", "81457"),
    ("fantom", "250"),
];

/// Opaque blockchain network identifier (numeric string on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve a chain name alias or pass a numeric id through unchanged
    pub fn resolve(input: &str) -> Result<Self, VolumeError> {
        let trimmed = input.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self::new(trimmed));
        }

        let lowered = trimmed.to_lowercase();
        CHAIN_ALIASES
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, id)| Self::new(*id))
            .ok_or_else(|| VolumeError::UnknownChain {
                chain: input.to_string(),
            })
    }

    pub fn solana() -> Self {
        Self::new(SOLANA_CHAIN_ID)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn class(&self) -> ChainClass {
        if self.0 == SOLANA_CHAIN_ID {
            ChainClass::Solana
        } else {
            ChainClass::Evm
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Item shapes and available endpoints differ categorically between the two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainClass {
    Solana,
    Evm,
}

/// Which upstream data shape is being queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Per-transaction lists of token/native sub-transfers
    Transfers,
    /// One aggregate USD value per transaction
    Transactions,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Transfers => "transfers",
            EndpointKind::Transactions => "transactions",
        }
    }

    /// Ordered endpoint variants to attempt for this kind on a chain class.
    ///
    /// A later variant is only tried when an earlier one is rejected as
    /// unsupported before yielding any page. An empty plan means the kind is
    /// not available and scans to zero without a request.
    pub fn endpoint_plan(&self, class: ChainClass) -> &'static [Endpoint] {
        match (self, class) {
            (EndpointKind::Transfers, ChainClass::Evm) => &[Endpoint::TransfersV2],
            (EndpointKind::Transfers, ChainClass::Solana) => &[],
            (EndpointKind::Transactions, ChainClass::Evm) => {
                &[Endpoint::TransactionsV3, Endpoint::TransactionsV2]
            }
            // transactions_v3 answers 501 for Solana
            (EndpointKind::Transactions, ChainClass::Solana) => &[Endpoint::TransactionsV2],
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete indexing API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    #[serde(rename = "transfers_v2")]
    TransfersV2,
    #[serde(rename = "transactions_v2")]
    TransactionsV2,
    #[serde(rename = "transactions_v3")]
    TransactionsV3,
}

impl Endpoint {
    /// Path segment under `/{chain}/address/{address}/`
    pub fn path_segment(&self) -> &'static str {
        match self {
            Endpoint::TransfersV2 => "transfers_v2",
            Endpoint::TransactionsV2 => "transactions_v2",
            Endpoint::TransactionsV3 => "transactions_v3",
        }
    }

    pub fn kind(&self) -> EndpointKind {
        match self {
            Endpoint::TransfersV2 => EndpointKind::Transfers,
            Endpoint::TransactionsV2 | Endpoint::TransactionsV3 => EndpointKind::Transactions,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// One transaction/event record with its USD quotes.
///
/// Every quote is optional because the upstream API omits or nulls them
/// freely; which fields count depends on the endpoint kind and chain class
/// (see [`crate::accumulator::item_volume`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    /// USD quote of the native value moved
    pub value_quote: Option<Decimal>,
    /// USD quote of the fee paid (Solana only)
    pub fee_quote: Option<Decimal>,
    /// USD quotes of each sub-transfer (EVM transfers endpoint)
    pub transfer_quotes: Vec<Option<Decimal>>,
}

impl Item {
    pub fn with_value(value_quote: Decimal) -> Self {
        Self {
            value_quote: Some(value_quote),
            ..Default::default()
        }
    }

    pub fn with_transfers(quotes: impl IntoIterator<Item = Decimal>) -> Self {
        Self {
            transfer_quotes: quotes.into_iter().map(Some).collect(),
            ..Default::default()
        }
    }
}

/// One fetch result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Zero-based page index
    pub number: u32,
    pub items: Vec<Item>,
    /// Continuation flag from `data.pagination.has_more`
    pub has_more: bool,
}

/// Monotonic wall-clock budget shared across all scanning phases of one request
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start the clock now
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.budget
    }
}

/// Best-effort outcome for one (chain, address) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    pub tx_count: u64,
    /// Informational only, never used for control flow
    pub trace: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanResult {
    /// Zero result carrying a fatal error message
    pub fn failed(error: impl Into<String>, trace: Vec<String>) -> Self {
        Self {
            volume: Decimal::ZERO,
            tx_count: 0,
            trace,
            error: Some(error.into()),
        }
    }
}
