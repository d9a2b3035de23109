use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    #[error("Unknown chain: {chain}")]
    UnknownChain { chain: String },
}

pub type Result<T> = std::result::Result<T, VolumeError>;

/// Outcome of a single page fetch that did not produce a page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// HTTP 400: malformed address, or an address of another chain family
    #[error("bad request (HTTP 400)")]
    BadRequest,
    /// HTTP 410: endpoint retired for this chain
    #[error("endpoint gone (HTTP 410)")]
    Gone,
    /// HTTP 501: endpoint not available for this chain
    #[error("endpoint not implemented (HTTP 501)")]
    NotImplemented,
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    /// Body could not be understood; fatal to the request
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Map a non-2xx HTTP status to its fetch error
    pub fn from_status(status: u16, detail: &str) -> Self {
        match status {
            400 => FetchError::BadRequest,
            410 => FetchError::Gone,
            501 => FetchError::NotImplemented,
            _ if detail.is_empty() => FetchError::Transport(format!("HTTP {}", status)),
            _ => FetchError::Transport(format!("HTTP {}: {}", status, detail)),
        }
    }

    /// The endpoint/chain/address combination has nothing to offer; skip, never retry
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            FetchError::BadRequest | FetchError::Gone | FetchError::NotImplemented
        )
    }

    /// Network-level failure; partial totals stay valid
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::Transport(_))
    }
}
