use std::path::PathBuf;

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::{Amount, Chain};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Account database errors. Every variant is fatal to the run.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read account database {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write account database {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed account database: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode account database: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("record {index} has an empty {field}")]
    MissingIdentity { index: usize, field: &'static str },

    #[error("duplicate account address {address}")]
    DuplicateAddress { address: String },
}

/// Exchange API errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("withdrawal address is not allow-listed: {0}")]
    NotAllowlisted(String),

    #[error("insufficient exchange balance: {0}")]
    InsufficientBalance(String),

    #[error("exchange rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("exchange credentials missing or invalid: {0}")]
    Auth(String),

    #[error("exchange request failed: {0}")]
    Transport(String),

    #[error("unexpected exchange response: {0}")]
    Decode(String),
}

impl ExchangeError {
    /// Rejections that retrying cannot fix.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NotAllowlisted(_) | Self::InsufficientBalance(_) | Self::Auth(_)
        )
    }
}

/// On-chain client and transfer provider errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("no RPC endpoint configured for {0}")]
    MissingRpc(Chain),

    #[error("{provider} does not support {chain}")]
    UnsupportedChain { provider: &'static str, chain: Chain },

    #[error("{provider} does not support {operation}")]
    UnsupportedOperation {
        provider: &'static str,
        operation: &'static str,
    },

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("swap quote failed: {0}")]
    Quote(String),

    #[error("contract call failed: {0}")]
    Contract(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Whether this error must stop the whole run.
    ///
    /// Only configuration and account database failures are fatal; everything
    /// else is scoped to a single account or action.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}
