//! Cache key generation and management

use crate::models::{Coin, TxType};
use std::fmt;

/// Category of information cached for an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Labels,
    Overview,
    RiskScore,
    Actions,
    Profile,
    /// One page of transaction history; results differ per type and page
    TxInvestigation { tx_type: TxType, page: u32 },
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Labels => f.write_str("labels"),
            Self::Overview => f.write_str("overview"),
            Self::RiskScore => f.write_str("risk_score"),
            Self::Actions => f.write_str("actions"),
            Self::Profile => f.write_str("profile"),
            Self::TxInvestigation { tx_type, page } => {
                write!(f, "tx_investigation:{}:{}", tx_type, page)
            }
        }
    }
}

/// A structured cache key that can be converted to a string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Key for address-scoped lookups
    Address {
        coin: Coin,
        address: String,
        kind: DataKind,
    },
    /// Key for transaction-scoped lookups
    Transaction { coin: Coin, txid: String },
}

impl CacheKey {
    /// Create a new address key
    pub fn address(coin: Coin, address: &str, kind: DataKind) -> Self {
        Self::Address {
            coin,
            address: address.to_string(),
            kind,
        }
    }

    /// Create a new transaction key
    pub fn transaction(coin: Coin, txid: &str) -> Self {
        Self::Transaction {
            coin,
            txid: txid.to_string(),
        }
    }

    pub fn coin(&self) -> Coin {
        match self {
            Self::Address { coin, .. } | Self::Transaction { coin, .. } => *coin,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address { coin, address, kind } => write!(f, "{}_{}:{}", coin, address, kind),
            Self::Transaction { coin, txid } => write!(f, "{}_tx_{}", coin, txid),
        }
    }
}
