// Chain identifiers, query parameters and the normalized graph edge shared
// between the provider, the cache and the renderer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chains supported by the analytics provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Coin {
    Btc,
    Eth,
    Trx,
    Bsc,
    Avax,
    Matic,
    Ftm,
    Heco,
    Opt,
    Arb,
}

impl Coin {
    pub const ALL: [Coin; 10] = [
        Coin::Btc,
        Coin::Eth,
        Coin::Trx,
        Coin::Bsc,
        Coin::Avax,
        Coin::Matic,
        Coin::Ftm,
        Coin::Heco,
        Coin::Opt,
        Coin::Arb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Coin::Btc => "BTC",
            Coin::Eth => "ETH",
            Coin::Trx => "TRX",
            Coin::Bsc => "BSC",
            Coin::Avax => "AVAX",
            Coin::Matic => "MATIC",
            Coin::Ftm => "FTM",
            Coin::Heco => "HECO",
            Coin::Opt => "OPT",
            Coin::Arb => "ARB",
        }
    }

    /// Chains whose addresses are 20-byte hex accounts.
    pub fn is_evm(&self) -> bool {
        !matches!(self, Coin::Btc | Coin::Trx)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Coin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Coin::ALL
            .iter()
            .copied()
            .find(|coin| coin.as_str() == upper)
            .ok_or_else(|| s.to_string())
    }
}

/// Direction filter for transaction history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    #[default]
    All,
    In,
    Out,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::All => "all",
            TxType::In => "in",
            TxType::Out => "out",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TxType::All),
            "in" => Ok(TxType::In),
            "out" => Ok(TxType::Out),
            _ => Err(s.to_string()),
        }
    }
}

/// Subject of a risk score lookup: exactly one of an address or a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskTarget {
    Address(String),
    Transaction(String),
}

/// Parameters of a transaction history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxQuery {
    pub tx_type: TxType,
    pub page: u32,
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
}

impl TxQuery {
    pub fn page(tx_type: TxType, page: u32) -> Self {
        Self {
            tx_type,
            page,
            start_timestamp: None,
            end_timestamp: None,
        }
    }

    pub fn with_time_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start_timestamp = start;
        self.end_timestamp = end;
        self
    }

    /// Effective time bounds. A zero timestamp means no bound.
    pub fn time_range(&self) -> (Option<i64>, Option<i64>) {
        let bound = |ts: Option<i64>| ts.filter(|ts| *ts > 0);
        (bound(self.start_timestamp), bound(self.end_timestamp))
    }

    /// Time-bounded queries are never cached.
    pub fn is_time_filtered(&self) -> bool {
        let (start, end) = self.time_range();
        start.is_some() || end.is_some()
    }
}

impl Default for TxQuery {
    fn default() -> Self {
        Self::page(TxType::All, 1)
    }
}

/// Directed transfer used as graph renderer input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(alias = "ts", default)]
    pub timestamp: String,
}

impl Edge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        value: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            value: value.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Stand-in edge rendered when there is no transaction data.
    pub fn placeholder() -> Self {
        Self::new("No transactions", "data available", "0", "")
    }
}
