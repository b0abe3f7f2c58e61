use crate::models::{Coin, RiskTarget, TxType};
use bs58;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unsupported coin: {0}. Must be one of BTC, ETH, TRX, BSC, AVAX, MATIC, FTM, HECO, OPT, ARB")]
    InvalidCoin(String),

    #[error("Invalid {coin} address format: {address}")]
    InvalidAddress { coin: Coin, address: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingParameter(name.to_string())),
    }
}

pub fn validate_coin(coin: Option<&str>) -> Result<Coin, ValidationError> {
    let coin = required("coin", coin)?;
    coin.parse()
        .map_err(|_| ValidationError::InvalidCoin(coin.to_string()))
}

/// Shape check for a chain address; does not prove the address exists
pub fn validate_address(coin: Coin, address: Option<&str>) -> Result<String, ValidationError> {
    let address = required("address", address)?;
    let valid = match coin {
        Coin::Btc => is_base58_address(address) || is_bech32_btc(address),
        Coin::Trx => address.starts_with('T') && is_base58_address(address),
        _ => is_evm_address(address),
    };

    if !valid {
        return Err(ValidationError::InvalidAddress {
            coin,
            address: address.to_string(),
        });
    }
    Ok(address.to_string())
}

fn is_evm_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Version byte + 20-byte hash + 4-byte checksum
fn is_base58_address(address: &str) -> bool {
    match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes.len() == 25,
        Err(_) => false,
    }
}

fn is_bech32_btc(address: &str) -> bool {
    let lower = address.to_ascii_lowercase();
    (lower == address || address.to_ascii_uppercase() == address)
        && lower.starts_with("bc1")
        && (14..=74).contains(&lower.len())
        && lower[3..].chars().all(|c| c.is_ascii_alphanumeric())
}

/// Exactly one of `address` or `txid` must be given
pub fn validate_risk_target(
    coin: Coin,
    address: Option<&str>,
    txid: Option<&str>,
) -> Result<RiskTarget, ValidationError> {
    let address = address.filter(|a| !a.trim().is_empty());
    let txid = txid.filter(|t| !t.trim().is_empty());

    match (address, txid) {
        (Some(address), None) => Ok(RiskTarget::Address(validate_address(coin, Some(address))?)),
        (None, Some(txid)) => Ok(RiskTarget::Transaction(txid.trim().to_string())),
        (Some(_), Some(_)) => Err(ValidationError::InvalidParameter(
            "Provide either address or txid, not both".to_string(),
        )),
        (None, None) => Err(ValidationError::MissingParameter("address or txid".to_string())),
    }
}

pub fn validate_tx_type(tx_type: Option<&str>) -> Result<TxType, ValidationError> {
    match tx_type.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(TxType::All),
        Some(t) => t.parse().map_err(|_| {
            ValidationError::InvalidParameter(format!("tx_type must be all, in or out, got {}", t))
        }),
    }
}

pub fn validate_page(page: Option<&str>) -> Result<u32, ValidationError> {
    match page.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(p) => match p.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(ValidationError::InvalidParameter(format!(
                "page must be a positive integer, got {}",
                p
            ))),
        },
    }
}

pub fn validate_timestamp(name: &str, value: Option<&str>) -> Result<Option<i64>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => match v.parse::<i64>() {
            Ok(ts) if ts >= 0 => Ok(Some(ts)),
            _ => Err(ValidationError::InvalidParameter(format!(
                "{} must be a non-negative unix timestamp, got {}",
                name, v
            ))),
        },
    }
}
