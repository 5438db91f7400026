//! Snapshot domain types.
//!
//! A [`Snapshot`] is the complete, timestamped state object distributed to
//! all viewers. It is either fully populated by the producer or absent
//! (the store serves an explicit `empty` envelope) — never partial.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Exchange a stock trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Kospi,
    Kosdaq,
}

impl Market {
    /// Display name as used on the wire ("KOSPI" / "KOSDAQ").
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KOSPI" => Ok(Market::Kospi),
            "KOSDAQ" => Ok(Market::Kosdaq),
            other => Err(CoreError::InvalidMarket(other.to_string())),
        }
    }
}

/// Validated 6-digit stock code (e.g. "005930").
///
/// Identity of a [`RankedItem`]. Gateway input is parsed through this type
/// before any delegation to the detail collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockCode(String);

impl StockCode {
    /// Parse and validate a stock code: exactly 6 ASCII digits.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(StockCode(s.to_string()))
        } else {
            Err(CoreError::InvalidStockCode(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StockCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StockCode::parse(s)
    }
}

impl TryFrom<String> for StockCode {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        StockCode::parse(&s)
    }
}

impl From<StockCode> for String {
    fn from(code: StockCode) -> String {
        code.0
    }
}

/// Index quote (e.g. KOSPI / KOSDAQ composite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    /// Index name, e.g. "KOSPI".
    pub name: String,
    /// Current index value.
    pub value: f64,
    /// Change versus the previous close.
    pub change: f64,
    /// Change in percent.
    pub change_pct: f64,
}

/// Detected market theme. Ordering in a snapshot = relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Theme name.
    pub name: String,
    /// Number of rising stocks matching the theme.
    pub count: usize,
    /// Relevance score computed by the producer.
    pub score: f64,
}

/// A ranked rising stock.
///
/// `score` defines descending rank; ties keep the producer's original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    /// Stock code — the item's identity.
    pub code: StockCode,
    /// Company name.
    pub name: String,
    /// Exchange.
    pub market: Market,
    /// Current price in KRW.
    pub price: i64,
    /// Change versus the previous close in KRW.
    pub change: i64,
    /// Change in percent.
    pub change_pct: f64,
    /// Traded shares today.
    pub volume: u64,
    /// Traded value today in KRW.
    pub trade_value: i64,
    /// Rank score, 0..=150.
    pub score: u32,
}

/// The complete, timestamped, immutable state object distributed to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Producer timestamp, Unix milliseconds. Monotonically non-decreasing
    /// across publishes; viewers discard anything older than what they hold.
    pub timestamp_ms: i64,
    /// Market indices, producer order.
    pub indices: Vec<IndexQuote>,
    /// Top themes, relevance order.
    pub themes: Vec<Theme>,
    /// Ranked rising stocks, descending score.
    pub stocks: Vec<RankedItem>,
}

impl Snapshot {
    /// Create an empty snapshot stamped with the current time.
    pub fn now() -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            indices: Vec::new(),
            themes: Vec::new(),
            stocks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_code_accepts_six_digits() {
        let code = StockCode::parse("005930").unwrap();
        assert_eq!(code.as_str(), "005930");
    }

    #[test]
    fn test_stock_code_rejects_malformed() {
        assert!(StockCode::parse("").is_err());
        assert!(StockCode::parse("5930").is_err());
        assert!(StockCode::parse("0059300").is_err());
        assert!(StockCode::parse("00593a").is_err());
        assert!(StockCode::parse("../etc").is_err());
    }

    #[test]
    fn test_stock_code_trims_whitespace() {
        let code = StockCode::parse(" 000660 ").unwrap();
        assert_eq!(code.as_str(), "000660");
    }

    #[test]
    fn test_market_wire_casing() {
        let json = serde_json::to_string(&Market::Kosdaq).unwrap();
        assert_eq!(json, "\"KOSDAQ\"");
        let back: Market = serde_json::from_str("\"KOSPI\"").unwrap();
        assert_eq!(back, Market::Kospi);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = Snapshot {
            timestamp_ms: 1_706_400_000_000,
            indices: vec![IndexQuote {
                name: "KOSPI".to_string(),
                value: 2512.3,
                change: 13.76,
                change_pct: 0.34,
            }],
            themes: vec![Theme {
                name: "semiconductor".to_string(),
                count: 4,
                score: 182.5,
            }],
            stocks: vec![RankedItem {
                code: StockCode::parse("005930").unwrap(),
                name: "Samsung Electronics".to_string(),
                market: Market::Kospi,
                price: 74_300,
                change: 1_200,
                change_pct: 1.64,
                volume: 12_345_678,
                trade_value: 917_000_000_000,
                score: 42,
            }],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"code\":\"005930\""));
        assert!(json.contains("\"market\":\"KOSPI\""));

        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
