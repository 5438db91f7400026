//! Per-item detail types, fetched on demand via the detail collaborator.
//!
//! Details are not part of a [`crate::Snapshot`] and are not cached by the
//! synchronization core.

use serde::{Deserialize, Serialize};

use crate::types::{Market, StockCode};

/// Classic pivot levels computed from the previous session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub s1: f64,
    pub s2: f64,
}

impl PivotLevels {
    /// Standard pivot formula from the previous session's high/low/close:
    /// P = (H+L+C)/3, R1 = 2P-L, R2 = P+(H-L), S1 = 2P-H, S2 = P-(H-L).
    /// Levels are rounded to whole KRW.
    pub fn from_prev_day(high: f64, low: f64, close: f64) -> Self {
        let pivot = (high + low + close) / 3.0;
        Self {
            pivot: pivot.round(),
            r1: (2.0 * pivot - low).round(),
            r2: (pivot + (high - low)).round(),
            s1: (2.0 * pivot - high).round(),
            s2: (pivot - (high - low)).round(),
        }
    }
}

/// A headline associated with a stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub date: String,
    pub url: String,
}

/// One reported financial period (e.g. "2024.12").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub period: String,
    /// Sales in millions of KRW.
    pub sales: f64,
    /// Operating profit in millions of KRW.
    pub operating_profit: f64,
}

/// One day of institutional/foreign investor flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorTrend {
    pub date: String,
    /// Net institutional purchases, shares.
    pub institution: i64,
    /// Net foreign purchases, shares.
    pub foreigner: i64,
    /// Foreign ownership ratio in percent.
    pub foreigner_ratio: f64,
}

/// On-demand detail for a single stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub code: StockCode,
    pub name: String,
    pub market: Market,
    pub price: i64,
    pub change: i64,
    pub change_pct: f64,
    pub volume: u64,
    pub trade_value: i64,
    /// Pivot levels if the previous session's data was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot: Option<PivotLevels>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
    #[serde(default)]
    pub financials: Vec<FinancialPeriod>,
    #[serde(default)]
    pub investor_trends: Vec<InvestorTrend>,
    /// Producer-generated opinion text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opinion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_formula() {
        // H=110, L=90, C=100 -> P=100, R1=110, R2=120, S1=90, S2=80
        let p = PivotLevels::from_prev_day(110.0, 90.0, 100.0);
        assert_eq!(p.pivot, 100.0);
        assert_eq!(p.r1, 110.0);
        assert_eq!(p.r2, 120.0);
        assert_eq!(p.s1, 90.0);
        assert_eq!(p.s2, 80.0);
    }

    #[test]
    fn test_pivot_rounds_to_whole_krw() {
        let p = PivotLevels::from_prev_day(75_400.0, 73_100.0, 74_300.0);
        assert_eq!(p.pivot, (p.pivot).round());
        assert_eq!(p.r2, p.pivot + 2_300.0);
    }

    #[test]
    fn test_detail_optional_fields_omitted() {
        let detail = ItemDetail {
            code: StockCode::parse("000660").unwrap(),
            name: "SK hynix".to_string(),
            market: Market::Kospi,
            price: 135_000,
            change: -500,
            change_pct: -0.37,
            volume: 2_000_000,
            trade_value: 270_000_000_000,
            pivot: None,
            news: vec![],
            financials: vec![],
            investor_trends: vec![],
            opinion: None,
        };
        let json = serde_json::to_string(&detail).unwrap();
        assert!(!json.contains("pivot"));
        assert!(!json.contains("opinion"));
    }
}
