//! Ranking and scoring helpers applied to producer output.

use leadstock_core::{Market, RankedItem, Theme};

/// Compute the rank score for a stock row.
///
/// change_pct contributes 5 points per percent, with tiered bonuses for
/// trade value (liquidity), volume (participation), a small KOSDAQ
/// volatility bonus, and a limit-up bonus at >=29.8%. Clamped to 0..=150.
///
/// `trade_value` is raw KRW. The liquidity tiers are 100/200/500 billion
/// KRW (1000억/2000억/5000억) of daily trade value, which is where the
/// bonus is meaningful for large-cap leaders.
pub fn score_item(market: Market, change_pct: f64, trade_value: i64, volume: u64) -> u32 {
    let mut score = change_pct * 5.0;

    // Tier comparison in millions of KRW.
    let trade_value_m = trade_value / 1_000_000;
    if trade_value_m >= 500_000 {
        score += 20.0;
    } else if trade_value_m >= 200_000 {
        score += 10.0;
    } else if trade_value_m >= 100_000 {
        score += 5.0;
    }

    if volume >= 50_000_000 {
        score += 15.0;
    } else if volume >= 20_000_000 {
        score += 8.0;
    } else if volume >= 10_000_000 {
        score += 3.0;
    }

    if market == Market::Kosdaq {
        score += 2.0;
    }

    // Limit-up band.
    if change_pct >= 29.8 {
        score += 10.0;
    }

    score.round().clamp(0.0, 150.0) as u32
}

/// Rank items by descending score and truncate to `top_n`.
///
/// The sort is stable: equal scores keep the producer's original order,
/// which is the documented tie-break.
pub fn rank_items(mut items: Vec<RankedItem>, top_n: usize) -> Vec<RankedItem> {
    items.sort_by(|a, b| b.score.cmp(&a.score));
    items.truncate(top_n);
    items
}

/// Truncate themes to the `top_n` most relevant, preserving order.
pub fn top_themes(mut themes: Vec<Theme>, top_n: usize) -> Vec<Theme> {
    themes.truncate(top_n);
    themes
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadstock_core::StockCode;

    fn item(code: &str, score: u32) -> RankedItem {
        RankedItem {
            code: StockCode::parse(code).unwrap(),
            name: format!("stock-{code}"),
            market: Market::Kospi,
            price: 10_000,
            change: 500,
            change_pct: 5.0,
            volume: 1_000_000,
            trade_value: 10_000_000_000,
            score,
        }
    }

    #[test]
    fn test_rank_descending_with_stable_tie_break() {
        let items = vec![
            item("000001", 80),
            item("000002", 90),
            item("000003", 80),
            item("000004", 95),
        ];
        let ranked = rank_items(items, 10);
        let codes: Vec<&str> = ranked.iter().map(|i| i.code.as_str()).collect();
        // 000001 ranks before 000003: same score, earlier producer order.
        assert_eq!(codes, vec!["000004", "000002", "000001", "000003"]);
    }

    #[test]
    fn test_rank_truncates() {
        let items = vec![item("000001", 10), item("000002", 20), item("000003", 30)];
        assert_eq!(rank_items(items, 2).len(), 2);
    }

    #[test]
    fn test_score_limit_up_band() {
        // 29.9% on KOSDAQ with heavy liquidity and participation:
        // 149.5 + 20 + 15 + 2 + 10, clamped to 150.
        let s = score_item(Market::Kosdaq, 29.9, 600_000_000_000, 60_000_000);
        assert_eq!(s, 150);
    }

    #[test]
    fn test_score_plain_rise() {
        // 4% KOSPI rise, thin volume: 4 * 5 = 20.
        let s = score_item(Market::Kospi, 4.0, 1_000_000_000, 100_000);
        assert_eq!(s, 20);
    }

    #[test]
    fn test_score_trade_value_tier_boundaries() {
        // Raw-KRW thresholds: 100/200/500 billion.
        assert_eq!(score_item(Market::Kospi, 0.0, 99_999_000_000, 0), 0);
        assert_eq!(score_item(Market::Kospi, 0.0, 100_000_000_000, 0), 5);
        assert_eq!(score_item(Market::Kospi, 0.0, 200_000_000_000, 0), 10);
        assert_eq!(score_item(Market::Kospi, 0.0, 500_000_000_000, 0), 20);
    }

    #[test]
    fn test_score_never_negative() {
        let s = score_item(Market::Kospi, -12.0, 0, 0);
        assert_eq!(s, 0);
    }
}
