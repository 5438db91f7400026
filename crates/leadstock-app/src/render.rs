//! Terminal rendering of the dashboard view.
//!
//! Pure view-state to text; the watch loop in `main` decides when to draw.

use chrono::{TimeZone, Utc};
use leadstock_client::{ConnectionState, ViewState};
use std::fmt::Write as _;

/// Render one frame of the dashboard.
pub fn render(view: &ViewState) -> String {
    let mut out = String::new();

    let status = match (view.connection, view.via_pull) {
        (ConnectionState::Live, false) => "LIVE",
        (ConnectionState::Live, true) => "LIVE (polling)",
        (ConnectionState::Connecting, _) => "CONNECTING",
        (ConnectionState::Degraded, _) => "DEGRADED",
        (ConnectionState::Disconnected, _) => "DISCONNECTED",
    };
    let _ = writeln!(out, "leadstock [{status}]");

    if view.auth_failed {
        let _ = writeln!(out, "!! AUTH FAILED - update the token in settings");
    } else if view.producer_offline {
        let _ = writeln!(out, "!! PRODUCER OFFLINE - showing last known data");
    }

    if let Some(ms) = view.last_update_ms {
        if let Some(t) = Utc.timestamp_millis_opt(ms).single() {
            let _ = writeln!(out, "last update: {} UTC", t.format("%Y-%m-%d %H:%M:%S"));
        }
    }

    let Some(snapshot) = &view.snapshot else {
        let _ = writeln!(out, "\n  (no data yet)");
        return out;
    };

    if !snapshot.indices.is_empty() {
        let _ = writeln!(out);
        for index in &snapshot.indices {
            let _ = writeln!(
                out,
                "  {:<12} {:>10.2}  {:>+8.2} ({:>+.2}%)",
                index.name, index.value, index.change, index.change_pct
            );
        }
    }

    if !snapshot.themes.is_empty() {
        let _ = writeln!(out, "\n  themes:");
        for theme in &snapshot.themes {
            let _ = writeln!(
                out,
                "    {:<16} {:>3} stocks  score {:>6.1}",
                theme.name, theme.count, theme.score
            );
        }
    }

    let _ = writeln!(
        out,
        "\n  {:<6} {:<20} {:<6} {:>10} {:>8} {:>6}",
        "code", "name", "mkt", "price", "chg%", "score"
    );
    for stock in &snapshot.stocks {
        let _ = writeln!(
            out,
            "  {:<6} {:<20} {:<6} {:>10} {:>+7.2}% {:>6}",
            stock.code,
            stock.name,
            stock.market.as_str(),
            stock.price,
            stock.change_pct,
            stock.score
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadstock_core::{Market, RankedItem, Snapshot, StockCode};

    fn view_with_rows() -> ViewState {
        let stocks = vec![
            RankedItem {
                code: StockCode::parse("005930").unwrap(),
                name: "Samsung Electronics".to_string(),
                market: Market::Kospi,
                price: 74_300,
                change: 1_200,
                change_pct: 1.64,
                volume: 12_000_000,
                trade_value: 890_000_000_000,
                score: 120,
            },
            RankedItem {
                code: StockCode::parse("000660").unwrap(),
                name: "SK Hynix".to_string(),
                market: Market::Kospi,
                price: 178_000,
                change: -2_500,
                change_pct: -1.38,
                volume: 3_000_000,
                trade_value: 530_000_000_000,
                score: 95,
            },
        ];
        ViewState {
            connection: ConnectionState::Live,
            snapshot: Some(Snapshot {
                timestamp_ms: 1_700_000_000_000,
                indices: vec![],
                themes: vec![],
                stocks,
            }),
            last_update_ms: Some(1_700_000_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn test_rows_render_in_snapshot_order() {
        let frame = render(&view_with_rows());
        let first = frame.find("005930").unwrap();
        let second = frame.find("000660").unwrap();
        assert!(first < second);
        assert!(frame.contains("LIVE"));
        assert!(!frame.contains("PRODUCER OFFLINE"));
    }

    #[test]
    fn test_offline_banner_keeps_last_data() {
        let mut view = view_with_rows();
        view.connection = ConnectionState::Degraded;
        view.producer_offline = true;
        let frame = render(&view);
        assert!(frame.contains("PRODUCER OFFLINE"));
        assert!(frame.contains("005930"), "stale data stays visible");
    }

    #[test]
    fn test_auth_failure_is_distinct_from_offline() {
        let view = ViewState {
            connection: ConnectionState::Disconnected,
            auth_failed: true,
            ..Default::default()
        };
        let frame = render(&view);
        assert!(frame.contains("AUTH FAILED"));
        assert!(!frame.contains("PRODUCER OFFLINE"));
    }

    #[test]
    fn test_no_data_placeholder() {
        let frame = render(&ViewState::default());
        assert!(frame.contains("(no data yet)"));
    }
}
