//! Publish-ready summary records
//!
//! Field order of each struct is the serialized field order, so equal records always
//! produce byte-identical payloads.

use crate::rounding::Rounded;
use avanza_fetcher::InstrumentType;
use serde::Serialize;

/// Rounded performance for one window
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WindowSummary {
    pub performance: Rounded,
    pub profit: Rounded,
}

/// Per-account summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub capital: Rounded,
    pub total: WindowSummary,
    pub ytd: WindowSummary,
    #[serde(rename = "1w")]
    pub one_week: WindowSummary,
    #[serde(rename = "1m")]
    pub one_month: WindowSummary,
    #[serde(rename = "3m")]
    pub three_months: WindowSummary,
    #[serde(rename = "6m")]
    pub six_months: WindowSummary,
    #[serde(rename = "1y")]
    pub one_year: WindowSummary,
    #[serde(rename = "3y")]
    pub three_years: WindowSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub date: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub instrument_type: InstrumentType,
    pub id: Option<String>,
    pub price: Rounded,
    pub change: Rounded,
    pub value: Rounded,
    pub profit: Rounded,
    pub performance: Rounded,
}

/// Positions held in one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountPositions {
    pub account: String,
    pub id: String,
    pub positions: Vec<PositionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntrySummary {
    pub date: Option<String>,
    pub name: String,
    pub ticker: Option<String>,
    #[serde(rename = "type")]
    pub instrument_type: InstrumentType,
    pub id: Option<String>,
    pub change: Rounded,
}

/// Entries of one watchlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistSummary {
    pub name: String,
    pub entries: Vec<WatchlistEntrySummary>,
}

/// Any record that goes to the bus
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryRecord {
    Account(AccountSummary),
    Positions(AccountPositions),
    Watchlist(WatchlistSummary),
}

impl SummaryRecord {
    /// Topic segments below the root topic; together with the root they form the publish key
    pub fn topic_segments(&self) -> Vec<&str> {
        match self {
            SummaryRecord::Account(summary) => vec![summary.name.as_str()],
            SummaryRecord::Positions(positions) => vec![positions.account.as_str(), "positions"],
            SummaryRecord::Watchlist(watchlist) => vec!["watchlists", watchlist.name.as_str()],
        }
    }
}

impl From<AccountSummary> for SummaryRecord {
    fn from(summary: AccountSummary) -> Self {
        SummaryRecord::Account(summary)
    }
}

impl From<AccountPositions> for SummaryRecord {
    fn from(positions: AccountPositions) -> Self {
        SummaryRecord::Positions(positions)
    }
}

impl From<WatchlistSummary> for SummaryRecord {
    fn from(watchlist: WatchlistSummary) -> Self {
        SummaryRecord::Watchlist(watchlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_segments() {
        let record = SummaryRecord::from(WatchlistSummary {
            name: "Tech".to_string(),
            entries: Vec::new(),
        });
        assert_eq!(record.topic_segments(), vec!["watchlists", "Tech"]);

        let record = SummaryRecord::from(AccountPositions {
            account: "ISK".to_string(),
            id: "A1".to_string(),
            positions: Vec::new(),
        });
        assert_eq!(record.topic_segments(), vec!["ISK", "positions"]);
    }

    #[test]
    fn test_untagged_serialization() {
        let record = SummaryRecord::from(WatchlistSummary {
            name: "Tech".to_string(),
            entries: Vec::new(),
        });
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"name":"Tech","entries":[]}"#);
    }
}
