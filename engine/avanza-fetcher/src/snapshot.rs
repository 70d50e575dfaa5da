//! Per-cycle snapshots built from provider responses

use crate::error::Result;
use crate::models::{AccountInfo, AccountOverview, Instrument, Orderbook, PositionInfo};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;

/// Instrument category; anything outside the known set keeps its lower-cased label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstrumentType {
    Stock,
    Fund,
    Index,
    Other(String),
}

impl InstrumentType {
    /// Parse the upstream label, case-insensitively
    pub fn from_api(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "stock" => InstrumentType::Stock,
            "fund" => InstrumentType::Fund,
            "index" => InstrumentType::Index,
            _ => InstrumentType::Other(label),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstrumentType::Stock => "stock",
            InstrumentType::Fund => "fund",
            InstrumentType::Index => "index",
            InstrumentType::Other(label) => label,
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InstrumentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Percentage and absolute profit for one performance window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WindowFigures {
    pub percent: Option<f64>,
    pub profit: Option<f64>,
}

impl WindowFigures {
    pub fn new(percent: Option<f64>, profit: Option<f64>) -> Self {
        Self { percent, profit }
    }
}

/// Named performance windows of an account
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Performance {
    pub total: WindowFigures,
    pub ytd: WindowFigures,
    pub one_week: WindowFigures,
    pub one_month: WindowFigures,
    pub three_months: WindowFigures,
    pub six_months: WindowFigures,
    pub one_year: WindowFigures,
    pub three_years: WindowFigures,
}

/// Account identity, capital and performance for one cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub name: String,
    pub account_type: Option<String>,
    pub own_capital: Option<f64>,
    pub performance: Performance,

    /// Upstream account and overview payloads, echoed in debug mode
    #[serde(skip)]
    pub raw: Value,
}

impl AccountSnapshot {
    /// Combine the account list entry with its extended overview
    pub fn from_parts(account: &AccountInfo, overview: &AccountOverview) -> Result<Self> {
        let performance = Performance {
            total: WindowFigures::new(account.total_profit_percent, account.total_profit),
            ytd: WindowFigures::new(account.performance_percent, account.performance),
            one_week: WindowFigures::new(
                overview.performance_since_one_week_percent,
                overview.performance_since_one_week,
            ),
            one_month: WindowFigures::new(
                overview.performance_since_one_month_percent,
                overview.performance_since_one_month,
            ),
            three_months: WindowFigures::new(
                overview.performance_since_three_months_percent,
                overview.performance_since_three_months,
            ),
            six_months: WindowFigures::new(
                overview.performance_since_six_months_percent,
                overview.performance_since_six_months,
            ),
            one_year: WindowFigures::new(
                overview.performance_since_one_year_percent,
                overview.performance_since_one_year,
            ),
            three_years: WindowFigures::new(
                overview.performance_since_three_years_percent,
                overview.performance_since_three_years,
            ),
        };

        Ok(Self {
            account_id: account.account_id.clone(),
            name: account.name.clone(),
            account_type: account.account_type.clone(),
            own_capital: account.own_capital,
            performance,
            raw: json!({
                "account": serde_json::to_value(account)?,
                "overview": serde_json::to_value(overview)?,
            }),
        })
    }
}

/// One held instrument in one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSnapshot {
    pub account_id: String,
    pub name: String,
    pub instrument_type: InstrumentType,
    pub orderbook_id: Option<String>,
    pub last_price: Option<f64>,
    pub last_price_updated: Option<String>,
    pub change_percent: Option<f64>,
    pub value: Option<f64>,
    pub profit: Option<f64>,
    pub profit_percent: Option<f64>,
}

impl PositionSnapshot {
    pub fn from_position(instrument_type: &str, position: &PositionInfo) -> Self {
        Self {
            account_id: position.account_id.clone(),
            name: position.name.clone(),
            instrument_type: InstrumentType::from_api(instrument_type),
            orderbook_id: position.orderbook_id.clone(),
            last_price: position.last_price,
            last_price_updated: position.last_price_updated.clone(),
            change_percent: position.change_percent,
            value: position.value,
            profit: position.profit,
            profit_percent: position.profit_percent,
        }
    }
}

/// One orderbook on one watchlist, with every change figure the provider offered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntrySnapshot {
    pub watchlist: String,
    pub name: String,
    pub instrument_type: InstrumentType,
    pub id: Option<String>,
    pub ticker: Option<String>,
    pub updated: Option<String>,
    pub orderbook_change_percent: Option<f64>,
    pub instrument_change_percent: Option<f64>,
    pub instrument_change_since_one_day: Option<f64>,
}

impl WatchlistEntrySnapshot {
    pub fn from_parts(watchlist: &str, orderbook: &Orderbook, instrument: &Instrument) -> Self {
        Self {
            watchlist: watchlist.to_string(),
            name: orderbook.name.clone(),
            instrument_type: InstrumentType::from_api(&orderbook.instrument_type),
            id: instrument.id.clone().or_else(|| Some(orderbook.id.clone())),
            ticker: instrument.ticker_symbol.clone(),
            updated: orderbook.updated.clone(),
            orderbook_change_percent: orderbook.change_percent,
            instrument_change_percent: instrument.change_percent,
            instrument_change_since_one_day: instrument.change_since_one_day,
        }
    }
}

/// Account snapshots of one cycle together with the upstream account list payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSnapshot {
    pub accounts: Vec<AccountSnapshot>,

    /// Account list as returned by the provider, echoed in debug mode
    #[serde(skip)]
    pub raw: Value,
}

/// Unshaped provider payloads for the raw dump
#[derive(Debug, Clone, Serialize)]
pub struct RawDump {
    pub overview: Value,
    pub positions: Value,
    pub watchlists: Value,
}
