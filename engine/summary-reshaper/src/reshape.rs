//! Snapshot to summary record reshaping
//!
//! Every function here is pure: the same snapshot and rounding policy always give the
//! same record.

use crate::config::RoundingConfig;
use crate::records::*;
use crate::rounding::{round_to, Rounded};
use avanza_fetcher::{
    AccountSnapshot, InstrumentType, PositionSnapshot, WatchlistEntrySnapshot, WindowFigures,
};
use std::collections::HashMap;
use tracing::debug;

fn window(figures: &WindowFigures, performance_places: i32, profit_places: i32) -> WindowSummary {
    WindowSummary {
        performance: round_to(figures.percent, performance_places),
        profit: round_to(figures.profit, profit_places),
    }
}

/// Reshape one account snapshot
pub fn reshape_account(snapshot: &AccountSnapshot, rounding: &RoundingConfig) -> AccountSummary {
    let perf = &snapshot.performance;
    let pct = rounding.performance_places;
    let windowed = |figures: &WindowFigures| window(figures, pct, rounding.window_profit_places);

    AccountSummary {
        name: snapshot.name.clone(),
        id: snapshot.account_id.clone(),
        account_type: snapshot.account_type.clone(),
        capital: round_to(snapshot.own_capital, rounding.capital_places),
        total: window(&perf.total, pct, rounding.account_profit_places),
        ytd: window(&perf.ytd, pct, rounding.account_profit_places),
        one_week: windowed(&perf.one_week),
        one_month: windowed(&perf.one_month),
        three_months: windowed(&perf.three_months),
        six_months: windowed(&perf.six_months),
        one_year: windowed(&perf.one_year),
        three_years: windowed(&perf.three_years),
    }
}

/// Reshape one position snapshot
pub fn reshape_position(snapshot: &PositionSnapshot, rounding: &RoundingConfig) -> PositionSummary {
    PositionSummary {
        date: snapshot.last_price_updated.clone(),
        name: snapshot.name.clone(),
        instrument_type: snapshot.instrument_type.clone(),
        id: snapshot.orderbook_id.clone(),
        price: round_to(snapshot.last_price, rounding.position_price_places),
        change: round_to(snapshot.change_percent, rounding.position_change_places),
        value: round_to(snapshot.value, rounding.position_value_places),
        profit: round_to(snapshot.profit, rounding.position_profit_places),
        performance: round_to(snapshot.profit_percent, rounding.position_performance_places),
    }
}

/// Group positions under their owning accounts
///
/// Output follows account order; accounts without positions get an empty list and
/// positions referencing an unknown account are dropped.
pub fn group_positions(
    accounts: &[AccountSnapshot],
    positions: &[PositionSnapshot],
    rounding: &RoundingConfig,
) -> Vec<AccountPositions> {
    let mut grouped: Vec<AccountPositions> = accounts
        .iter()
        .map(|account| AccountPositions {
            account: account.name.clone(),
            id: account.account_id.clone(),
            positions: Vec::new(),
        })
        .collect();

    let index: HashMap<&str, usize> = accounts
        .iter()
        .enumerate()
        .map(|(i, account)| (account.account_id.as_str(), i))
        .collect();

    for position in positions {
        match index.get(position.account_id.as_str()) {
            Some(&i) => grouped[i].positions.push(reshape_position(position, rounding)),
            None => debug!(
                "Dropping position {} for unknown account {}",
                position.name, position.account_id
            ),
        }
    }

    grouped
}

/// Pick the change figure that is meaningful for the instrument type
pub fn select_change(entry: &WatchlistEntrySnapshot) -> Option<f64> {
    match entry.instrument_type {
        InstrumentType::Fund => entry.instrument_change_since_one_day,
        InstrumentType::Stock => entry.orderbook_change_percent,
        InstrumentType::Index => entry.instrument_change_percent,
        InstrumentType::Other(_) => None,
    }
}

/// Reshape one watchlist entry
pub fn reshape_watchlist_entry(
    entry: &WatchlistEntrySnapshot,
    rounding: &RoundingConfig,
) -> WatchlistEntrySummary {
    WatchlistEntrySummary {
        date: entry.updated.clone(),
        name: entry.name.clone(),
        ticker: entry.ticker.clone(),
        instrument_type: entry.instrument_type.clone(),
        id: entry.id.clone(),
        change: match select_change(entry) {
            Some(change) => round_to(Some(change), rounding.watchlist_change_places),
            None => Rounded::NONE,
        },
    }
}

/// Group watchlist entries by watchlist, in first-seen order
pub fn group_watchlists(
    entries: &[WatchlistEntrySnapshot],
    rounding: &RoundingConfig,
) -> Vec<WatchlistSummary> {
    let mut grouped: Vec<WatchlistSummary> = Vec::new();

    for entry in entries {
        let summary = reshape_watchlist_entry(entry, rounding);
        match grouped.iter_mut().find(|w| w.name == entry.watchlist) {
            Some(watchlist) => watchlist.entries.push(summary),
            None => grouped.push(WatchlistSummary {
                name: entry.watchlist.clone(),
                entries: vec![summary],
            }),
        }
    }

    grouped
}
