//! Summary Reshaper
//!
//! Turns raw Avanza snapshots into flat, rounded records meant for dashboards. Rounding
//! happens here and only here; missing upstream figures become an explicit `null`.

pub mod config;
pub mod records;
pub mod reshape;
pub mod rounding;

pub use config::RoundingConfig;
pub use records::{
    AccountPositions, AccountSummary, PositionSummary, SummaryRecord, WatchlistEntrySummary,
    WatchlistSummary, WindowSummary,
};
pub use reshape::{
    group_positions, group_watchlists, reshape_account, reshape_position,
    reshape_watchlist_entry, select_change,
};
pub use rounding::{round_to, Rounded};
