//! Rounding policy for summary fields
//!
//! Places are decimal places; negative values round to tens (-1), hundreds (-2), and so on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingConfig {
    /// Performance percentages of every account window
    pub performance_places: i32,

    /// Account own capital
    pub capital_places: i32,

    /// Total and year-to-date profit
    pub account_profit_places: i32,

    /// Profit of the 1w..3y windows
    pub window_profit_places: i32,

    pub position_price_places: i32,
    pub position_change_places: i32,
    pub position_value_places: i32,
    pub position_profit_places: i32,
    pub position_performance_places: i32,

    pub watchlist_change_places: i32,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            performance_places: 1,
            capital_places: -1,
            account_profit_places: -1,
            window_profit_places: 0,
            position_price_places: 2,
            position_change_places: 2,
            position_value_places: 0,
            position_profit_places: 0,
            position_performance_places: 2,
            watchlist_change_places: 2,
        }
    }
}
