//! Account data provider seam

use crate::error::Result;
use crate::models::{AccountOverview, Instrument, Orderbook, Overview, Positions, Watchlist};
use async_trait::async_trait;

/// Operations consumed from the brokerage account API
#[async_trait]
pub trait AccountDataProvider: Send + Sync {
    /// Log in with the configured credentials and one-time code
    async fn authenticate(&self) -> Result<()>;

    /// List accounts with overview figures
    async fn overview(&self) -> Result<Overview>;

    /// Extended overview for one account
    async fn account_overview(&self, account_id: &str) -> Result<AccountOverview>;

    /// Open positions grouped by instrument type
    async fn positions(&self) -> Result<Positions>;

    /// User watchlists
    async fn watchlists(&self) -> Result<Vec<Watchlist>>;

    /// Orderbook detail for a set of orderbook ids
    async fn orderbooks(&self, ids: &[String]) -> Result<Vec<Orderbook>>;

    /// Instrument detail for one orderbook
    async fn instrument(&self, instrument_type: &str, id: &str) -> Result<Instrument>;
}
