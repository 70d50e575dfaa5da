use crate::error::Result;
use crate::provider::AccountDataProvider;
use crate::snapshot::*;
use serde_json::Value;
use tracing::debug;

/// Builds per-cycle snapshots from an account data provider
///
/// No retries happen here; any provider failure is returned to the caller as-is.
pub struct SnapshotFetcher<P> {
    provider: P,
}

impl<P: AccountDataProvider> SnapshotFetcher<P> {
    /// Create a new fetcher over a provider
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Access the underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Log in against the provider
    pub async fn authenticate(&self) -> Result<()> {
        self.provider.authenticate().await
    }

    /// Fetch every account together with its extended overview
    pub async fn fetch_overview(&self) -> Result<Vec<AccountSnapshot>> {
        Ok(self.fetch_overview_snapshot().await?.accounts)
    }

    /// Like [`fetch_overview`](Self::fetch_overview), keeping the account list payload
    pub async fn fetch_overview_snapshot(&self) -> Result<OverviewSnapshot> {
        let overview = self.provider.overview().await?;

        let mut accounts = Vec::with_capacity(overview.accounts.len());
        for account in &overview.accounts {
            let detail = self.provider.account_overview(&account.account_id).await?;
            accounts.push(AccountSnapshot::from_parts(account, &detail)?);
        }

        debug!("Fetched {} account snapshots", accounts.len());
        Ok(OverviewSnapshot { accounts, raw: serde_json::to_value(&overview)? })
    }

    /// Fetch all open positions, flattened across instrument groups
    pub async fn fetch_positions(&self) -> Result<Vec<PositionSnapshot>> {
        let positions = self.provider.positions().await?;

        let snapshots: Vec<PositionSnapshot> = positions
            .instrument_positions
            .iter()
            .flat_map(|group| {
                group
                    .positions
                    .iter()
                    .map(|position| PositionSnapshot::from_position(&group.instrument_type, position))
            })
            .collect();

        debug!("Fetched {} position snapshots", snapshots.len());
        Ok(snapshots)
    }

    /// Fetch every watchlist entry with its instrument detail
    pub async fn fetch_watchlists(&self) -> Result<Vec<WatchlistEntrySnapshot>> {
        let watchlists = self.provider.watchlists().await?;

        let mut entries = Vec::new();
        for watchlist in &watchlists {
            if watchlist.orderbooks.is_empty() {
                continue;
            }

            let orderbooks = self.provider.orderbooks(&watchlist.orderbooks).await?;
            for orderbook in &orderbooks {
                let instrument =
                    self.provider.instrument(&orderbook.instrument_type, &orderbook.id).await?;
                entries.push(WatchlistEntrySnapshot::from_parts(
                    &watchlist.name,
                    orderbook,
                    &instrument,
                ));
            }
        }

        debug!("Fetched {} watchlist entries from {} watchlists", entries.len(), watchlists.len());
        Ok(entries)
    }

    /// Fetch overview (with per-account overviews embedded), positions and watchlists unshaped
    pub async fn fetch_raw(&self) -> Result<RawDump> {
        let overview = self.provider.overview().await?;

        let mut overview_json = serde_json::to_value(&overview)?;
        if let Some(accounts) = overview_json.get_mut("accounts").and_then(Value::as_array_mut) {
            for (account, info) in accounts.iter_mut().zip(&overview.accounts) {
                let detail = self.provider.account_overview(&info.account_id).await?;
                if let Some(object) = account.as_object_mut() {
                    object.insert("overview".to_string(), serde_json::to_value(&detail)?);
                }
            }
        }

        Ok(RawDump {
            overview: overview_json,
            positions: serde_json::to_value(self.provider.positions().await?)?,
            watchlists: serde_json::to_value(self.provider.watchlists().await?)?,
        })
    }
}
