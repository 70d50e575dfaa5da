//! Poll loop driver
//!
//! Runs the configured pipelines once per interval. A cycle always completes (or times out)
//! before the next sleep starts, so cycles never overlap and the publish cache has a single
//! owner.

use avanza_fetcher::{AccountDataProvider, AccountSnapshot, OverviewSnapshot, SnapshotFetcher};
use chrono::{DateTime, Utc};
use mqtt_publisher::{ChangeGatedPublisher, MessageBus, PublishError, PublishOutcome, TopicPath};
use std::future::Future;
use std::time::{Duration, Instant};
use summary_reshaper::{group_positions, group_watchlists, reshape_account, SummaryRecord};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Cycling,
}

/// Outcome of one poll cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Messages sent to the bus, including raw dumps
    pub published: usize,
    /// Records left out because their payload was unchanged
    pub skipped: usize,
    pub failed_pipelines: Vec<Pipeline>,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            published: 0,
            skipped: 0,
            failed_pipelines: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed_pipelines.is_empty()
    }

    fn record(&mut self, outcome: PublishOutcome) {
        match outcome {
            PublishOutcome::Published => self.published += 1,
            PublishOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Owns the fetcher, the change-gated publisher and the configuration
pub struct PollDriver<P, B> {
    fetcher: SnapshotFetcher<P>,
    publisher: ChangeGatedPublisher<B>,
    config: ServiceConfig,
    root: TopicPath,
    state: DriverState,
    session_stale: bool,
}

impl<P: AccountDataProvider, B: MessageBus> PollDriver<P, B> {
    pub fn new(
        fetcher: SnapshotFetcher<P>,
        publisher: ChangeGatedPublisher<B>,
        config: ServiceConfig,
    ) -> Self {
        let root = TopicPath::root(&config.topic);
        Self { fetcher, publisher, config, root, state: DriverState::Idle, session_stale: false }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn fetcher(&self) -> &SnapshotFetcher<P> {
        &self.fetcher
    }

    pub fn publisher(&self) -> &ChangeGatedPublisher<B> {
        &self.publisher
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Log in against the provider
    pub async fn authenticate(&mut self) -> Result<()> {
        self.fetcher.authenticate().await?;
        self.session_stale = false;
        info!("Authenticated against account provider");
        Ok(())
    }

    /// Run every configured pipeline once
    ///
    /// Pipeline failures are logged and listed in the report; they never abort the cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::new();
        let started = Instant::now();

        if self.session_stale {
            info!("Session expired, logging in again");
            if let Err(e) = self.authenticate().await {
                error!("Re-authentication failed, retrying next cycle: {}", e);
                report.failed_pipelines = self.config.pipelines.clone();
                report.elapsed = started.elapsed();
                return report;
            }
        }

        self.state = DriverState::Cycling;
        let mut overview = None;

        for pipeline in self.config.pipelines.clone() {
            if self.session_stale {
                report.failed_pipelines.push(pipeline);
                continue;
            }

            if let Err(e) = self.run_pipeline(pipeline, &mut overview, &mut report).await {
                if e.needs_login() {
                    self.session_stale = true;
                }
                warn!("Pipeline {} failed: {}", pipeline, e);
                report.failed_pipelines.push(pipeline);
            }
        }

        self.state = DriverState::Idle;
        report.elapsed = started.elapsed();
        report
    }

    /// Run one cycle bounded by the configured cycle timeout
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        let limit = self.config.cycle_timeout();

        match timeout(limit, self.run_cycle()).await {
            Ok(report) => {
                log_report(&report);
                Ok(report)
            }
            Err(_) => {
                // The cycle future was dropped mid-flight
                self.state = DriverState::Idle;
                Err(ServiceError::Timeout(limit))
            }
        }
    }

    /// Cycle, then sleep for the interval, until `shutdown` resolves
    ///
    /// Shutdown is observed during the sleep; a signal that arrives mid-cycle takes effect
    /// as soon as that cycle ends.
    pub async fn run<S>(&mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let interval = self.config.interval();
        info!("Polling every {:?}, pipelines: {:?}", interval, self.config.pipelines);

        loop {
            if let Err(e) = self.run_once().await {
                error!("Cycle aborted: {}", e);
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping poll loop");
                    break;
                }
                _ = sleep(interval) => {}
            }
        }
    }

    /// Close the bus connection
    pub async fn shutdown(&self) {
        if let Err(e) = self.publisher.bus().disconnect().await {
            warn!("Failed to disconnect from bus: {}", e);
        }
    }

    async fn run_pipeline(
        &mut self,
        pipeline: Pipeline,
        overview: &mut Option<OverviewSnapshot>,
        report: &mut CycleReport,
    ) -> Result<()> {
        debug!("Running pipeline {}", pipeline);

        match pipeline {
            Pipeline::Accounts => {
                let snapshot = self.overview_snapshot(overview).await?;
                self.publish_accounts(snapshot, report).await
            }
            Pipeline::Positions => {
                let snapshot = self.overview_snapshot(overview).await?;
                self.publish_positions(&snapshot.accounts, report).await
            }
            Pipeline::Watchlists => self.publish_watchlists(report).await,
            Pipeline::Raw => self.publish_raw(report).await,
        }
    }

    /// The account overview is fetched at most once per cycle
    async fn overview_snapshot<'a>(
        &self,
        overview: &'a mut Option<OverviewSnapshot>,
    ) -> Result<&'a OverviewSnapshot> {
        let snapshot = match overview.take() {
            Some(snapshot) => snapshot,
            None => self.fetcher.fetch_overview_snapshot().await?,
        };
        Ok(overview.insert(snapshot))
    }

    async fn publish_accounts(
        &mut self,
        overview: &OverviewSnapshot,
        report: &mut CycleReport,
    ) -> Result<()> {
        if self.config.debug {
            let payload = serde_json::to_string(&overview.raw).map_err(PublishError::from)?;
            self.publisher.publish_untracked(&self.root, &payload, false).await?;
        }

        for snapshot in &overview.accounts {
            let record = SummaryRecord::from(reshape_account(snapshot, &self.config.rounding));
            let (topic, outcome) = self.publish_record(&record, report).await?;

            if self.config.debug && outcome == PublishOutcome::Published {
                self.echo_debug(&topic, snapshot).await?;
            }
        }
        Ok(())
    }

    async fn publish_positions(
        &mut self,
        accounts: &[AccountSnapshot],
        report: &mut CycleReport,
    ) -> Result<()> {
        let positions = self.fetcher.fetch_positions().await?;

        for grouped in group_positions(accounts, &positions, &self.config.rounding) {
            self.publish_record(&SummaryRecord::from(grouped), report).await?;
        }
        Ok(())
    }

    async fn publish_watchlists(&mut self, report: &mut CycleReport) -> Result<()> {
        let entries = self.fetcher.fetch_watchlists().await?;

        for watchlist in group_watchlists(&entries, &self.config.rounding) {
            self.publish_record(&SummaryRecord::from(watchlist), report).await?;
        }
        Ok(())
    }

    /// Raw dumps are retained but bypass the change gate
    async fn publish_raw(&mut self, report: &mut CycleReport) -> Result<()> {
        let dump = self.fetcher.fetch_raw().await?;
        let payload = serde_json::to_string(&dump).map_err(PublishError::from)?;

        let topic = self.root.join("raw");
        self.publisher.publish_untracked(&topic, &payload, true).await?;
        report.published += 1;
        Ok(())
    }

    async fn publish_record(
        &mut self,
        record: &SummaryRecord,
        report: &mut CycleReport,
    ) -> Result<(TopicPath, PublishOutcome)> {
        let topic = self.root.join_all(record.topic_segments());
        let outcome = self.publisher.publish(&topic, record).await?;
        report.record(outcome);
        Ok((topic, outcome))
    }

    /// Echo upstream account payloads next to a freshly published summary, not retained
    async fn echo_debug(&self, topic: &TopicPath, snapshot: &AccountSnapshot) -> Result<()> {
        for part in ["account", "overview"] {
            let payload = serde_json::to_string(&snapshot.raw[part]).map_err(PublishError::from)?;
            self.publisher
                .publish_untracked(&topic.join_all(["debug", part]), &payload, false)
                .await?;
        }
        Ok(())
    }
}

fn log_report(report: &CycleReport) {
    if report.is_success() {
        info!(
            "Cycle started {} finished in {:?}: {} published, {} unchanged",
            report.started_at.format("%H:%M:%S"),
            report.elapsed,
            report.published,
            report.skipped
        );
    } else {
        warn!(
            "Cycle started {} finished in {:?}: {} published, {} unchanged, failed: {:?}",
            report.started_at.format("%H:%M:%S"),
            report.elapsed,
            report.published,
            report.skipped,
            report.failed_pipelines
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use avanza_fetcher::models::*;
    use avanza_fetcher::FetcherError;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockProvider {
        overview: Mutex<Overview>,
        positions: Positions,
        watchlists: Vec<Watchlist>,
        orderbooks: Vec<Orderbook>,
        instrument: Instrument,
        fail_positions: AtomicBool,
        expire_session: AtomicBool,
        logins: AtomicUsize,
        overview_calls: AtomicUsize,
    }

    impl MockProvider {
        fn set_overview(&self, value: Value) {
            *self.overview.lock().unwrap() = serde_json::from_value(value).unwrap();
        }
    }

    #[async_trait]
    impl AccountDataProvider for MockProvider {
        async fn authenticate(&self) -> avanza_fetcher::Result<()> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn overview(&self) -> avanza_fetcher::Result<Overview> {
            self.overview_calls.fetch_add(1, Ordering::SeqCst);
            if self.expire_session.swap(false, Ordering::SeqCst) {
                return Err(FetcherError::SessionExpired);
            }
            Ok(self.overview.lock().unwrap().clone())
        }

        async fn account_overview(&self, _account_id: &str) -> avanza_fetcher::Result<AccountOverview> {
            Ok(AccountOverview::default())
        }

        async fn positions(&self) -> avanza_fetcher::Result<Positions> {
            if self.fail_positions.load(Ordering::SeqCst) {
                return Err(FetcherError::Status {
                    endpoint: "/_mobile/account/positions".to_string(),
                    status: 503,
                });
            }
            Ok(self.positions.clone())
        }

        async fn watchlists(&self) -> avanza_fetcher::Result<Vec<Watchlist>> {
            Ok(self.watchlists.clone())
        }

        async fn orderbooks(&self, ids: &[String]) -> avanza_fetcher::Result<Vec<Orderbook>> {
            Ok(self.orderbooks.iter().filter(|o| ids.contains(&o.id)).cloned().collect())
        }

        async fn instrument(&self, _instrument_type: &str, _id: &str) -> avanza_fetcher::Result<Instrument> {
            Ok(self.instrument.clone())
        }
    }

    #[derive(Default)]
    struct RecordingBus {
        messages: Mutex<Vec<(String, String, bool)>>,
    }

    impl RecordingBus {
        fn topics(&self) -> Vec<String> {
            self.messages.lock().unwrap().iter().map(|(topic, _, _)| topic.clone()).collect()
        }

        fn payload(&self, index: usize) -> Value {
            serde_json::from_str(&self.messages.lock().unwrap()[index].1).unwrap()
        }
    }

    #[async_trait]
    impl MessageBus for RecordingBus {
        async fn publish(&self, topic: &str, payload: &str, retained: bool) -> mqtt_publisher::Result<()> {
            self.messages.lock().unwrap().push((topic.to_string(), payload.to_string(), retained));
            Ok(())
        }
    }

    fn isk_overview(total_profit_percent: f64) -> Value {
        json!({
            "accounts": [{
                "accountId": "A1",
                "name": "ISK",
                "accountType": "Investeringssparkonto",
                "ownCapital": 10000,
                "totalProfitPercent": total_profit_percent
            }]
        })
    }

    fn provider() -> MockProvider {
        let provider = MockProvider {
            positions: serde_json::from_value(json!({
                "instrumentPositions": [{
                    "instrumentType": "STOCK",
                    "positions": [
                        {"accountId": "A1", "name": "Volvo B", "orderbookId": 5269,
                         "lastPrice": 250.456, "changePercent": 1.234, "value": 2504.56,
                         "profit": 104.4, "profitPercent": 4.35},
                        {"accountId": "Z9", "name": "Orphan", "lastPrice": 1.0}
                    ]
                }]
            }))
            .unwrap(),
            watchlists: serde_json::from_value(json!([
                {"name": "Tech", "id": "1", "orderbooks": ["5361"]},
                {"name": "Empty", "id": "2", "orderbooks": []}
            ]))
            .unwrap(),
            orderbooks: serde_json::from_value(json!([
                {"id": "5361", "name": "Ericsson B", "instrumentType": "STOCK",
                 "changePercent": -0.456, "updated": "2024-05-02T15:29:59"}
            ]))
            .unwrap(),
            instrument: serde_json::from_value(json!({"id": "5361", "tickerSymbol": "ERIC B"}))
                .unwrap(),
            ..Default::default()
        };
        provider.set_overview(isk_overview(5.234));
        provider
    }

    fn driver(
        provider: MockProvider,
        pipelines: Vec<Pipeline>,
        debug: bool,
    ) -> PollDriver<MockProvider, RecordingBus> {
        let config = ServiceConfig { pipelines, debug, ..Default::default() };
        PollDriver::new(
            SnapshotFetcher::new(provider),
            ChangeGatedPublisher::new(RecordingBus::default()),
            config,
        )
    }

    #[tokio::test]
    async fn test_account_cycles_publish_only_changes() {
        let mut driver = driver(provider(), vec![Pipeline::Accounts], false);

        let first = driver.run_cycle().await;
        assert_eq!(first.published, 1);
        assert_eq!(driver.publisher().bus().topics(), vec!["Avanza/ISK"]);
        let payload = driver.publisher().bus().payload(0);
        assert_eq!(payload["name"], "ISK");
        assert_eq!(payload["capital"], 10000);
        assert_eq!(payload["total"]["performance"], 5.2);

        let second = driver.run_cycle().await;
        assert_eq!(second.published, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(driver.publisher().bus().topics().len(), 1);

        driver.fetcher().provider().set_overview(isk_overview(5.91));
        let third = driver.run_cycle().await;
        assert_eq!(third.published, 1);
        assert_eq!(driver.publisher().bus().topics().len(), 2);
        assert_eq!(driver.publisher().bus().payload(1)["total"]["performance"], 5.9);
        assert_eq!(driver.state(), DriverState::Idle);
    }

    #[tokio::test]
    async fn test_all_pipelines_publish_expected_topics() {
        let mut driver = driver(provider(), Pipeline::default_set(), false);

        let report = driver.run_cycle().await;
        assert!(report.is_success());
        assert_eq!(report.published, 3);
        assert_eq!(
            driver.publisher().bus().topics(),
            vec!["Avanza/ISK", "Avanza/ISK/positions", "Avanza/watchlists/Tech"]
        );

        let positions = driver.publisher().bus().payload(1);
        assert_eq!(positions["account"], "ISK");
        assert_eq!(positions["positions"].as_array().unwrap().len(), 1);
        assert_eq!(positions["positions"][0]["price"], 250.46);

        let watchlist = driver.publisher().bus().payload(2);
        assert_eq!(watchlist["entries"][0]["ticker"], "ERIC B");
        assert_eq!(watchlist["entries"][0]["change"], -0.46);

        // Overview is fetched once and shared by the account and position pipelines
        assert_eq!(driver.fetcher().provider().overview_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_does_not_stop_other_pipelines() {
        let provider = provider();
        provider.fail_positions.store(true, Ordering::SeqCst);
        let mut driver = driver(provider, Pipeline::default_set(), false);

        let report = driver.run_cycle().await;
        assert_eq!(report.failed_pipelines, vec![Pipeline::Positions]);
        assert_eq!(
            driver.publisher().bus().topics(),
            vec!["Avanza/ISK", "Avanza/watchlists/Tech"]
        );
    }

    #[tokio::test]
    async fn test_session_expiry_triggers_login_next_cycle() {
        let provider = provider();
        provider.expire_session.store(true, Ordering::SeqCst);
        let mut driver = driver(provider, vec![Pipeline::Accounts, Pipeline::Watchlists], false);

        let first = driver.run_cycle().await;
        assert_eq!(first.failed_pipelines, vec![Pipeline::Accounts, Pipeline::Watchlists]);
        assert_eq!(driver.fetcher().provider().logins.load(Ordering::SeqCst), 0);

        let second = driver.run_cycle().await;
        assert!(second.is_success());
        assert_eq!(driver.fetcher().provider().logins.load(Ordering::SeqCst), 1);
        assert_eq!(second.published, 2);
    }

    #[tokio::test]
    async fn test_debug_echo_follows_published_summary() {
        let mut driver = driver(provider(), vec![Pipeline::Accounts], true);

        driver.run_cycle().await;
        driver.run_cycle().await;

        let messages = driver.publisher().bus().messages.lock().unwrap().clone();
        let topics: Vec<&str> = messages.iter().map(|(topic, _, _)| topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "Avanza",
                "Avanza/ISK",
                "Avanza/ISK/debug/account",
                "Avanza/ISK/debug/overview",
                "Avanza",
            ]
        );
        let retained: Vec<bool> = messages.iter().map(|(_, _, retained)| *retained).collect();
        assert_eq!(retained, vec![false, true, false, false, false]);

        let account: Value = serde_json::from_str(&messages[2].1).unwrap();
        assert_eq!(account["accountId"], "A1");
    }

    #[tokio::test]
    async fn test_debug_mode_echoes_account_list_every_cycle() {
        let mut driver = driver(provider(), vec![Pipeline::Accounts], true);

        driver.run_cycle().await;
        driver.run_cycle().await;

        let messages = driver.publisher().bus().messages.lock().unwrap().clone();
        let echoes: Vec<&(String, String, bool)> =
            messages.iter().filter(|(topic, _, _)| topic == "Avanza").collect();
        assert_eq!(echoes.len(), 2);
        assert_eq!(echoes[0].1, echoes[1].1);

        let overview: Value = serde_json::from_str(&echoes[0].1).unwrap();
        assert_eq!(overview["accounts"][0]["name"], "ISK");
    }

    #[tokio::test]
    async fn test_raw_dump_is_never_gated() {
        let mut driver = driver(provider(), vec![Pipeline::Raw], false);

        driver.run_cycle().await;
        let report = driver.run_cycle().await;

        assert_eq!(report.published, 1);
        assert_eq!(driver.publisher().bus().topics(), vec!["Avanza/raw", "Avanza/raw"]);
        assert!(driver.publisher().cache().is_empty());

        let dump = driver.publisher().bus().payload(0);
        assert_eq!(dump["overview"]["accounts"][0]["name"], "ISK");
        assert!(dump["overview"]["accounts"][0]["overview"].is_object());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut driver = driver(provider(), vec![Pipeline::Accounts], false);

        driver.run(async {}).await;

        assert_eq!(driver.publisher().bus().topics(), vec!["Avanza/ISK"]);
        assert_eq!(driver.state(), DriverState::Idle);
    }
}
