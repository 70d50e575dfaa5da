//! Avanza Fetcher
//!
//! Talks to the Avanza account API and turns its responses into per-cycle snapshots.
//! The provider seam is the [`AccountDataProvider`] trait; [`AvanzaClient`] is the HTTP
//! implementation and [`SnapshotFetcher`] builds snapshots on top of any provider.

pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod provider;
pub mod snapshot;

pub use client::AvanzaClient;
pub use config::AvanzaConfig;
pub use error::{FetcherError, Result};
pub use fetcher::SnapshotFetcher;
pub use provider::AccountDataProvider;
pub use snapshot::{
    AccountSnapshot, InstrumentType, OverviewSnapshot, Performance, PositionSnapshot, RawDump,
    WatchlistEntrySnapshot, WindowFigures,
};
