pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod store;
pub mod transform;

pub use catalog::{CatalogQuery, CATALOG};
pub use config::Settings;
pub use error::{Error, Result};
pub use fetcher::{FetchSettings, Fetcher};
pub use models::{BookRecord, RawItem};
pub use store::{AppendStats, DuplicatePolicy, ResultSet, Store};

use crate::fetcher::{Sleep, Transport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub fetched: usize,
    pub stored: AppendStats,
}

impl IngestReport {
    pub fn saved(&self) -> usize {
        self.stored.inserted + self.stored.updated
    }
}

/// Search, normalize and store one batch. Runs to completion on the calling
/// thread; a failure leaves the store unchanged.
pub fn ingest<T: Transport, S: Sleep>(
    fetcher: &Fetcher<T, S>,
    store: &mut Store,
    query: &str,
    max_results: Option<u32>,
) -> Result<IngestReport> {
    let limit = max_results.unwrap_or(fetcher.settings().max_results);
    let items = fetcher.fetch_with_limit(query, limit)?;
    if items.is_empty() {
        log::info!("no books found for query=\"{}\"", query);
        return Ok(IngestReport::default());
    }

    let records = transform::transform(&items);
    let stored = store.append(&records)?;
    log::info!(
        "ingested query=\"{}\" fetched={} inserted={} updated={}",
        query,
        items.len(),
        stored.inserted,
        stored.updated
    );
    Ok(IngestReport {
        fetched: items.len(),
        stored,
    })
}
