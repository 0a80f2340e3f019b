//! Batched order-book fetching with bounded retry

use std::time::Duration;

use futures_util::future::join_all;
use rand::Rng;
use tracing::{debug, info, warn};

use super::snapshot::PriceBook;
use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::sources::{MarketOrder, OrderBookSource};

pub struct BatchFetcher<'a, S: OrderBookSource> {
    source: &'a S,
    config: FetchConfig,
}

impl<'a, S: OrderBookSource> BatchFetcher<'a, S> {
    pub fn new(source: &'a S, config: FetchConfig) -> Self {
        Self { source, config }
    }

    /// Fetch every item's order book and keep the cheapest price per (item, quality).
    ///
    /// Items that exhaust their per-item attempts are retried in later rounds with
    /// exponential backoff. Items still failing after `max_retry_rounds` fail the run.
    pub async fn fetch_all(&self, realm: u32, item_ids: &[u32]) -> Result<PriceBook> {
        let mut book = PriceBook::default();

        let mut pending = self.run_pass(realm, item_ids, &mut book).await;
        let mut round = 0;

        while !pending.is_empty() {
            if round >= self.config.max_retry_rounds {
                return Err(Error::RetriesExhausted(pending));
            }

            let delay = self.backoff(round);
            warn!(
                "Retry round {}/{}: {} items after {:?}",
                round + 1,
                self.config.max_retry_rounds,
                pending.len(),
                delay
            );
            tokio::time::sleep(delay).await;

            pending = self.run_pass(realm, &pending, &mut book).await;
            round += 1;
        }

        info!("Realm {}: collected {} price records", realm, book.len());
        Ok(book)
    }

    /// One pass over `item_ids` in concurrent batches. Returns the items that failed.
    async fn run_pass(&self, realm: u32, item_ids: &[u32], book: &mut PriceBook) -> Vec<u32> {
        let mut failed = Vec::new();
        let batch_size = self.config.batch_size.max(1);
        let total = item_ids.len();
        let mut done = 0;

        for batch in item_ids.chunks(batch_size) {
            let results = join_all(batch.iter().map(|&item_id| async move {
                (item_id, self.fetch_with_retry(realm, item_id).await)
            }))
            .await;

            for (item_id, result) in results {
                match result {
                    Ok(orders) => {
                        debug!("Item {}: {} orders", item_id, orders.len());
                        book.observe_orders(&orders);
                    }
                    Err(e) => {
                        warn!("Item {} failed: {}", item_id, e);
                        failed.push(item_id);
                    }
                }
            }

            done += batch.len();
            info!("Progress: {}/{} items", done, total);
        }

        failed
    }

    async fn fetch_with_retry(&self, realm: u32, item_id: u32) -> Result<Vec<MarketOrder>> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.source.fetch_orders(realm, item_id).await {
                Ok(orders) => break Ok(orders),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    debug!(
                        "Item {} attempt {}/{} failed: {}",
                        item_id, attempt, max_attempts, e
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        }
    }

    fn backoff(&self, round: u32) -> Duration {
        let base = self.config.retry_delay.as_millis() as u64;
        let exp = base.saturating_mul(1u64 << round.min(16));
        let capped = exp.min(self.config.max_backoff.as_millis() as u64);
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        Duration::from_millis(capped + jitter)
    }
}
