//! Core watcher service - orchestrates ingestion passes.
//!
//! An ingestion pass resolves the target height range against the chain
//! head, walks it block-by-block, records transactions touching
//! subscribed addresses, and advances the cursor strictly after each
//! block's transactions are durably recorded. Passes are safe to re-run
//! after partial failure.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, trace};

use crate::error::{WatcherError, WatcherResult};
use crate::metrics::{
    record_block_ingested, record_pass_completed, record_pass_error,
    record_transactions_recorded, PassTimer,
};
use crate::models::{height, Transaction};
use crate::ports::{BlockRef, ChainGateway, RawBlock, RawTransaction, Stores};

// =============================================================================
// Pass Summary
// =============================================================================

/// Outcome of a completed ingestion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// First height walked (the cursor at pass start, or the observed
    /// head on a first run).
    pub from: u64,
    /// Last height walked (the head observed at pass start).
    pub to: u64,
    /// Number of queue entries recorded during the pass.
    pub recorded: u64,
}

// =============================================================================
// WatcherService
// =============================================================================

/// Main watcher service.
///
/// # Design
///
/// The service is the only writer of the cursor and the only producer
/// into the ledger's queues. The subscription and drain surface may be
/// called at any time, concurrently with an in-progress pass.
///
/// # Flow (per pass)
///
/// 1. Fetch the block tagged "latest" and parse its height
/// 2. Resolve the starting height: the cursor, or the head on first run
/// 3. Walk the range ascending; record matching transactions per block
/// 4. Advance the cursor after each fully recorded block
/// 5. Abort the whole pass on any failure - the cursor stays at the last
///    completed height, so the next pass retries the failed block
pub struct WatcherService<G: ChainGateway, S: Stores> {
    gateway: Arc<G>,
    stores: Arc<S>,
    shutdown_rx: watch::Receiver<bool>,
    /// Serializes pass bodies so concurrent invocations cannot race on
    /// the cursor.
    pass_lock: Mutex<()>,
}

impl<G: ChainGateway, S: Stores> WatcherService<G, S> {
    pub fn new(gateway: Arc<G>, stores: Arc<S>, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            gateway,
            stores,
            shutdown_rx,
            pass_lock: Mutex::new(()),
        }
    }

    // -------------------------------------------------------------------------
    // Ingestion
    // -------------------------------------------------------------------------

    /// Run one ingestion pass from the cursor through the chain head.
    ///
    /// Holds the pass lock for the duration; a concurrent invocation
    /// blocks until the prior pass completes.
    #[instrument(skip_all)]
    pub async fn run_pass(&self) -> WatcherResult<PassSummary> {
        let _pass = self.pass_lock.lock().await;
        let _timer = PassTimer::new();

        match self.walk_to_head().await {
            Ok(summary) => {
                record_pass_completed();
                Ok(summary)
            }
            Err(e) => {
                record_pass_error();
                Err(e)
            }
        }
    }

    async fn walk_to_head(&self) -> WatcherResult<PassSummary> {
        let head = self.fetch(BlockRef::Latest).await?;
        let latest = height::parse_hex(&head.number)?;

        // The cursor height is walked again on purpose: a pass may have
        // died between recording that block and observing a new head, and
        // per-address dedup makes the re-walk harmless.
        let start = match self.stores.cursor().current_height().await? {
            Some(h) => h,
            None => {
                debug!(latest, "Cursor not set, starting at observed head");
                latest
            }
        };

        let mut recorded = 0;
        for number in start..=latest {
            if *self.shutdown_rx.borrow() {
                debug!(block = number, "Shutdown requested, stopping pass");
                return Err(WatcherError::ShutdownRequested);
            }

            recorded += self.ingest_block(number).await?;
            self.stores.cursor().set_current_height(number).await?;
            record_block_ingested();
        }

        info!(from = start, to = latest, recorded, "Ingestion pass complete");
        Ok(PassSummary {
            from: start,
            to: latest,
            recorded,
        })
    }

    /// Fetch one block, filter its transactions by subscription
    /// membership, and record the matches. Returns the number of queue
    /// entries recorded.
    #[instrument(skip(self))]
    async fn ingest_block(&self, number: u64) -> WatcherResult<u64> {
        let block = self.fetch(BlockRef::Number(number)).await?;

        let mut recorded = 0;
        for tx in &block.transactions {
            for address in endpoints(tx) {
                if !self.stores.addresses().is_subscribed(address).await? {
                    continue;
                }

                if self
                    .stores
                    .ledger()
                    .record_unique(address, to_transaction(tx))
                    .await?
                {
                    recorded += 1;
                    trace!(address, hash = %tx.hash, "Transaction recorded");
                }
            }
        }

        record_transactions_recorded(recorded);
        trace!(transactions = block.transactions.len(), recorded, "Block processed");
        Ok(recorded)
    }

    async fn fetch(&self, block: BlockRef) -> WatcherResult<RawBlock> {
        self.gateway
            .fetch_block(block)
            .await
            .map_err(|source| WatcherError::BlockFetch {
                block: block.to_string(),
                source,
            })
    }

    // -------------------------------------------------------------------------
    // Consumer surface
    // -------------------------------------------------------------------------

    /// Subscribe an address. Returns `true` if it was newly added.
    pub async fn subscribe(&self, address: &str) -> WatcherResult<bool> {
        let added = self.stores.addresses().subscribe(address).await?;
        if added {
            info!(address, "Address subscribed");
        } else {
            debug!(address, "Address already subscribed");
        }
        Ok(added)
    }

    /// Whether an address is in the subscription set.
    pub async fn is_subscribed(&self, address: &str) -> WatcherResult<bool> {
        Ok(self.stores.addresses().is_subscribed(address).await?)
    }

    /// The last fully-ingested height, or 0 if nothing has been ingested.
    ///
    /// Callers that must tell genesis apart from "never ingested" should
    /// query the cursor store directly.
    pub async fn current_height(&self) -> WatcherResult<u64> {
        Ok(self.stores.cursor().current_height().await?.unwrap_or(0))
    }

    /// Drain the queued transactions for an address, in insertion order.
    ///
    /// Destructive: an immediate second call returns an empty sequence.
    pub async fn drain_transactions(&self, address: &str) -> WatcherResult<Vec<Transaction>> {
        Ok(self.stores.ledger().drain(address).await?)
    }
}

/// The addressable endpoints of a raw transaction: sender, then
/// recipient when one exists (contract creation has none).
fn endpoints(tx: &RawTransaction) -> impl Iterator<Item = &str> {
    [Some(tx.from.as_str()), tx.to.as_deref()]
        .into_iter()
        .flatten()
}

/// Transform a raw transaction into the domain model.
fn to_transaction(raw: &RawTransaction) -> Transaction {
    Transaction {
        hash: raw.hash.clone(),
        from: raw.from.clone(),
        to: raw.to.clone(),
        value: raw.value.clone(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use lookout_storage::MemStores;

    use crate::error::{ChainError, ChainResult};

    /// Gateway double serving a fixed chain. `Latest` resolves to a
    /// header-only block at the scripted head height.
    struct ScriptedGateway {
        latest: u64,
        blocks: HashMap<u64, RawBlock>,
        failing: StdMutex<HashSet<u64>>,
        head_number: Option<String>,
    }

    impl ScriptedGateway {
        fn new(latest: u64, blocks: Vec<RawBlock>) -> Self {
            let blocks = blocks
                .into_iter()
                .map(|b| (height::parse_hex(&b.number).unwrap(), b))
                .collect();
            Self {
                latest,
                blocks,
                failing: StdMutex::new(HashSet::new()),
                head_number: None,
            }
        }

        fn with_head_number(mut self, number: &str) -> Self {
            self.head_number = Some(number.to_string());
            self
        }

        fn fail_at(&self, number: u64) {
            self.failing.lock().unwrap().insert(number);
        }

        fn heal(&self, number: u64) {
            self.failing.lock().unwrap().remove(&number);
        }
    }

    #[async_trait]
    impl ChainGateway for ScriptedGateway {
        async fn fetch_block(&self, block: BlockRef) -> ChainResult<RawBlock> {
            let number = match block {
                BlockRef::Latest => {
                    if let Some(n) = &self.head_number {
                        return Ok(RawBlock {
                            number: n.clone(),
                            transactions: vec![],
                        });
                    }
                    return Ok(RawBlock {
                        number: height::format_hex(self.latest),
                        transactions: vec![],
                    });
                }
                BlockRef::Number(n) => n,
            };

            if self.failing.lock().unwrap().contains(&number) {
                return Err(ChainError::Transport("connection reset".into()));
            }

            self.blocks
                .get(&number)
                .cloned()
                .ok_or_else(|| ChainError::InvalidResponse(format!("no block at {number}")))
        }
    }

    fn raw_tx(hash: &str, from: &str, to: Option<&str>) -> RawTransaction {
        RawTransaction {
            hash: hash.into(),
            from: from.into(),
            to: to.map(Into::into),
            value: "0xde0b6b3a7640000".into(),
        }
    }

    fn raw_block(number: u64, transactions: Vec<RawTransaction>) -> RawBlock {
        RawBlock {
            number: height::format_hex(number),
            transactions,
        }
    }

    fn service(
        gateway: ScriptedGateway,
    ) -> (
        WatcherService<ScriptedGateway, MemStores>,
        Arc<MemStores>,
        watch::Sender<bool>,
    ) {
        let stores = Arc::new(MemStores::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let svc = WatcherService::new(Arc::new(gateway), stores.clone(), shutdown_rx);
        (svc, stores, shutdown_tx)
    }

    // Scénario de bout en bout: deux transactions dans le bloc de tête,
    // une seule adresse abonnée des deux côtés
    #[tokio::test]
    async fn first_pass_ingests_head_block_for_subscribed_address() {
        let gateway = ScriptedGateway::new(
            2,
            vec![raw_block(
                2,
                vec![
                    raw_tx("0x1", "a1", Some("a2")),
                    raw_tx("0x2", "a2", Some("a3")),
                ],
            )],
        );
        let (svc, _, _tx) = service(gateway);

        assert!(svc.subscribe("a2").await.unwrap());

        let summary = svc.run_pass().await.unwrap();
        assert_eq!(summary, PassSummary { from: 2, to: 2, recorded: 2 });
        assert_eq!(svc.current_height().await.unwrap(), 2);

        let drained = svc.drain_transactions("a2").await.unwrap();
        assert_eq!(drained.len(), 2);
        // Drain order matches block order
        assert_eq!(drained[0].hash, "0x1");
        assert_eq!(drained[1].hash, "0x2");

        assert!(svc.drain_transactions("a1").await.unwrap().is_empty());
        assert!(svc.drain_transactions("a3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_block_aborts_pass_and_retry_resumes_at_cursor() {
        let gateway = ScriptedGateway::new(
            7,
            vec![
                raw_block(5, vec![raw_tx("0x5", "a1", Some("a2"))]),
                raw_block(6, vec![raw_tx("0x6", "a2", Some("a3"))]),
                raw_block(7, vec![]),
            ],
        );
        gateway.fail_at(6);
        let (svc, stores, _tx) = service(gateway);

        svc.subscribe("a2").await.unwrap();
        stores.cursor().set_current_height(5).await.unwrap();

        let err = svc.run_pass().await.unwrap_err();
        assert!(matches!(err, WatcherError::BlockFetch { .. }));
        // Cursor untouched by the failed pass
        assert_eq!(svc.current_height().await.unwrap(), 5);
        assert_eq!(stores.cursor().current_height().await.unwrap(), Some(5));

        // Next pass resumes at 5, re-walks it (deduped), then finishes
        svc.gateway.heal(6);
        let summary = svc.run_pass().await.unwrap();
        assert_eq!(summary.from, 5);
        assert_eq!(summary.to, 7);
        assert_eq!(svc.current_height().await.unwrap(), 7);

        let drained = svc.drain_transactions("a2").await.unwrap();
        let hashes: Vec<_> = drained.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["0x5", "0x6"]);
    }

    #[tokio::test]
    async fn duplicate_hash_across_blocks_is_recorded_once() {
        let gateway = ScriptedGateway::new(
            2,
            vec![
                raw_block(1, vec![raw_tx("0xdup", "a1", Some("a2"))]),
                raw_block(2, vec![raw_tx("0xdup", "a1", Some("a2"))]),
            ],
        );
        let (svc, stores, _tx) = service(gateway);

        svc.subscribe("a2").await.unwrap();
        stores.cursor().set_current_height(1).await.unwrap();

        svc.run_pass().await.unwrap();

        let drained = svc.drain_transactions("a2").await.unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].hash, "0xdup");
    }

    #[tokio::test]
    async fn rewalking_head_block_records_nothing_new() {
        let gateway = ScriptedGateway::new(
            3,
            vec![raw_block(3, vec![raw_tx("0x1", "a1", Some("a2"))])],
        );
        let (svc, _, _tx) = service(gateway);

        svc.subscribe("a2").await.unwrap();

        let first = svc.run_pass().await.unwrap();
        assert_eq!(first.recorded, 1);

        // Head has not advanced: the pass re-walks block 3 only
        let second = svc.run_pass().await.unwrap();
        assert_eq!(second, PassSummary { from: 3, to: 3, recorded: 0 });
        assert_eq!(svc.drain_transactions("a2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn contract_creation_is_never_attributed_on_the_to_side() {
        let gateway = ScriptedGateway::new(
            1,
            vec![raw_block(
                1,
                vec![
                    raw_tx("0x1", "a1", None),
                    raw_tx("0x2", "a9", None),
                ],
            )],
        );
        let (svc, _, _tx) = service(gateway);

        svc.subscribe("a1").await.unwrap();

        let summary = svc.run_pass().await.unwrap();
        assert_eq!(summary.recorded, 1);

        let drained = svc.drain_transactions("a1").await.unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].to, None);
    }

    #[tokio::test]
    async fn unsubscribed_endpoints_produce_no_queue_entries() {
        let gateway = ScriptedGateway::new(
            1,
            vec![raw_block(1, vec![raw_tx("0x1", "a1", Some("a2"))])],
        );
        let (svc, _, _tx) = service(gateway);

        let summary = svc.run_pass().await.unwrap();
        assert_eq!(summary.recorded, 0);
        assert!(svc.drain_transactions("a1").await.unwrap().is_empty());
        assert!(svc.drain_transactions("a2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transaction_touching_both_subscribed_endpoints_is_copied_to_each() {
        let gateway = ScriptedGateway::new(
            1,
            vec![raw_block(1, vec![raw_tx("0x1", "a1", Some("a2"))])],
        );
        let (svc, _, _tx) = service(gateway);

        svc.subscribe("a1").await.unwrap();
        svc.subscribe("a2").await.unwrap();

        let summary = svc.run_pass().await.unwrap();
        assert_eq!(summary.recorded, 2);

        // Independent copies, one per queue
        assert_eq!(svc.drain_transactions("a1").await.unwrap().len(), 1);
        assert_eq!(svc.drain_transactions("a2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unparsable_head_height_aborts_pass_with_cursor_untouched() {
        let gateway = ScriptedGateway::new(0, vec![]).with_head_number("not-hex");
        let (svc, stores, _tx) = service(gateway);

        let err = svc.run_pass().await.unwrap_err();
        assert!(matches!(err, WatcherError::Domain(_)));
        assert_eq!(stores.cursor().current_height().await.unwrap(), None);
    }

    #[tokio::test]
    async fn shutdown_signal_stops_pass_before_first_fetch() {
        let gateway = ScriptedGateway::new(
            1,
            vec![raw_block(1, vec![raw_tx("0x1", "a1", Some("a2"))])],
        );
        let (svc, stores, shutdown_tx) = service(gateway);

        svc.subscribe("a2").await.unwrap();
        shutdown_tx.send(true).unwrap();

        let err = svc.run_pass().await.unwrap_err();
        assert!(matches!(err, WatcherError::ShutdownRequested));
        // No block completed, cursor stays unset
        assert_eq!(stores.cursor().current_height().await.unwrap(), None);
        assert!(svc.drain_transactions("a2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribe_is_idempotent() {
        let gateway = ScriptedGateway::new(0, vec![raw_block(0, vec![])]);
        let (svc, _, _tx) = service(gateway);

        assert!(svc.subscribe("a1").await.unwrap());
        assert!(!svc.subscribe("a1").await.unwrap());
        assert!(svc.is_subscribed("a1").await.unwrap());
        assert!(!svc.is_subscribed("a2").await.unwrap());
    }

    #[tokio::test]
    async fn genesis_head_is_ingested_at_height_zero() {
        let gateway = ScriptedGateway::new(
            0,
            vec![raw_block(0, vec![raw_tx("0x1", "a1", Some("a2"))])],
        );
        let (svc, stores, _tx) = service(gateway);

        svc.subscribe("a1").await.unwrap();
        let summary = svc.run_pass().await.unwrap();
        assert_eq!(summary, PassSummary { from: 0, to: 0, recorded: 1 });

        // Cursor is genuinely set to 0, not "unset"
        assert_eq!(stores.cursor().current_height().await.unwrap(), Some(0));
    }
}
