//! Streaming risk pipeline.
//!
//! Main loop that coordinates:
//! - Ingestion of transaction records
//! - Optional pass-through of every record to a downstream consumer
//! - Key-partitioned dispatch to parallel scoring lanes
//! - Command processing (stop)
//!
//! ```text
//! ingest ──▶ dispatcher ──┬─▶ forward queue ──▶ forwarder ──▶ pass-through
//!                         └─▶ score queue ──▶ router ──▶ lane[i] ──▶ alerts
//! ```
//!
//! The forward and score queues each hold up to `ingest_capacity` records,
//! so a slow scorer does not hold back pass-through delivery (and the other
//! way round) until its own queue is full.
//!
//! Records sharing a key are always scored by the same lane, so their alerts
//! are emitted in ingestion order. No ordering holds across keys.

use crate::config::PipelineConfig;
use crate::error::{RiskError, RiskResult};
use crate::scorer::{RiskScorer, ScoreOutcome};
use payguard_types::StreamRecord;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Commands accepted by a running pipeline.
#[derive(Debug)]
pub enum PipelineCommand {
    /// Stop accepting records, finish the ones already ingested, then exit.
    /// Output sends that would block after this point are abandoned.
    Stop,
}

/// Running totals, shared between the pipeline and its handles.
#[derive(Debug, Default)]
pub struct PipelineStats {
    records_seen: AtomicU64,
    records_scored: AtomicU64,
    alerts_emitted: AtomicU64,
    alerts_abandoned: AtomicU64,
    records_dropped: AtomicU64,
    records_forwarded: AtomicU64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_seen: self.records_seen.load(Ordering::Relaxed),
            records_scored: self.records_scored.load(Ordering::Relaxed),
            alerts_emitted: self.alerts_emitted.load(Ordering::Relaxed),
            alerts_abandoned: self.alerts_abandoned.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            records_forwarded: self.records_forwarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineStats`].
///
/// `records_scored` counts every record a lane finished with, including the
/// dropped ones. `alerts_abandoned` counts alerts raised after a stop that
/// the alert consumer was not ready to take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub records_seen: u64,
    pub records_scored: u64,
    pub alerts_emitted: u64,
    pub alerts_abandoned: u64,
    pub records_dropped: u64,
    pub records_forwarded: u64,
}

/// Handle for sending commands to the pipeline.
#[derive(Clone, Debug)]
pub struct RiskPipelineHandle {
    command_tx: mpsc::Sender<PipelineCommand>,
    stats: Arc<PipelineStats>,
}

impl RiskPipelineHandle {
    pub async fn stop(&self) -> RiskResult<()> {
        self.command_tx
            .send(PipelineCommand::Stop)
            .await
            .map_err(|_| RiskError::ChannelClosed)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// True once the pipeline loop has exited.
    pub fn is_stopped(&self) -> bool {
        self.command_tx.is_closed()
    }
}

/// The risk pipeline. Drive it with [`RiskPipeline::run`].
pub struct RiskPipeline {
    config: PipelineConfig,
    scorer: Arc<RiskScorer>,
    command_rx: mpsc::Receiver<PipelineCommand>,
    inbound_rx: mpsc::Receiver<StreamRecord>,
    /// Handed to the lanes when the pipeline starts.
    alert_tx: Option<mpsc::Sender<StreamRecord>>,
    /// Handed to the forwarder when the pipeline starts.
    passthrough_tx: Option<mpsc::Sender<StreamRecord>>,
    shutdown_tx: watch::Sender<bool>,
    stopping: bool,
    stats: Arc<PipelineStats>,
}

/// Creates a risk pipeline, its command handle, and the ingestion sender.
///
/// Alerts are produced to `alert_tx` on the configured alert topic. When
/// `passthrough_tx` is given, every ingested record is also forwarded there
/// unchanged.
pub fn create_risk_pipeline(
    config: PipelineConfig,
    scorer: Arc<RiskScorer>,
    alert_tx: mpsc::Sender<StreamRecord>,
    passthrough_tx: Option<mpsc::Sender<StreamRecord>>,
) -> RiskResult<(RiskPipelineHandle, mpsc::Sender<StreamRecord>, RiskPipeline)> {
    config.validate()?;

    let (command_tx, command_rx) = mpsc::channel(16);
    let (inbound_tx, inbound_rx) = mpsc::channel(config.ingest_capacity);
    let (shutdown_tx, _) = watch::channel(false);
    let stats = Arc::new(PipelineStats::default());

    let handle = RiskPipelineHandle {
        command_tx,
        stats: stats.clone(),
    };

    let pipeline = RiskPipeline {
        config,
        scorer,
        command_rx,
        inbound_rx,
        alert_tx: Some(alert_tx),
        passthrough_tx,
        shutdown_tx,
        stopping: false,
        stats,
    };

    Ok((handle, inbound_tx, pipeline))
}

/// Lane index for a partition key.
pub fn lane_for_key(key: &str, lanes: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % lanes.max(1) as u64) as usize
}

impl RiskPipeline {
    /// Runs the pipeline until stopped or until every ingestion sender is
    /// dropped. Returns the final totals.
    pub async fn run(mut self) -> StatsSnapshot {
        info!(
            "risk pipeline started on {} with {} lanes, rule {}",
            self.config.ingest_topic,
            self.config.lanes,
            self.scorer.rule_name()
        );

        let mut tasks = JoinSet::new();

        let mut lane_txs = Vec::with_capacity(self.config.lanes);
        if let Some(alert_tx) = self.alert_tx.take() {
            for lane in 0..self.config.lanes {
                let (tx, rx) = mpsc::channel(self.config.lane_capacity);
                lane_txs.push(tx);
                tasks.spawn(run_lane(
                    lane,
                    rx,
                    self.scorer.clone(),
                    alert_tx.clone(),
                    self.config.alert_topic.clone(),
                    self.shutdown_tx.subscribe(),
                    self.stats.clone(),
                ));
            }
        }

        let (score_tx, score_rx) = mpsc::channel(self.config.ingest_capacity);
        tasks.spawn(run_router(score_rx, lane_txs));

        let forward_tx = self.passthrough_tx.take().map(|passthrough_tx| {
            let (tx, rx) = mpsc::channel(self.config.ingest_capacity);
            tasks.spawn(run_forwarder(
                rx,
                passthrough_tx,
                self.shutdown_tx.subscribe(),
                self.stats.clone(),
            ));
            tx
        });

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv(), if !self.stopping => {
                    self.begin_stop(cmd);
                }
                record = self.inbound_rx.recv() => {
                    let Some(record) = record else {
                        info!("ingestion drained, stopping risk pipeline");
                        break;
                    };
                    if let Err(e) = self.dispatch(record, forward_tx.as_ref(), &score_tx).await {
                        error!("dispatch failed: {e}");
                        break;
                    }
                }
            }
        }

        drop(forward_tx);
        drop(score_tx);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("pipeline task failed: {e}");
            }
        }

        let totals = self.stats.snapshot();
        info!(
            "risk pipeline stopped: {} seen, {} scored, {} alerts, {} dropped",
            totals.records_seen,
            totals.records_scored,
            totals.alerts_emitted,
            totals.records_dropped
        );
        totals
    }

    /// Closes ingestion and tells downstream tasks to stop waiting on
    /// consumers. Records already buffered in the ingestion channel are
    /// still dispatched.
    fn begin_stop(&mut self, cmd: Option<PipelineCommand>) {
        match cmd {
            Some(PipelineCommand::Stop) => info!("risk pipeline stopping"),
            None => info!("command channel closed, stopping risk pipeline"),
        }
        self.stopping = true;
        self.inbound_rx.close();
        self.shutdown_tx.send_replace(true);
    }

    async fn dispatch(
        &mut self,
        record: StreamRecord,
        forward_tx: Option<&mpsc::Sender<StreamRecord>>,
        score_tx: &mpsc::Sender<StreamRecord>,
    ) -> RiskResult<()> {
        self.stats.records_seen.fetch_add(1, Ordering::Relaxed);

        if let Some(forward_tx) = forward_tx {
            match self.reserve(forward_tx).await {
                Some(permit) => permit.send(record.clone()),
                None => warn!("pass-through forwarder gone, record not forwarded"),
            }
        }

        let permit = self.reserve(score_tx).await.ok_or(RiskError::ChannelClosed)?;
        permit.send(record);
        Ok(())
    }

    /// Waits for queue space while still answering a stop command.
    async fn reserve<'a>(
        &mut self,
        tx: &'a mpsc::Sender<StreamRecord>,
    ) -> Option<mpsc::Permit<'a, StreamRecord>> {
        if !self.stopping {
            tokio::select! {
                biased;

                permit = tx.reserve() => return permit.ok(),
                cmd = self.command_rx.recv() => self.begin_stop(cmd),
            }
        }
        tx.reserve().await.ok()
    }
}

enum Delivery {
    Sent,
    Closed,
    Abandoned,
}

/// Sends to a downstream consumer. Once a stop is requested, a send that
/// cannot complete immediately is abandoned.
async fn deliver(
    tx: &mpsc::Sender<StreamRecord>,
    record: StreamRecord,
    shutdown: &mut watch::Receiver<bool>,
) -> Delivery {
    let record = match tx.try_send(record) {
        Ok(()) => return Delivery::Sent,
        Err(TrySendError::Closed(_)) => return Delivery::Closed,
        Err(TrySendError::Full(record)) => record,
    };

    tokio::select! {
        biased;

        sent = tx.send(record) => {
            if sent.is_ok() { Delivery::Sent } else { Delivery::Closed }
        }
        _ = stop_requested(shutdown) => Delivery::Abandoned,
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        let stopping = *shutdown.borrow_and_update();
        if stopping {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn run_forwarder(
    mut rx: mpsc::Receiver<StreamRecord>,
    passthrough_tx: mpsc::Sender<StreamRecord>,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<PipelineStats>,
) {
    let mut open = true;

    // Keep draining after the consumer is gone so the dispatcher never blocks.
    while let Some(record) = rx.recv().await {
        if !open {
            continue;
        }
        match deliver(&passthrough_tx, record, &mut shutdown).await {
            Delivery::Sent => {
                stats.records_forwarded.fetch_add(1, Ordering::Relaxed);
            }
            Delivery::Closed => {
                warn!("pass-through consumer gone, forwarding disabled");
                open = false;
            }
            Delivery::Abandoned => {
                debug!("pass-through consumer not ready after stop, record not forwarded");
            }
        }
    }
}

async fn run_router(
    mut rx: mpsc::Receiver<StreamRecord>,
    lane_txs: Vec<mpsc::Sender<StreamRecord>>,
) {
    while let Some(record) = rx.recv().await {
        let lane = lane_for_key(&record.key, lane_txs.len());
        let Some(lane_tx) = lane_txs.get(lane) else {
            error!("no scoring lane {lane}");
            break;
        };
        if lane_tx.send(record).await.is_err() {
            error!("scoring lane {lane} closed");
            break;
        }
    }
}

async fn run_lane(
    lane: usize,
    mut rx: mpsc::Receiver<StreamRecord>,
    scorer: Arc<RiskScorer>,
    alert_tx: mpsc::Sender<StreamRecord>,
    alert_topic: String,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<PipelineStats>,
) {
    debug!("scoring lane {lane} started");
    let mut alerts_open = true;

    while let Some(record) = rx.recv().await {
        match scorer.score(&record) {
            ScoreOutcome::Alert(alert) if alerts_open => match alert.to_json() {
                Ok(json) => {
                    let out = StreamRecord::new(alert_topic.as_str(), record.key.as_str(), json);
                    match deliver(&alert_tx, out, &mut shutdown).await {
                        Delivery::Sent => {
                            stats.alerts_emitted.fetch_add(1, Ordering::Relaxed);
                        }
                        Delivery::Closed => {
                            warn!("alert consumer gone, lane {lane} discarding alerts");
                            alerts_open = false;
                        }
                        Delivery::Abandoned => {
                            stats.alerts_abandoned.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                Err(e) => error!("alert serialization failed: {e}"),
            },
            ScoreOutcome::Alert(_) | ScoreOutcome::NoAlert => {}
            ScoreOutcome::Dropped => {
                stats.records_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        stats.records_scored.fetch_add(1, Ordering::Relaxed);
    }

    debug!("scoring lane {lane} finished");
}
