use payguard_risk::{
    create_risk_pipeline, lane_for_key, PipelineConfig, RiskError, RiskScorer, StatsSnapshot,
};
use payguard_types::{AlertEvent, StreamRecord};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("payguard_risk=debug"))
        .with_test_writer()
        .try_init();
}

fn scorer() -> Arc<RiskScorer> {
    Arc::new(RiskScorer::new().unwrap())
}

fn tx(key: &str, id: &str, amount: f64) -> StreamRecord {
    StreamRecord::new(
        "transactions",
        key,
        format!(r#"{{"transactionId":"{id}","amount":{amount}}}"#),
    )
}

async fn drain(rx: &mut mpsc::Receiver<StreamRecord>) -> Vec<StreamRecord> {
    let mut out = Vec::new();
    while let Ok(Some(record)) = timeout(WAIT, rx.recv()).await {
        out.push(record);
    }
    out
}

#[tokio::test]
async fn alerts_only_for_high_value_records() {
    init_tracing();
    let (alert_tx, mut alert_rx) = mpsc::channel(16);
    let (handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, None).unwrap();
    let task = tokio::spawn(pipeline.run());

    ingest.send(tx("acct-1", "tx-1", 15000.0)).await.unwrap();
    ingest.send(tx("acct-2", "tx-2", 9999.99)).await.unwrap();
    ingest.send(tx("acct-3", "tx-3", 10000.0)).await.unwrap();
    drop(ingest);

    let totals = timeout(WAIT, task).await.unwrap().unwrap();
    let alerts = drain(&mut alert_rx).await;

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].topic, "risk-alerts");
    assert_eq!(alerts[0].key, "acct-1");
    let alert: AlertEvent = serde_json::from_str(alerts[0].value.as_deref().unwrap()).unwrap();
    assert_eq!(alert, AlertEvent::high_value(15000.0, Some("tx-1".to_string())));

    assert_eq!(
        totals,
        StatsSnapshot {
            records_seen: 3,
            records_scored: 3,
            alerts_emitted: 1,
            alerts_abandoned: 0,
            records_dropped: 0,
            records_forwarded: 0,
        }
    );
    assert_eq!(handle.stats(), totals);
}

#[tokio::test]
async fn malformed_records_are_dropped_and_stream_continues() {
    init_tracing();
    let (alert_tx, mut alert_rx) = mpsc::channel(16);
    let (_handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, None).unwrap();
    let task = tokio::spawn(pipeline.run());

    ingest.send(StreamRecord::new("transactions", "acct-1", "{not json")).await.unwrap();
    ingest.send(StreamRecord::tombstone("transactions", "acct-1")).await.unwrap();
    ingest.send(tx("acct-1", "tx-9", 20000.0)).await.unwrap();
    drop(ingest);

    let totals = timeout(WAIT, task).await.unwrap().unwrap();
    let alerts = drain(&mut alert_rx).await;

    assert_eq!(alerts.len(), 1);
    assert_eq!(totals.records_dropped, 2);
    assert_eq!(totals.records_scored, 3);
}

#[tokio::test]
async fn same_key_alerts_keep_ingestion_order() {
    init_tracing();
    let config = PipelineConfig {
        lanes: 4,
        ..Default::default()
    };
    let (alert_tx, mut alert_rx) = mpsc::channel(256);
    let (_handle, ingest, pipeline) =
        create_risk_pipeline(config, scorer(), alert_tx, None).unwrap();
    let task = tokio::spawn(pipeline.run());

    for i in 0..50 {
        ingest
            .send(tx("acct-ordered", &format!("tx-{i}"), 20000.0 + i as f64))
            .await
            .unwrap();
        ingest
            .send(tx(&format!("acct-noise-{i}"), &format!("noise-{i}"), 50000.0))
            .await
            .unwrap();
    }
    drop(ingest);
    timeout(WAIT, task).await.unwrap().unwrap();

    let ordered: Vec<String> = drain(&mut alert_rx)
        .await
        .into_iter()
        .filter(|r| r.key == "acct-ordered")
        .map(|r| {
            let alert: AlertEvent = serde_json::from_str(r.value.as_deref().unwrap()).unwrap();
            alert.event_id.unwrap()
        })
        .collect();
    let expected: Vec<String> = (0..50).map(|i| format!("tx-{i}")).collect();
    assert_eq!(ordered, expected);
}

#[tokio::test]
async fn passthrough_forwards_records_unchanged() {
    init_tracing();
    let (alert_tx, mut alert_rx) = mpsc::channel(16);
    let (pass_tx, mut pass_rx) = mpsc::channel(16);
    let (_handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, Some(pass_tx))
            .unwrap();
    let task = tokio::spawn(pipeline.run());

    let sent = vec![
        tx("acct-1", "tx-1", 12000.0),
        StreamRecord::new("transactions", "acct-2", "garbage"),
        StreamRecord::tombstone("transactions", "acct-3"),
    ];
    for record in &sent {
        ingest.send(record.clone()).await.unwrap();
    }
    drop(ingest);

    let totals = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(drain(&mut pass_rx).await, sent);
    assert_eq!(drain(&mut alert_rx).await.len(), 1);
    assert_eq!(totals.records_forwarded, 3);
}

#[tokio::test]
async fn lost_passthrough_consumer_does_not_stop_scoring() {
    init_tracing();
    let (alert_tx, mut alert_rx) = mpsc::channel(16);
    let (pass_tx, pass_rx) = mpsc::channel(16);
    drop(pass_rx);
    let (_handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, Some(pass_tx))
            .unwrap();
    let task = tokio::spawn(pipeline.run());

    ingest.send(tx("acct-1", "tx-1", 12000.0)).await.unwrap();
    ingest.send(tx("acct-1", "tx-2", 13000.0)).await.unwrap();
    drop(ingest);

    let totals = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(drain(&mut alert_rx).await.len(), 2);
    assert_eq!(totals.records_forwarded, 0);
    assert_eq!(totals.alerts_emitted, 2);
}

#[tokio::test]
async fn ingestion_close_ends_pipeline_and_alert_stream() {
    init_tracing();
    let (alert_tx, mut alert_rx) = mpsc::channel(16);
    let (handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, None).unwrap();
    let task = tokio::spawn(pipeline.run());

    drop(ingest);
    timeout(WAIT, task).await.unwrap().unwrap();

    assert!(timeout(WAIT, alert_rx.recv()).await.unwrap().is_none());
    assert!(handle.is_stopped());
    assert!(matches!(handle.stop().await, Err(RiskError::ChannelClosed)));
}

#[tokio::test]
async fn stop_drains_dispatched_records() {
    init_tracing();
    let (alert_tx, mut alert_rx) = mpsc::channel(64);
    let (handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, None).unwrap();
    let task = tokio::spawn(pipeline.run());

    for i in 0..20 {
        ingest
            .send(tx(&format!("acct-{i}"), &format!("tx-{i}"), 11000.0))
            .await
            .unwrap();
    }

    handle.stop().await.unwrap();
    let totals = timeout(WAIT, task).await.unwrap().unwrap();

    assert_eq!(totals.records_seen, 20);
    assert_eq!(totals.records_seen, totals.records_scored);
    assert_eq!(totals.alerts_emitted, totals.records_seen);
    assert_eq!(drain(&mut alert_rx).await.len() as u64, totals.alerts_emitted);
    assert!(handle.is_stopped());
}

#[tokio::test]
async fn closed_alert_consumer_keeps_lanes_consuming() {
    init_tracing();
    let (alert_tx, alert_rx) = mpsc::channel(16);
    drop(alert_rx);
    let (_handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, None).unwrap();
    let task = tokio::spawn(pipeline.run());

    for i in 0..10 {
        ingest.send(tx("acct-1", &format!("tx-{i}"), 30000.0)).await.unwrap();
    }
    drop(ingest);

    let totals = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(totals.records_scored, 10);
    assert_eq!(totals.alerts_emitted, 0);
}

#[tokio::test]
async fn stalled_alert_consumer_blocks_neither_passthrough_nor_stop() {
    init_tracing();
    let config = PipelineConfig {
        lanes: 1,
        lane_capacity: 1,
        ..Default::default()
    };
    // Held for the whole test and never read.
    let (alert_tx, _alert_rx) = mpsc::channel(1);
    let (pass_tx, mut pass_rx) = mpsc::channel(64);
    let (handle, ingest, pipeline) =
        create_risk_pipeline(config, scorer(), alert_tx, Some(pass_tx)).unwrap();
    let task = tokio::spawn(pipeline.run());

    for i in 0..10 {
        ingest
            .send(tx("acct-1", &format!("tx-{i}"), 25000.0))
            .await
            .unwrap();
    }

    for i in 0..10 {
        let forwarded = timeout(WAIT, pass_rx.recv()).await.unwrap().unwrap();
        assert_eq!(forwarded.key, "acct-1");
        assert!(forwarded.value.unwrap().contains(&format!("\"tx-{i}\"")));
    }

    handle.stop().await.unwrap();
    let totals = timeout(WAIT, task).await.unwrap().unwrap();

    assert_eq!(totals.records_seen, 10);
    assert_eq!(totals.records_scored, 10);
    assert_eq!(totals.records_forwarded, 10);
    assert_eq!(totals.alerts_emitted, 1);
    assert_eq!(totals.alerts_abandoned, 9);
    assert!(handle.is_stopped());
}

#[tokio::test]
async fn stalled_passthrough_consumer_does_not_hold_back_alerts() {
    init_tracing();
    let (alert_tx, mut alert_rx) = mpsc::channel(16);
    // Held for the whole test and never read.
    let (pass_tx, _pass_rx) = mpsc::channel(1);
    let (handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, Some(pass_tx))
            .unwrap();
    let task = tokio::spawn(pipeline.run());

    for i in 0..5 {
        ingest
            .send(tx(&format!("acct-{i}"), &format!("tx-{i}"), 40000.0))
            .await
            .unwrap();
    }

    for _ in 0..5 {
        let alert = timeout(WAIT, alert_rx.recv()).await.unwrap().unwrap();
        assert_eq!(alert.topic, "risk-alerts");
    }

    handle.stop().await.unwrap();
    let totals = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(totals.alerts_emitted, 5);
    assert_eq!(totals.records_forwarded, 1);
}

#[tokio::test]
async fn stop_rejects_further_ingestion() {
    init_tracing();
    let (alert_tx, _alert_rx) = mpsc::channel(16);
    let (handle, ingest, pipeline) =
        create_risk_pipeline(PipelineConfig::default(), scorer(), alert_tx, None).unwrap();
    let task = tokio::spawn(pipeline.run());

    handle.stop().await.unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();

    assert!(ingest.send(tx("acct-1", "tx-late", 50000.0)).await.is_err());
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let (alert_tx, _alert_rx) = mpsc::channel(1);
    let config = PipelineConfig {
        lanes: 0,
        ..Default::default()
    };
    let result = create_risk_pipeline(config, scorer(), alert_tx, None);
    assert!(matches!(result, Err(RiskError::Config(_))));
}

#[test]
fn lane_for_key_stays_in_range() {
    for lanes in 1..8 {
        for i in 0..100 {
            assert!(lane_for_key(&format!("acct-{i}"), lanes) < lanes);
        }
    }
}
