use std::time::Duration;

use hostwatch::config::parse_agent_url;
use hostwatch::types::ServerEvent;
use hostwatch::ws::{connect, forward_events, Incoming};
use futures_util::StreamExt;

// Integration probe: only runs when HOSTWATCH_WS is set to an agent WebSocket URL.
// Example: HOSTWATCH_WS=ws://127.0.0.1:3000/ws cargo test -p hostwatch --test ws_probe -- --nocapture
#[tokio::test]
async fn probe_push_channel() {
    let url = match std::env::var("HOSTWATCH_WS") {
        Ok(v) if !v.is_empty() => v,
        _ => {
            eprintln!("skipping ws_probe: set HOSTWATCH_WS=ws://host:port/ws to run this integration test");
            return;
        }
    };
    let url = parse_agent_url(&url).expect("valid url");
    let ws = connect(&url).await.expect("connect ws");
    let (_sink, stream) = ws.split();
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    tokio::spawn(forward_events(stream, tx));

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("system_info within timeout");
    assert!(matches!(first, Some(Incoming::Event(ServerEvent::SystemInfo(_)))));

    let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("metrics within timeout");
    assert!(matches!(
        next,
        Some(Incoming::Event(ServerEvent::Metrics(_) | ServerEvent::MetricsError { .. }))
    ));
}
