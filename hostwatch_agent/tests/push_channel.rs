//! End-to-end push channel test against a live agent on an ephemeral port.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use hostwatch_agent::config::AgentConfig;
use hostwatch_agent::proto::{ServerEvent, START_TRACKING};
use hostwatch_agent::sensors::SyntheticSensors;
use hostwatch_agent::{build_state, serve};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};

async fn spawn_agent() -> String {
    let cfg = AgentConfig::parse_from(["hostwatch_agent", "--tick-ms", "50", "--demo"]);
    let state = build_state(SyntheticSensors::new(), &cfg).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(serve(listener, state));
    format!("ws://{addr}/ws")
}

async fn next_event<S>(ws: &mut S) -> ServerEvent
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("event within timeout")
            .expect("stream open")
            .expect("frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("valid event json");
        }
    }
}

#[tokio::test]
async fn viewer_gets_description_then_metrics() {
    let url = spawn_agent().await;
    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");

    match next_event(&mut ws).await {
        ServerEvent::SystemInfo(info) => assert_eq!(info.os.hostname, "demo-host"),
        other => panic!("expected system_info first, got {other:?}"),
    }
    ws.send(Message::Text(START_TRACKING.into()))
        .await
        .expect("send start_tracking");

    for _ in 0..3 {
        match next_event(&mut ws).await {
            ServerEvent::Metrics(m) => {
                assert!(m.network.iter().all(|n| n.interface != "lo"));
                assert!(m.processes.len() <= 10);
            }
            other => panic!("expected metrics, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn two_viewers_are_independent() {
    let url = spawn_agent().await;
    let (mut a, _) = connect_async(url.as_str()).await.expect("connect a");
    let (mut b, _) = connect_async(url.as_str()).await.expect("connect b");

    assert!(matches!(next_event(&mut a).await, ServerEvent::SystemInfo(_)));
    assert!(matches!(next_event(&mut b).await, ServerEvent::SystemInfo(_)));

    b.close(None).await.expect("close b");
    drop(b);

    for _ in 0..2 {
        assert!(matches!(next_event(&mut a).await, ServerEvent::Metrics(_)));
    }
}
