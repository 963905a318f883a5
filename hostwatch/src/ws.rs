//! WebSocket client: connect to the agent, forward pushed events, send tracking requests.

use std::time::{Duration, Instant};

use futures_util::{stream::SplitSink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};
use url::Url;

use crate::types::ServerEvent;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsSink = SplitSink<WsStream, Message>;

/// Text frame asking the agent to note a tracking capture.
pub const START_TRACKING: &str = "start_tracking";

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Event(ServerEvent),
    /// The stream ended; carries the error text when it ended abnormally.
    Closed(Option<String>),
}

pub async fn connect(url: &Url) -> Result<WsStream, tungstenite::Error> {
    let (ws, _) = connect_async(url.as_str()).await?;
    Ok(ws)
}

pub async fn send_start_tracking(sink: &mut WsSink) -> Result<(), tungstenite::Error> {
    sink.send(Message::Text(START_TRACKING.into())).await
}

pub fn decode_event(text: &str) -> Result<ServerEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Reads frames until the socket ends, forwarding decoded events in arrival order.
/// Always finishes with `Incoming::Closed` unless the receiver is gone.
pub async fn forward_events<S>(mut stream: S, tx: mpsc::Sender<Incoming>)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut reason = None;
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match decode_event(&text) {
                Ok(ev) => {
                    if tx.send(Incoming::Event(ev)).await.is_err() {
                        return;
                    }
                }
                Err(e) => debug!("ignoring undecodable frame: {e}"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("websocket read failed: {e}");
                reason = Some(e.to_string());
                break;
            }
        }
    }
    let _ = tx.send(Incoming::Closed(reason)).await;
}

/// A live agent link: the write half plus the task forwarding the read half.
pub struct Connection {
    sink: WsSink,
    reader: JoinHandle<()>,
}

impl Connection {
    pub fn spawn(ws: WsStream, tx: mpsc::Sender<Incoming>) -> Self {
        let (sink, stream) = ws.split();
        let reader = tokio::spawn(forward_events(stream, tx));
        Self { sink, reader }
    }

    pub fn sink(&mut self) -> &mut WsSink {
        &mut self.sink
    }

    pub async fn close(mut self) {
        if let Err(e) = self.sink.close().await {
            debug!("close handshake failed: {e}");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Exponential reconnect schedule.
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
    next_retry_at: Instant,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            current: initial,
            next_retry_at: Instant::now(),
        }
    }

    pub fn mark_failure(&mut self, now: Instant) {
        self.next_retry_at = now + self.current;
        self.current = (self.current * 2).min(self.max);
    }

    pub fn mark_success(&mut self, now: Instant) {
        self.current = self.initial;
        self.next_retry_at = now;
    }

    pub fn should_retry(&self, now: Instant) -> bool {
        now >= self.next_retry_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn forwards_events_in_order_then_closes() {
        let frames: Vec<Result<Message, tungstenite::Error>> = vec![
            Ok(Message::Text(r#"{"event":"system_info","data":{}}"#.into())),
            Ok(Message::Text("garbage".into())),
            Ok(Message::Ping(vec![1])),
            Ok(Message::Text(r#"{"event":"metrics_error","data":{"message":"x"}}"#.into())),
            Ok(Message::Close(None)),
            Ok(Message::Text(r#"{"event":"metrics_error","data":{"message":"late"}}"#.into())),
        ];
        let (tx, mut rx) = mpsc::channel(8);
        forward_events(stream::iter(frames), tx).await;

        assert!(matches!(rx.recv().await, Some(Incoming::Event(ServerEvent::SystemInfo(_)))));
        assert_eq!(
            rx.recv().await,
            Some(Incoming::Event(ServerEvent::MetricsError { message: "x".into() }))
        );
        assert_eq!(rx.recv().await, Some(Incoming::Closed(None)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn read_error_reports_reason() {
        let frames: Vec<Result<Message, tungstenite::Error>> =
            vec![Err(tungstenite::Error::ConnectionClosed)];
        let (tx, mut rx) = mpsc::channel(2);
        forward_events(stream::iter(frames), tx).await;
        assert!(matches!(rx.recv().await, Some(Incoming::Closed(Some(_)))));
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let t0 = Instant::now();
        let mut b = Backoff::new(Duration::from_millis(500), Duration::from_secs(2));
        b.mark_failure(t0);
        assert!(!b.should_retry(t0 + Duration::from_millis(499)));
        assert!(b.should_retry(t0 + Duration::from_millis(500)));
        b.mark_failure(t0);
        b.mark_failure(t0);
        b.mark_failure(t0);
        assert!(b.should_retry(t0 + Duration::from_secs(2)));
        b.mark_success(t0);
        assert!(b.should_retry(t0));
    }
}
