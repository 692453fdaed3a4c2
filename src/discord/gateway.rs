//! Discord gateway (WebSocket) connection.
//!
//! A spawned driver task owns the socket: HELLO, IDENTIFY or RESUME, a
//! heartbeat task, sequence tracking, and reconnects with backoff. The bot
//! reads parsed [`GatewayEvent`]s from a channel and can push raw payloads
//! (presence updates) through [`GatewayHandle::sender`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::discord::model::{GatewayEvent, GatewayPayload};

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
const MAX_RECONNECT_ATTEMPTS: u32 = 8;
const HELLO_TIMEOUT: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Writer = Arc<Mutex<SplitSink<Socket, WsMessage>>>;
type Reader = SplitStream<Socket>;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub token: String,
    pub intents: u32,
}

pub struct GatewayHandle {
    pub sender: mpsc::Sender<Value>,
    pub events: mpsc::Receiver<GatewayEvent>,
    pub driver: tokio::task::JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Session {
    session_id: Option<String>,
    resume_url: Option<String>,
    sequence: Option<u64>,
}

impl Session {
    fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    fn url(&self) -> String {
        match &self.resume_url {
            Some(url) if url.contains('?') => url.clone(),
            Some(url) => format!("{}/?v=10&encoding=json", url.trim_end_matches('/')),
            None => GATEWAY_URL.to_string(),
        }
    }
}

/// What to do after a connection ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disconnect {
    Resume,
    Reidentify,
    Fatal,
    Closed,
}

/// Map a close code to the next step. Authentication, sharding, version and
/// intent failures are fatal.
fn classify_close(code: u16) -> Disconnect {
    match code {
        4004 | 4010 | 4011 | 4012 | 4013 | 4014 => Disconnect::Fatal,
        4007 | 4009 => Disconnect::Reidentify,
        _ => Disconnect::Resume,
    }
}

/// Exponential backoff with jitter, capped at one minute.
fn backoff(attempt: u32) -> Duration {
    let base_ms = 1000u64 * 2u64.saturating_pow(attempt.min(6));
    let jittered = base_ms as f64 * (0.75 + rand::random::<f64>() * 0.5);
    Duration::from_millis(jittered.min(60_000.0) as u64)
}

pub fn connect(config: GatewayConfig) -> GatewayHandle {
    let (event_tx, events) = mpsc::channel(256);
    let (sender, send_rx) = mpsc::channel(32);
    let driver = tokio::spawn(drive(config, event_tx, send_rx));
    GatewayHandle {
        sender,
        events,
        driver,
    }
}

async fn drive(
    config: GatewayConfig,
    event_tx: mpsc::Sender<GatewayEvent>,
    mut send_rx: mpsc::Receiver<Value>,
) {
    let session = Arc::new(Mutex::new(Session::default()));
    let mut attempts: u32 = 0;

    loop {
        if attempts > 0 {
            if attempts > MAX_RECONNECT_ATTEMPTS {
                error!("Gateway: giving up after {} reconnect attempts", attempts - 1);
                return;
            }
            let wait = backoff(attempts);
            warn!("Gateway: reconnecting in {}ms (attempt {})", wait.as_millis(), attempts);
            tokio::time::sleep(wait).await;
        }

        let url = session.lock().await.url();
        info!("Gateway: connecting to {}", url);
        let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _)) => socket,
            Err(e) => {
                error!("Gateway: connect failed: {}", e);
                attempts += 1;
                continue;
            }
        };
        let (sink, mut reader) = socket.split();
        let writer: Writer = Arc::new(Mutex::new(sink));

        let interval = match read_hello(&mut reader).await {
            Ok(ms) => ms,
            Err(e) => {
                error!("Gateway: {}", e);
                attempts += 1;
                continue;
            }
        };
        debug!("Gateway: HELLO, heartbeat every {}ms", interval);

        let handshake = {
            let s = session.lock().await;
            match (&s.session_id, s.sequence) {
                (Some(id), Some(seq)) if s.can_resume() => {
                    info!("Gateway: resuming session");
                    json!({"op": 6, "d": {"token": config.token, "session_id": id, "seq": seq}})
                }
                _ => json!({
                    "op": 2,
                    "d": {
                        "token": config.token,
                        "intents": config.intents,
                        "properties": {"os": std::env::consts::OS, "browser": "squirrel-catcher", "device": "squirrel-catcher"},
                    }
                }),
            }
        };
        if let Err(e) = send_json(&writer, &handshake).await {
            error!("Gateway: handshake send failed: {}", e);
            attempts += 1;
            continue;
        }
        attempts = 0;

        let heartbeat = tokio::spawn(heartbeat_loop(
            Arc::clone(&writer),
            Arc::clone(&session),
            interval,
        ));
        let outcome = read_loop(&mut reader, &writer, &session, &event_tx, &mut send_rx).await;
        heartbeat.abort();
        let _ = writer.lock().await.send(WsMessage::Close(None)).await;

        match outcome {
            Disconnect::Resume => info!("Gateway: connection lost, will resume"),
            Disconnect::Reidentify => {
                info!("Gateway: session invalid, will identify again");
                let mut s = session.lock().await;
                s.session_id = None;
                s.sequence = None;
            }
            Disconnect::Fatal => {
                error!("Gateway: fatal close, stopping");
                return;
            }
            Disconnect::Closed => {
                info!("Gateway: event consumer gone, stopping");
                return;
            }
        }
        attempts += 1;
    }
}

async fn read_hello(reader: &mut Reader) -> Result<u64, String> {
    let frame = tokio::time::timeout(HELLO_TIMEOUT, reader.next())
        .await
        .map_err(|_| "timed out waiting for HELLO".to_string())?
        .ok_or_else(|| "socket closed before HELLO".to_string())?
        .map_err(|e| format!("read error before HELLO: {}", e))?;
    let WsMessage::Text(text) = frame else {
        return Err("HELLO was not a text frame".to_string());
    };
    let payload: GatewayPayload =
        serde_json::from_str(&text).map_err(|e| format!("bad HELLO: {}", e))?;
    if payload.op != 10 {
        return Err(format!("expected HELLO (op 10), got op {}", payload.op));
    }
    payload
        .d
        .as_ref()
        .and_then(|d| d.get("heartbeat_interval"))
        .and_then(Value::as_u64)
        .ok_or_else(|| "HELLO without heartbeat_interval".to_string())
}

async fn send_json(writer: &Writer, payload: &Value) -> Result<(), String> {
    let text = serde_json::to_string(payload).map_err(|e| e.to_string())?;
    writer
        .lock()
        .await
        .send(WsMessage::Text(text))
        .await
        .map_err(|e| e.to_string())
}

async fn send_heartbeat(writer: &Writer, session: &Mutex<Session>) -> Result<(), String> {
    let seq = session.lock().await.sequence;
    send_json(writer, &json!({"op": 1, "d": seq})).await
}

async fn heartbeat_loop(writer: Writer, session: Arc<Mutex<Session>>, interval_ms: u64) {
    let jitter = (interval_ms as f64 * rand::random::<f64>()) as u64;
    tokio::time::sleep(Duration::from_millis(jitter)).await;
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    loop {
        ticker.tick().await;
        if let Err(e) = send_heartbeat(&writer, &session).await {
            warn!("Gateway: heartbeat failed: {}", e);
            return;
        }
        debug!("Gateway: heartbeat sent");
    }
}

async fn read_loop(
    reader: &mut Reader,
    writer: &Writer,
    session: &Arc<Mutex<Session>>,
    event_tx: &mpsc::Sender<GatewayEvent>,
    send_rx: &mut mpsc::Receiver<Value>,
) -> Disconnect {
    loop {
        tokio::select! {
            Some(outgoing) = send_rx.recv() => {
                if let Err(e) = send_json(writer, &outgoing).await {
                    warn!("Gateway: send failed: {}", e);
                }
            }
            frame = reader.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(frame))) => {
                        let code = frame.map(|f| u16::from(f.code)).unwrap_or(1000);
                        warn!("Gateway: closed by server with code {}", code);
                        return classify_close(code);
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Gateway: read error: {}", e);
                        return Disconnect::Resume;
                    }
                    None => return Disconnect::Resume,
                };
                let payload: GatewayPayload = match serde_json::from_str(&text) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Gateway: unparseable frame: {}", e);
                        continue;
                    }
                };
                if let Some(seq) = payload.s {
                    session.lock().await.sequence = Some(seq);
                }

                let event = GatewayEvent::from_payload(payload);
                match &event {
                    GatewayEvent::Ready(ready) => {
                        let mut s = session.lock().await;
                        s.session_id = Some(ready.session_id.clone());
                        s.resume_url = Some(ready.resume_gateway_url.clone());
                        info!("Gateway: READY as {}", ready.user.username);
                    }
                    GatewayEvent::HeartbeatRequest => {
                        if let Err(e) = send_heartbeat(writer, session).await {
                            warn!("Gateway: requested heartbeat failed: {}", e);
                        }
                        continue;
                    }
                    GatewayEvent::HeartbeatAck => {
                        debug!("Gateway: heartbeat ack");
                        continue;
                    }
                    GatewayEvent::Reconnect => return Disconnect::Resume,
                    GatewayEvent::InvalidSession(resumable) => {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        return if *resumable { Disconnect::Resume } else { Disconnect::Reidentify };
                    }
                    _ => {}
                }
                if event_tx.send(event).await.is_err() {
                    return Disconnect::Closed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_fatal() {
        assert_eq!(classify_close(4004), Disconnect::Fatal);
        assert_eq!(classify_close(4014), Disconnect::Fatal);
        assert_eq!(classify_close(4009), Disconnect::Reidentify);
        assert_eq!(classify_close(1001), Disconnect::Resume);
    }

    #[test]
    fn backoff_is_capped() {
        for attempt in 0..20 {
            assert!(backoff(attempt) <= Duration::from_secs(60));
        }
        assert!(backoff(1) >= Duration::from_millis(1500));
    }

    #[test]
    fn resume_url_gets_query() {
        let mut s = Session::default();
        assert_eq!(s.url(), GATEWAY_URL);
        s.resume_url = Some("wss://gateway-us-east1-b.discord.gg".into());
        assert_eq!(
            s.url(),
            "wss://gateway-us-east1-b.discord.gg/?v=10&encoding=json"
        );
    }
}
