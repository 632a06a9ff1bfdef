use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use canvas::TargetState;

use crate::constants::{
    CONTROL_WS_URL, MAPS_BASE_URL, PING_INTERVAL, RECONNECT_DELAY, TARGET_REFETCH_DELAY,
};
use crate::fetch;

type ControlSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A placement intent relayed onto the control channel for observability.
/// Delivery is best-effort; dropped messages never affect scheduling.
#[derive(Debug, Clone, Copy)]
pub struct PixelAnnouncement {
    pub x: u32,
    pub y: u32,
    pub color: u8,
}

/// A "new target" announcement lifted off the wire. Fetching and
/// publishing happen on a separate task so the socket loop never blocks
/// on them.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MapNotice {
    name: String,
    reason: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Outbound<'a> {
    GetMap,
    Brand { brand: &'a str },
    Ping,
    PlacePixel { x: u32, y: u32, color: u8 },
}

fn outbound(message: &Outbound) -> Message {
    // Serializing a field-only enum cannot fail.
    Message::Text(serde_json::to_string(message).expect("control message serializes"))
}

/// Owns the control-channel socket for the life of the process. Map
/// notices are handed to a dedicated rebuild task over an ordered
/// channel, so keep-alives and announcements keep flowing while a target
/// image is being fetched and diffed. The connection is mandatory: on
/// any disconnect, reconnect after a short delay, forever.
pub async fn run(
    http: reqwest::Client,
    target_tx: watch::Sender<Option<Arc<TargetState>>>,
    mut announce_rx: mpsc::UnboundedReceiver<PixelAnnouncement>,
    brand: Option<String>,
) {
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    tokio::spawn(rebuild_targets(http, target_tx, notice_rx));

    loop {
        info!("connecting to control server...");
        match connect_async(CONTROL_WS_URL).await {
            Ok((ws, _)) => {
                info!("connected to control server");
                if let Err(e) =
                    session(ws, &notice_tx, &mut announce_rx, brand.as_deref()).await
                {
                    warn!("control channel dropped: {e}");
                }
            }
            Err(e) => warn!("could not reach control server: {e}"),
        }

        sleep(RECONNECT_DELAY).await;
    }
}

/// The first ping goes out one full interval after connecting; the
/// handshake messages already prove the connection is alive.
fn ping_timer() -> Interval {
    let mut ping = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping
}

async fn session(
    ws: ControlSocket,
    notice_tx: &mpsc::UnboundedSender<MapNotice>,
    announce_rx: &mut mpsc::UnboundedReceiver<PixelAnnouncement>,
    brand: Option<&str>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let (mut sink, mut stream): (SplitSink<ControlSocket, Message>, SplitStream<ControlSocket>) =
        ws.split();

    sink.send(outbound(&Outbound::GetMap)).await?;
    if let Some(brand) = brand {
        sink.send(outbound(&Outbound::Brand { brand })).await?;
    }

    let mut ping = ping_timer();
    let mut announcements_open = true;

    loop {
        tokio::select! {
            _ = ping.tick() => {
                sink.send(outbound(&Outbound::Ping)).await?;
            }
            announcement = announce_rx.recv(), if announcements_open => {
                match announcement {
                    Some(a) => {
                        sink.send(outbound(&Outbound::PlacePixel {
                            x: a.x,
                            y: a.y,
                            color: a.color,
                        }))
                        .await?;
                    }
                    None => announcements_open = false,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    None => return Ok(()),
                    Some(Err(e)) => return Err(e),
                    Some(Ok(Message::Text(text))) => handle_message(&text, notice_tx),
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Pulls a map announcement out of a raw control message. Malformed JSON
/// and unrecognized message types are ignored by design.
fn parse_map_notice(value: &Value) -> Option<MapNotice> {
    let kind = value.get("type").and_then(Value::as_str)?;
    if !kind.eq_ignore_ascii_case("map") {
        return None;
    }

    Some(MapNotice {
        name: value.get("data").and_then(Value::as_str)?.to_string(),
        reason: value
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn handle_message(raw: &str, notice_tx: &mpsc::UnboundedSender<MapNotice>) {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return;
    };
    if let Some(notice) = parse_map_notice(&value) {
        let _ = notice_tx.send(notice);
    }
}

/// Single consumer of map notices. Processing them in channel order means
/// a later target can never be overtaken by an earlier one, and readers
/// of the watch channel only ever see complete `TargetState` snapshots.
async fn rebuild_targets(
    http: reqwest::Client,
    target_tx: watch::Sender<Option<Arc<TargetState>>>,
    mut notice_rx: mpsc::UnboundedReceiver<MapNotice>,
) {
    while let Some(notice) = notice_rx.recv().await {
        info!(
            "new target map announced (update: {})",
            notice.reason.as_deref().unwrap_or("connected to server")
        );
        let url = format!("{}{}", MAPS_BASE_URL, notice.name);
        load_target(&http, &target_tx, &url, TARGET_REFETCH_DELAY).await;
    }
}

/// Fetches a target image and publishes it wholesale. One bounded refetch
/// covers transient decode/network failures; after that the previous
/// target stays in place until the next announcement or reconnect
/// delivers a fresh locator.
async fn load_target(
    http: &reqwest::Client,
    target_tx: &watch::Sender<Option<Arc<TargetState>>>,
    url: &str,
    retry_delay: Duration,
) {
    for attempt in 1..=2 {
        match fetch::fetch_image(http, url).await {
            Ok(buffer) => {
                let state = TargetState::new(buffer);
                info!("target loaded, {} pixels to maintain", state.real_work.len());
                target_tx.send_replace(Some(Arc::new(state)));
                return;
            }
            Err(e) => warn!("could not load target map from {url}: {e}"),
        }

        if attempt == 1 {
            sleep(retry_delay).await;
        }
    }
}
