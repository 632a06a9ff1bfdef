use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::constants::{CANVAS_ORIGIN, REALTIME_WS_URL, SUBSCRIBE_TIMEOUT, USER_AGENT};
use crate::errors::SubscribeError;

const REPLACE_QUERY: &str = "subscription replace($input: SubscribeInput!) {\n  subscribe(input: $input) {\n    id\n    ... on BasicMessage {\n      data {\n        __typename\n        ... on FullFrameMessageData {\n          __typename\n          name\n          timestamp\n        }\n      }\n      __typename\n    }\n    __typename\n  }\n}";

/// Asks the realtime endpoint for the current full-frame image locator of
/// one canvas quadrant: authenticate, subscribe to that quadrant's
/// "replace" channel, take the first delivered frame name, close.
pub async fn current_frame_locator(quadrant: u8, credential: &str) -> Result<String, SubscribeError> {
    let mut request = REALTIME_WS_URL.into_client_request()?;
    let headers = request.headers_mut();
    headers.insert("Sec-WebSocket-Protocol", HeaderValue::from_static("graphql-ws"));
    headers.insert("Origin", HeaderValue::from_static(CANVAS_ORIGIN));
    headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));

    let (mut ws, _) = connect_async(request).await?;

    let init = json!({
        "type": "connection_init",
        "payload": { "Authorization": format!("Bearer {credential}") }
    });
    ws.send(Message::Text(init.to_string())).await?;

    let start = json!({
        "id": "1",
        "type": "start",
        "payload": {
            "variables": {
                "input": {
                    "channel": {
                        "teamOwner": "AFD2022",
                        "category": "CANVAS",
                        "tag": quadrant.to_string(),
                    }
                }
            },
            "extensions": {},
            "operationName": "replace",
            "query": REPLACE_QUERY,
        }
    });
    ws.send(Message::Text(start.to_string())).await?;

    let name = timeout(SUBSCRIBE_TIMEOUT, wait_for_frame_name(&mut ws))
        .await
        .map_err(|_| SubscribeError::Timeout)??;

    ws.close(None).await.ok();
    Ok(name)
}

async fn wait_for_frame_name(
    ws: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
) -> Result<String, SubscribeError> {
    while let Some(message) = ws.next().await {
        let Message::Text(text) = message? else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        if let Some(name) = extract_frame_name(&value) {
            return Ok(name.to_string());
        }
    }

    Err(SubscribeError::ClosedEarly)
}

fn extract_frame_name(value: &Value) -> Option<&str> {
    value
        .pointer("/payload/data/subscribe/data/name")
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_name_is_read_from_subscription_payload() {
        let value = json!({
            "id": "1",
            "type": "data",
            "payload": {
                "data": {
                    "subscribe": {
                        "data": {
                            "__typename": "FullFrameMessageData",
                            "name": "https://example.com/frame-3.png"
                        }
                    }
                }
            }
        });
        assert_eq!(
            extract_frame_name(&value),
            Some("https://example.com/frame-3.png")
        );
    }

    #[test]
    fn keepalive_messages_carry_no_frame_name() {
        assert_eq!(extract_frame_name(&json!({ "type": "ka" })), None);
        assert_eq!(extract_frame_name(&json!({ "payload": {} })), None);
    }
}
