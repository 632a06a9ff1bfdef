use serde_json::{json, Value};

use canvas::quadrant_for;
use scheduler::PlacementResponse;

use crate::constants::{
    APOLLO_CLIENT_NAME, CANVAS_ORIGIN, CANVAS_REFERER, PLACEMENT_URL, REQUEST_TIMEOUT,
};
use crate::errors::RpcError;

const SET_PIXEL_QUERY: &str = "mutation setPixel($input: ActInput!) {\n  act(input: $input) {\n    data {\n      ... on BasicMessage {\n        id\n        data {\n          ... on GetUserCooldownResponseMessageData {\n            nextAvailablePixelTimestamp\n            __typename\n          }\n          ... on SetPixelResponseMessageData {\n            timestamp\n            __typename\n          }\n          __typename\n        }\n        __typename\n      }\n      __typename\n    }\n    __typename\n  }\n}\n";

/// Issues one placement mutation for an assembled-canvas coordinate. The
/// request carries the in-quadrant coordinate plus the quadrant index,
/// derived from the same mapping the assembler uses.
pub async fn place(
    http: &reqwest::Client,
    x: u32,
    y: u32,
    color_index: u8,
    credential: &str,
) -> Result<PlacementResponse, RpcError> {
    let body = json!({
        "operationName": "setPixel",
        "variables": {
            "input": {
                "actionName": "r/replace:set_pixel",
                "PixelMessageData": {
                    "coordinate": {
                        "x": x % 1000,
                        "y": y % 1000,
                    },
                    "colorIndex": color_index,
                    "canvasIndex": quadrant_for(x, y),
                }
            }
        },
        "query": SET_PIXEL_QUERY,
    });

    let response: Value = http
        .post(PLACEMENT_URL)
        .header("origin", CANVAS_ORIGIN)
        .header("referer", CANVAS_REFERER)
        .header("apollographql-client-name", APOLLO_CLIENT_NAME)
        .bearer_auth(credential)
        .timeout(REQUEST_TIMEOUT)
        .json(&body)
        .send()
        .await?
        .json()
        .await?;

    Ok(interpret_body(&response))
}

/// Reduces the service's response body to the shapes the scheduler
/// understands. Missing fields never error out of here; they come back as
/// `Malformed`, which the scheduler treats as transient.
pub(crate) fn interpret_body(body: &Value) -> PlacementResponse {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        let Some(first) = errors.first() else {
            return PlacementResponse::Malformed;
        };

        if let Some(next_available_ms) = first
            .pointer("/extensions/nextAvailablePixelTs")
            .and_then(timestamp_ms)
        {
            return PlacementResponse::CooldownActive { next_available_ms };
        }

        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return PlacementResponse::Rejected { message };
    }

    match body
        .pointer("/data/act/data/0/data/nextAvailablePixelTimestamp")
        .and_then(timestamp_ms)
    {
        Some(next_available_ms) => PlacementResponse::Placed { next_available_ms },
        None => PlacementResponse::Malformed,
    }
}

// Timestamps show up as integers, floats or strings depending on which
// service layer produced them.
fn timestamp_ms(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
