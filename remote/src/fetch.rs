use chrono::Utc;
use futures_util::future::try_join_all;

use canvas::{PixelBuffer, PLACE_LAYOUT};

use crate::constants::REQUEST_TIMEOUT;
use crate::errors::FetchError;
use crate::subscribe;

/// Fetches and decodes one image into a flat RGBA buffer. Unreachable
/// hosts, non-image bodies and decode failures all come back as a
/// transient `FetchError`; the caller retries after a backoff.
pub async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<PixelBuffer, FetchError> {
    let bytes = http
        .get(url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    Ok(PixelBuffer::from_rgba(width, height, decoded.into_raw())?)
}

/// Assembles the freshest full canvas: one frame locator plus image fetch
/// per quadrant, all four in flight at once, then stitched.
pub async fn live_canvas(
    http: &reqwest::Client,
    credential: &str,
) -> Result<PixelBuffer, FetchError> {
    let fetches =
        (0..PLACE_LAYOUT.tile_count()).map(|quadrant| fetch_quadrant(http, credential, quadrant as u8));
    let tiles = try_join_all(fetches).await?;
    Ok(PLACE_LAYOUT.assemble(&tiles)?)
}

async fn fetch_quadrant(
    http: &reqwest::Client,
    credential: &str,
    quadrant: u8,
) -> Result<PixelBuffer, FetchError> {
    let name = subscribe::current_frame_locator(quadrant, credential).await?;
    fetch_image(http, &cache_busted(&name)).await
}

/// The service reuses frame names across versions, so every fetch carries
/// a cache-busting query parameter.
fn cache_busted(name: &str) -> String {
    format!("{}?nocache={}", name, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_busting_appends_a_query_parameter() {
        let busted = cache_busted("https://example.com/frame-0.png");
        assert!(busted.starts_with("https://example.com/frame-0.png?nocache="));
        assert!(busted.len() > "https://example.com/frame-0.png?nocache=".len());
    }
}
