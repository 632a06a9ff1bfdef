use log::{info, warn};
use reqwest::header;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::constants::{
    ACCESS_TOKEN_MARKER, CANVAS_PAGE_URL, REQUEST_TIMEOUT, TOKEN_REFRESH_INTERVAL,
};
use crate::errors::RefreshError;

/// Exchanges a session secret for a bearer token by scraping the canvas
/// page. Fragile by nature; a missing marker is a clean error, never a
/// crash.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    session_secret: &str,
) -> Result<String, RefreshError> {
    let body = http
        .get(CANVAS_PAGE_URL)
        .header(header::COOKIE, format!("reddit_session={session_secret}"))
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    extract_access_token(&body)
        .map(str::to_string)
        .ok_or(RefreshError::MarkerNotFound)
}

fn extract_access_token(body: &str) -> Option<&str> {
    let start = body.find(ACCESS_TOKEN_MARKER)? + ACCESS_TOKEN_MARKER.len();
    let rest = &body[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Keeps one account's credential slot fresh: refresh once at startup,
/// then on a fixed interval. A failed refresh leaves the previous token in
/// place so a working credential is never blanked out.
pub async fn run_refresh_loop(
    http: reqwest::Client,
    session_secret: String,
    credential_tx: watch::Sender<Option<String>>,
) {
    loop {
        match refresh_access_token(&http, &session_secret).await {
            Ok(token) => {
                info!("access token refreshed");
                credential_tx.send_replace(Some(token));
            }
            Err(e) => warn!("access token refresh failed, keeping previous token: {e}"),
        }

        sleep(TOKEN_REFRESH_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_extracted_from_page_body() {
        let body = r#"<script>window.state = {"user":{"session":{"accessToken":"abc-123","expires":"later"}}}</script>"#;
        assert_eq!(extract_access_token(body), Some("abc-123"));
    }

    #[test]
    fn missing_marker_yields_none() {
        assert_eq!(extract_access_token("<html>no token here</html>"), None);
    }

    #[test]
    fn unterminated_token_yields_none() {
        let body = format!("{}{}", ACCESS_TOKEN_MARKER, "never-closed");
        assert_eq!(extract_access_token(&body), None);
    }
}
