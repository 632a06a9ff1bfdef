use std::sync::Arc;

use chrono::DateTime;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::sleep;

use canvas::{pending_work, TargetState};

use crate::constants::{
    AWAIT_CREDENTIAL_DELAY, AWAIT_TARGET_DELAY, COOLDOWN_GRACE_MS, FALLBACK_RETRY_DELAY,
    IDLE_DELAY, LIVE_FETCH_RETRY_DELAY,
};
use crate::decision::{interpret, pick_placeable, Decision};
use crate::{PlacementBackend, PlacementResponse};

/// One account's placement loop. Accounts run as independent tasks; one
/// stopping never affects the others. Within one account, attempts are
/// strictly sequential: the next attempt is only scheduled after the
/// previous response has been interpreted.
pub struct AccountLoop<B> {
    id: usize,
    backend: B,
    target_rx: watch::Receiver<Option<Arc<TargetState>>>,
    credential_rx: watch::Receiver<Option<String>>,
}

impl<B: PlacementBackend> AccountLoop<B> {
    pub fn new(
        id: usize,
        backend: B,
        target_rx: watch::Receiver<Option<Arc<TargetState>>>,
        credential_rx: watch::Receiver<Option<String>>,
    ) -> Self {
        AccountLoop {
            id,
            backend,
            target_rx,
            credential_rx,
        }
    }

    pub async fn run(mut self) {
        loop {
            match self.attempt().await {
                Decision::Retry(delay) => {
                    debug!("account {}: next attempt in {:?}", self.id, delay);
                    sleep(delay).await;
                }
                Decision::Stop(reason) => {
                    error!("account {}: stopping: {}", self.id, reason);
                    return;
                }
            }
        }
    }

    /// One full cycle: snapshot target and credential, fetch the live
    /// canvas, diff, place one pixel, turn the response into the next
    /// delay. Every failure below the fatal-credential case comes back as
    /// a retry; nothing escapes the loop.
    pub async fn attempt(&mut self) -> Decision {
        let target = self.target_rx.borrow().clone();
        let Some(target) = target else {
            info!("account {}: waiting for a target image", self.id);
            return Decision::Retry(AWAIT_TARGET_DELAY);
        };

        let credential = self.credential_rx.borrow().clone();
        let Some(credential) = credential else {
            info!("account {}: waiting for first credential refresh", self.id);
            return Decision::Retry(AWAIT_CREDENTIAL_DELAY);
        };

        let live = match self.backend.live_canvas(&credential).await {
            Ok(live) => live,
            Err(e) => {
                warn!("account {}: could not fetch live canvas: {}", self.id, e);
                return Decision::Retry(LIVE_FETCH_RETRY_DELAY);
            }
        };

        let pending = pending_work(&target.real_work, &target.target, &live);
        let Some((index, color_index)) = pick_placeable(&pending, &target.target) else {
            info!(
                "account {}: all pixels are already in the right place, checking again later",
                self.id
            );
            return Decision::Retry(IDLE_DELAY);
        };

        let (x, y) = target.target.coords(index);
        debug!(
            "account {}: trying to place color {} at ({}, {})",
            self.id, color_index, x, y
        );
        self.backend.announce(x, y, color_index);

        let response = match self.backend.place(x, y, color_index, &credential).await {
            Ok(response) => response,
            Err(e) => {
                warn!("account {}: placement request failed: {}", self.id, e);
                return Decision::Retry(FALLBACK_RETRY_DELAY);
            }
        };

        self.log_response(x, y, &response);
        interpret(&response, chrono::Utc::now().timestamp_millis())
    }

    fn log_response(&self, x: u32, y: u32, response: &PlacementResponse) {
        match response {
            PlacementResponse::Placed { next_available_ms } => info!(
                "account {}: pixel placed at ({}, {}), next attempt around {}",
                self.id,
                x,
                y,
                format_timestamp(next_available_ms + COOLDOWN_GRACE_MS)
            ),
            PlacementResponse::CooldownActive { next_available_ms } => info!(
                "account {}: pixel posted too soon, cooldown ends around {}",
                self.id,
                format_timestamp(next_available_ms + COOLDOWN_GRACE_MS)
            ),
            PlacementResponse::Rejected { message } => {
                warn!("account {}: placement rejected: {}", self.id, message);
            }
            PlacementResponse::Malformed => {
                warn!("account {}: unexpected placement response shape", self.id);
            }
        }
    }
}

fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use canvas::PixelBuffer;

    use super::*;

    struct FakeBackend {
        live: PixelBuffer,
        response: PlacementResponse,
        placements: Arc<AtomicUsize>,
    }

    impl PlacementBackend for FakeBackend {
        type Error = Infallible;

        async fn live_canvas(&self, _credential: &str) -> Result<PixelBuffer, Infallible> {
            Ok(self.live.clone())
        }

        async fn place(
            &self,
            _x: u32,
            _y: u32,
            _color_index: u8,
            _credential: &str,
        ) -> Result<PlacementResponse, Infallible> {
            self.placements.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }

        fn announce(&self, _x: u32, _y: u32, _color_index: u8) {}
    }

    fn buffer(pixels: &[[u8; 4]]) -> PixelBuffer {
        let data: Vec<u8> = pixels.iter().flatten().copied().collect();
        PixelBuffer::from_rgba(pixels.len() as u32, 1, data).unwrap()
    }

    fn channels(
        target: Option<TargetState>,
        credential: Option<&str>,
    ) -> (
        watch::Receiver<Option<Arc<TargetState>>>,
        watch::Receiver<Option<String>>,
    ) {
        // A watch receiver keeps serving the last value after the sender
        // is dropped, which is all these tests need.
        let (_target_tx, target_rx) = watch::channel(target.map(Arc::new));
        let (_credential_tx, credential_rx) = watch::channel(credential.map(str::to_string));
        (target_rx, credential_rx)
    }

    fn loop_with(
        id: usize,
        target: Option<TargetState>,
        credential: Option<&str>,
        live: PixelBuffer,
        response: PlacementResponse,
    ) -> (AccountLoop<FakeBackend>, Arc<AtomicUsize>) {
        let placements = Arc::new(AtomicUsize::new(0));
        let backend = FakeBackend {
            live,
            response,
            placements: Arc::clone(&placements),
        };
        let (target_rx, credential_rx) = channels(target, credential);
        (AccountLoop::new(id, backend, target_rx, credential_rx), placements)
    }

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[tokio::test]
    async fn waits_for_target_without_contacting_the_service() {
        let (mut account, placements) = loop_with(
            0,
            None,
            Some("token"),
            buffer(&[BLACK]),
            PlacementResponse::Malformed,
        );

        assert_eq!(account.attempt().await, Decision::Retry(AWAIT_TARGET_DELAY));
        assert_eq!(placements.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn waits_for_credential_without_contacting_the_service() {
        let target = TargetState::new(buffer(&[BLACK]));
        let (mut account, placements) = loop_with(
            0,
            Some(target),
            None,
            buffer(&[WHITE]),
            PlacementResponse::Malformed,
        );

        assert_eq!(
            account.attempt().await,
            Decision::Retry(AWAIT_CREDENTIAL_DELAY)
        );
        assert_eq!(placements.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn idle_when_canvas_matches_target() {
        let target = TargetState::new(buffer(&[BLACK, WHITE]));
        let (mut account, placements) = loop_with(
            0,
            Some(target),
            Some("token"),
            buffer(&[BLACK, WHITE]),
            PlacementResponse::Malformed,
        );

        assert_eq!(account.attempt().await, Decision::Retry(IDLE_DELAY));
        assert_eq!(placements.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn places_one_pixel_when_canvas_disagrees() {
        let target = TargetState::new(buffer(&[BLACK, WHITE]));
        let now = chrono::Utc::now().timestamp_millis();
        let (mut account, placements) = loop_with(
            0,
            Some(target),
            Some("token"),
            buffer(&[BLACK, BLACK]),
            PlacementResponse::Placed {
                next_available_ms: now - 60_000,
            },
        );

        // Stale cooldown timestamp clamps to an immediate retry.
        assert_eq!(account.attempt().await, Decision::Retry(std::time::Duration::ZERO));
        assert_eq!(placements.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bad_credential_stops_only_that_account() {
        let target = TargetState::new(buffer(&[BLACK, WHITE]));
        let live = buffer(&[WHITE, WHITE]);

        let (mut revoked, revoked_placements) = loop_with(
            0,
            Some(target.clone()),
            Some("expired"),
            live.clone(),
            PlacementResponse::Rejected {
                message: "User is not logged in".to_string(),
            },
        );
        let now = chrono::Utc::now().timestamp_millis();
        let (mut healthy, healthy_placements) = loop_with(
            1,
            Some(target),
            Some("valid"),
            live,
            PlacementResponse::Placed {
                next_available_ms: now - 1,
            },
        );

        assert!(matches!(revoked.attempt().await, Decision::Stop(_)));
        assert!(matches!(healthy.attempt().await, Decision::Retry(_)));
        assert!(matches!(healthy.attempt().await, Decision::Retry(_)));

        assert_eq!(revoked_placements.load(Ordering::SeqCst), 1);
        assert_eq!(healthy_placements.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_reschedules_itself_after_each_placement() {
        let target = TargetState::new(buffer(&[BLACK, WHITE]));
        let now = chrono::Utc::now().timestamp_millis();
        let (account, placements) = loop_with(
            0,
            Some(target),
            Some("token"),
            buffer(&[WHITE, WHITE]),
            PlacementResponse::Placed {
                next_available_ms: now + 5000,
            },
        );

        let handle = tokio::spawn(account.run());
        // Paused clock: sleeps auto-advance, so several cooldown cycles
        // elapse almost immediately.
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        handle.abort();

        assert!(placements.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_terminates_on_fatal_rejection() {
        let target = TargetState::new(buffer(&[BLACK, WHITE]));
        let (account, placements) = loop_with(
            0,
            Some(target),
            Some("expired"),
            buffer(&[WHITE, WHITE]),
            PlacementResponse::Rejected {
                message: "user is not logged in".to_string(),
            },
        );

        tokio::spawn(account.run()).await.unwrap();
        assert_eq!(placements.load(Ordering::SeqCst), 1);
    }
}
