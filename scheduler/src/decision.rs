use std::time::Duration;

use log::warn;
use rand::Rng;

use canvas::{palette, PixelBuffer};

use crate::constants::{COOLDOWN_GRACE_MS, FALLBACK_RETRY_DELAY};
use crate::PlacementResponse;

/// What an account loop does after one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Retry(Duration),
    Stop(String),
}

/// Closed classification of rejection messages. The service's error
/// vocabulary is not documented, so unknown messages default to transient;
/// the substring list below needs operational tuning as new messages show
/// up in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadCredential,
    Transient,
}

const FATAL_SUBSTRINGS: [&str; 1] = ["user is not logged in"];

pub fn classify_rejection(message: &str) -> ErrorKind {
    let lowered = message.to_ascii_lowercase();
    if FATAL_SUBSTRINGS.iter().any(|s| lowered.contains(s)) {
        ErrorKind::BadCredential
    } else {
        ErrorKind::Transient
    }
}

/// Time to wait until a server-supplied next-available timestamp has
/// passed, plus grace. Clamped at zero when the timestamp is already
/// behind us.
pub fn cooldown_delay(next_available_ms: i64, now_ms: i64) -> Duration {
    let delay_ms = (next_available_ms + COOLDOWN_GRACE_MS - now_ms).max(0);
    Duration::from_millis(delay_ms as u64)
}

pub fn interpret(response: &PlacementResponse, now_ms: i64) -> Decision {
    match response {
        PlacementResponse::Placed { next_available_ms }
        | PlacementResponse::CooldownActive { next_available_ms } => {
            Decision::Retry(cooldown_delay(*next_available_ms, now_ms))
        }
        PlacementResponse::Rejected { message } => match classify_rejection(message) {
            ErrorKind::BadCredential => Decision::Stop(format!(
                "placement rejected ({message}); check your session secret"
            )),
            ErrorKind::Transient => Decision::Retry(FALLBACK_RETRY_DELAY),
        },
        PlacementResponse::Malformed => Decision::Retry(FALLBACK_RETRY_DELAY),
    }
}

/// Picks a random pending pixel whose target color is actually on the
/// palette. Unmappable pixels point at a decode or palette-table bug; they
/// are logged and skipped rather than crashing the cycle.
pub fn pick_placeable(pending: &[u32], target: &PixelBuffer) -> Option<(u32, u8)> {
    let mut rng = rand::thread_rng();
    let mut candidates = pending.to_vec();

    while !candidates.is_empty() {
        let slot = rng.gen_range(0..candidates.len());
        let index = candidates.swap_remove(slot);
        let hex = target.hex(index);
        match palette::color_index(&hex) {
            Ok(color_index) => return Some((index, color_index)),
            Err(e) => warn!("skipping pixel {index}: {e}"),
        }
    }

    None
}
