use std::future::Future;

use canvas::PixelBuffer;

mod account;
pub mod constants;
mod decision;

pub use crate::account::AccountLoop;
pub use crate::decision::{classify_rejection, cooldown_delay, interpret, Decision, ErrorKind};

/// What the placement service said about one attempt, reduced to the four
/// shapes the scheduler distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementResponse {
    /// The pixel was placed; the account may try again at the given epoch
    /// millisecond timestamp.
    Placed { next_available_ms: i64 },
    /// Placed too soon; the server told us when the cooldown ends.
    CooldownActive { next_available_ms: i64 },
    /// The server refused with an error message.
    Rejected { message: String },
    /// The response body was missing the fields we navigate to.
    Malformed,
}

/// The remote side of one placement attempt. The production implementation
/// talks to the real service; tests substitute a fake.
pub trait PlacementBackend {
    type Error: std::fmt::Display;

    /// Fetches and assembles the freshest live canvas snapshot.
    fn live_canvas(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<PixelBuffer, Self::Error>> + Send;

    /// Issues one placement request for an assembled-canvas coordinate.
    fn place(
        &self,
        x: u32,
        y: u32,
        color_index: u8,
        credential: &str,
    ) -> impl Future<Output = Result<PlacementResponse, Self::Error>> + Send;

    /// Best-effort intent announcement; failures must not surface here.
    fn announce(&self, x: u32, y: u32, color_index: u8);
}
