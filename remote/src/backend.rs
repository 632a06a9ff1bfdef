use tokio::sync::mpsc;

use canvas::PixelBuffer;
use scheduler::{PlacementBackend, PlacementResponse};

use crate::control::PixelAnnouncement;
use crate::errors::RemoteError;
use crate::{fetch, rpc};

/// Production `PlacementBackend`: live canvases come from the realtime
/// quadrant subscriptions, placements go to the GraphQL endpoint, and
/// intents are relayed to the control channel without caring whether they
/// arrive.
pub struct RedditBackend {
    http: reqwest::Client,
    announce_tx: mpsc::UnboundedSender<PixelAnnouncement>,
}

impl RedditBackend {
    pub fn new(
        http: reqwest::Client,
        announce_tx: mpsc::UnboundedSender<PixelAnnouncement>,
    ) -> Self {
        RedditBackend { http, announce_tx }
    }
}

impl PlacementBackend for RedditBackend {
    type Error = RemoteError;

    async fn live_canvas(&self, credential: &str) -> Result<PixelBuffer, RemoteError> {
        Ok(fetch::live_canvas(&self.http, credential).await?)
    }

    async fn place(
        &self,
        x: u32,
        y: u32,
        color_index: u8,
        credential: &str,
    ) -> Result<PlacementResponse, RemoteError> {
        Ok(rpc::place(&self.http, x, y, color_index, credential).await?)
    }

    fn announce(&self, x: u32, y: u32, color_index: u8) {
        let _ = self.announce_tx.send(PixelAnnouncement {
            x,
            y,
            color: color_index,
        });
    }
}
