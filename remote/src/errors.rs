use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decoded image is inconsistent: {0}")]
    Buffer(#[from] canvas::BufferError),
    #[error(transparent)]
    Subscribe(#[from] SubscribeError),
    #[error("fetched tiles do not match the canvas layout: {0}")]
    Assemble(#[from] canvas::AssembleError),
}

#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("subscription closed before delivering a frame name")]
    ClosedEarly,
    #[error("timed out waiting for a frame name")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("placement request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("credential request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("access token marker not found in response body")]
    MarkerNotFound,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}
