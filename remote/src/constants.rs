use std::time::Duration;

pub const CONTROL_WS_URL: &str = "wss://mainuser.dev/api/ws";
pub const MAPS_BASE_URL: &str = "https://mainuser.dev/maps/";

pub const PLACEMENT_URL: &str = "https://gql-realtime-2.reddit.com/query";
pub const REALTIME_WS_URL: &str = "wss://gql-realtime-2.reddit.com/query";
pub const CANVAS_ORIGIN: &str = "https://hot-potato.reddit.com";
pub const CANVAS_REFERER: &str = "https://hot-potato.reddit.com/";
pub const CANVAS_PAGE_URL: &str = "https://www.reddit.com/r/place/";
pub const APOLLO_CLIENT_NAME: &str = "mona-lisa";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:98.0) Gecko/20100101 Firefox/98.0";

/// The credential endpoint serves HTML; the bearer token is scraped out by
/// locating this marker.
pub const ACCESS_TOKEN_MARKER: &str = "\"accessToken\":\"";

/// Bound on every remote call so a hung connection turns into a transient
/// error instead of stalling an account loop.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(15);

pub const PING_INTERVAL: Duration = Duration::from_secs(5);
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// One refetch after this delay when loading an announced target fails.
pub const TARGET_REFETCH_DELAY: Duration = Duration::from_secs(15);
pub const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
