use std::time::Duration;

/// Added on top of every server-supplied cooldown timestamp so clock skew
/// never makes us fire early.
pub const COOLDOWN_GRACE_MS: i64 = 3000;

pub const AWAIT_TARGET_DELAY: Duration = Duration::from_secs(2);
pub const AWAIT_CREDENTIAL_DELAY: Duration = Duration::from_secs(2);
pub const LIVE_FETCH_RETRY_DELAY: Duration = Duration::from_secs(15);
pub const FALLBACK_RETRY_DELAY: Duration = Duration::from_secs(10);
pub const IDLE_DELAY: Duration = Duration::from_secs(30);

/// First attempts of all accounts are spread across this window so startup
/// does not hammer the placement service all at once.
pub const STAGGER_WINDOW: Duration = Duration::from_millis(300);
