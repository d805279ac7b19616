/// Days ahead of now that a sync run looks at.
pub const DEFAULT_SYNC_DAYS: u32 = 30;

pub const DEFAULT_PLACEHOLDER_TITLE: &str = "Not available";

pub const DEFAULT_PROVIDER: &str = "eventkit";

/// Prefix for environment variables overriding config values (`CALSYNC_SYNC_DAYS=14`).
pub const ENV_PREFIX: &str = "CALSYNC";
