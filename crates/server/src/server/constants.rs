/// Hard upper bound for any listing `LIMIT`/page size to protect DB and memory usage.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Cookie sessions expire after this many days without re-login.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Default cutoff for "most common" tag/type rankings.
pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// Default length of the recent-resources listing.
pub const DEFAULT_RECENT_LIMIT: i64 = 10;
