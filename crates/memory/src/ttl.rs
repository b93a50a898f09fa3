//! TTL bucket classification. Grounded on `core/memory/ttl_buckets.py`.

const HOUR: i64 = 60 * 60;
const DAY: i64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlBucket {
    Transient,
    Session,
    LongTerm,
}

impl TtlBucket {
    /// `None` means no expiry.
    pub fn ttl_seconds(&self) -> Option<i64> {
        match self {
            TtlBucket::Transient => Some(36 * HOUR),
            TtlBucket::Session => Some(7 * DAY),
            TtlBucket::LongTerm => None,
        }
    }
}

/// `SCOPE_DEFAULT_BUCKETS`, checked in declaration order (longer/more
/// specific prefixes first where they'd otherwise collide).
const SCOPE_DEFAULT_BUCKETS: &[(&str, TtlBucket)] = &[
    ("persona:", TtlBucket::LongTerm),
    ("task:", TtlBucket::Session),
    ("ops:", TtlBucket::Session),
    ("calendar:", TtlBucket::Session),
    ("notes", TtlBucket::LongTerm),
    ("recap:", TtlBucket::LongTerm),
    ("thread:", TtlBucket::Transient),
    ("context:", TtlBucket::Transient),
];

pub fn bucket_for_scope(scope: &str) -> TtlBucket {
    for (prefix, bucket) in SCOPE_DEFAULT_BUCKETS {
        if scope.starts_with(prefix) {
            return *bucket;
        }
    }
    TtlBucket::Session
}

/// Resolution order: explicit TTL > explicit bucket > scope-derived bucket.
pub fn resolve_ttl_seconds(
    scope: &str,
    explicit_bucket: Option<TtlBucket>,
    explicit_ttl: Option<i64>,
) -> Option<i64> {
    if let Some(ttl) = explicit_ttl {
        return Some(ttl);
    }
    if let Some(bucket) = explicit_bucket {
        return bucket.ttl_seconds();
    }
    bucket_for_scope(scope).ttl_seconds()
}
