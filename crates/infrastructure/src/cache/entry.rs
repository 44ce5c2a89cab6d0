use ferrous_resolver_domain::DnsResponse;
use std::sync::Arc;
use std::time::Instant;

/// One cached response. Entries are immutable after insert; replacement is
/// insert-over.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub(super) response: Arc<DnsResponse>,
    pub(super) expires_at: Instant,
    pub(super) negative: bool,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}
