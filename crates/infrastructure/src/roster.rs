//! The effective, ordered list of name servers: user-supplied entries plus
//! whatever discovery reports, validated and deduplicated.

use ferrous_resolver_application::ports::ServerDiscovery;
use ferrous_resolver_domain::{NameServer, ServerEndpoint};
use rand::seq::SliceRandom;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Minimum spacing between discovery refreshes.
const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub struct ServerRoster {
    configured: Vec<Arc<NameServer>>,
    discovered: RwLock<Vec<Arc<NameServer>>>,
    discovery: Option<Arc<dyn ServerDiscovery>>,
    /// Monotonic milliseconds (since `epoch`) of the last refresh that ran;
    /// zero means never. Compare-and-swap on this stamp collapses
    /// concurrent refreshers into a single winner.
    last_refresh_ms: AtomicU64,
    epoch: Instant,
}

impl ServerRoster {
    pub fn new(
        configured: impl IntoIterator<Item = ServerEndpoint>,
        discovery: Option<Arc<dyn ServerDiscovery>>,
    ) -> Self {
        Self {
            configured: Self::sanitize(configured),
            discovered: RwLock::new(Vec::new()),
            discovery,
            last_refresh_ms: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// Drops invalid endpoints and duplicates, preserving first-seen order.
    fn sanitize(endpoints: impl IntoIterator<Item = ServerEndpoint>) -> Vec<Arc<NameServer>> {
        let mut seen: SmallVec<[ServerEndpoint; 8]> = SmallVec::new();
        let mut servers = Vec::new();
        for endpoint in endpoints {
            if !endpoint.is_valid() {
                debug!(server = %endpoint, "dropping invalid name server");
                continue;
            }
            if seen.contains(&endpoint) {
                continue;
            }
            seen.push(endpoint);
            servers.push(Arc::new(NameServer::new(endpoint)));
        }
        servers
    }

    /// Re-runs discovery if due. At most one refresh per interval across
    /// all callers; losers of the stamp race return immediately. A failed
    /// discovery keeps the previous list.
    pub async fn refresh(&self) {
        let Some(discovery) = &self.discovery else {
            return;
        };

        let now_ms = (self.epoch.elapsed().as_millis() as u64).max(1);
        let last = self.last_refresh_ms.load(Ordering::Acquire);
        if last != 0 && now_ms.saturating_sub(last) < REFRESH_INTERVAL.as_millis() as u64 {
            return;
        }
        if self
            .last_refresh_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            // Another caller won the stamp; their refresh covers us.
            return;
        }

        match discovery.discover().await {
            Ok(found) => {
                let servers = Self::sanitize(found);
                debug!(count = servers.len(), "name server discovery refreshed");
                let mut guard = match self.discovered.write() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *guard = servers;
            }
            Err(error) => {
                warn!(error = %error, "name server discovery failed, keeping previous roster");
            }
        }
    }

    /// The roster a single query runs against: configured servers first,
    /// then discovered ones, deduplicated across the two sources and
    /// optionally shuffled into a per-query order.
    pub fn snapshot(&self, include_discovered: bool, shuffle: bool) -> Vec<Arc<NameServer>> {
        let mut seen: SmallVec<[ServerEndpoint; 8]> = SmallVec::new();
        let mut servers: Vec<Arc<NameServer>> = Vec::new();

        let discovered = if include_discovered {
            match self.discovered.read() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        } else {
            Vec::new()
        };

        for server in self.configured.iter().chain(discovered.iter()) {
            if seen.contains(&server.endpoint()) {
                continue;
            }
            seen.push(server.endpoint());
            servers.push(Arc::clone(server));
        }

        if shuffle && servers.len() > 1 {
            servers.shuffle(&mut rand::thread_rng());
        }
        servers
    }

    pub fn has_configured_servers(&self) -> bool {
        !self.configured.is_empty()
    }
}
