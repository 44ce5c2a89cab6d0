use async_trait::async_trait;
use ferrous_resolver_domain::{ResolveError, ServerEndpoint};

/// Supplies name servers from OS state (resolv.conf, interface
/// configuration, policy tables). The roster filters and deduplicates
/// whatever this returns.
#[async_trait]
pub trait ServerDiscovery: Send + Sync {
    async fn discover(&self) -> Result<Vec<ServerEndpoint>, ResolveError>;
}
