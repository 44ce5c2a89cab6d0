//! The lookup client: the public face of the resolver. Owns the engine,
//! cache and roster, composes client-level and per-query options, and
//! collapses concurrent identical questions into one upstream query.

use crate::audit::{NoopAudit, TracingAudit};
use crate::cache::{CacheKey, ResponseCache};
use crate::codec::HickoryCodec;
use crate::discovery::SystemDiscovery;
use crate::engine::ResolverEngine;
use crate::roster::ServerRoster;
use crate::transport::{TcpTransport, UdpTransport};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ferrous_resolver_application::ports::{
    AuditSink, DnsTransport, MessageCodec, ServerDiscovery,
};
use ferrous_resolver_domain::{
    DnsResponse, DomainName, NameServer, QueryOptions, QuerySettings, Question, RecordType,
    ResolveError, ResolverOptions,
};
use rustc_hash::FxBuildHasher;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

type InflightSender = Arc<watch::Sender<Option<Arc<DnsResponse>>>>;

pub struct LookupClient {
    engine: Arc<ResolverEngine>,
    cache: Arc<ResponseCache>,
    roster: Arc<ServerRoster>,
    options: ResolverOptions,
    inflight: DashMap<CacheKey, InflightSender, FxBuildHasher>,
}

impl LookupClient {
    /// A client over the given options with the default codec, transports
    /// and system discovery.
    pub fn new(options: ResolverOptions) -> Result<Self, ResolveError> {
        Self::builder().with_options(options).build()
    }

    pub fn builder() -> LookupClientBuilder {
        LookupClientBuilder::new()
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Resolves `name`/`record_type` with the client's options.
    pub async fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<DnsResponse, ResolveError> {
        let name: DomainName = name
            .parse()
            .map_err(|e| ResolveError::InvalidName(format!("{}: {}", name, e)))?;
        self.run_query(
            Question::new(name, record_type),
            None,
            CancellationToken::new(),
        )
        .await
    }

    /// Resolves with per-query overrides layered over the client options.
    pub async fn query_with_options(
        &self,
        question: Question,
        overrides: QueryOptions,
    ) -> Result<DnsResponse, ResolveError> {
        self.run_query(question, Some(overrides), CancellationToken::new())
            .await
    }

    /// Like [`query_with_options`](Self::query_with_options) but abortable:
    /// cancelling the token aborts at the next await point with
    /// [`ResolveError::Cancelled`].
    pub async fn query_cancellable(
        &self,
        question: Question,
        overrides: Option<QueryOptions>,
        cancel: CancellationToken,
    ) -> Result<DnsResponse, ResolveError> {
        self.run_query(question, overrides, cancel).await
    }

    /// Blocking shape of [`query`](Self::query) for callers without a
    /// runtime; spins up a current-thread runtime per call.
    pub fn query_sync(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<DnsResponse, ResolveError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ResolveError::Io(e.to_string()))?;
        runtime.block_on(self.query(name, record_type))
    }

    /// Convenience lookup: the A and AAAA addresses for `name`, CNAME
    /// chains followed through the answer section.
    pub async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let v4 = self.query(name, RecordType::A).await?;
        let v6 = self.query(name, RecordType::AAAA).await?;
        let mut addresses = v4.addresses();
        addresses.extend(v6.addresses());
        Ok(addresses)
    }

    /// Convenience reverse lookup: PTR names for an address.
    pub async fn lookup_ptr(&self, address: IpAddr) -> Result<Vec<DomainName>, ResolveError> {
        let name = DomainName::reverse_from_ip(address);
        let response = self
            .run_query(
                Question::new(name, RecordType::PTR),
                None,
                CancellationToken::new(),
            )
            .await?;
        Ok(response
            .answers
            .iter()
            .filter_map(|record| match &record.data {
                ferrous_resolver_domain::RecordData::PTR(target) => Some(target.clone()),
                _ => None,
            })
            .collect())
    }

    async fn run_query(
        &self,
        question: Question,
        overrides: Option<QueryOptions>,
        cancel: CancellationToken,
    ) -> Result<DnsResponse, ResolveError> {
        let settings = self.options.effective(overrides.as_ref());
        settings.validate()?;

        let servers = self.servers_for(overrides.as_ref(), &settings).await;
        if servers.is_empty() {
            return Err(ResolveError::EmptyServers);
        }

        if settings.use_cache {
            self.resolve_shared(question, settings, servers, cancel)
                .await
        } else {
            self.engine
                .resolve(&question, &settings, &servers, &cancel)
                .await
        }
    }

    /// The server list for one call. Per-query servers replace the roster
    /// outright and discovery is not consulted for them, even with
    /// auto-resolve enabled; they are never merged.
    async fn servers_for(
        &self,
        overrides: Option<&QueryOptions>,
        settings: &QuerySettings,
    ) -> Vec<Arc<NameServer>> {
        if let Some(overrides) = overrides {
            if !overrides.servers.is_empty() {
                let roster = ServerRoster::new(overrides.servers.iter().copied(), None);
                return roster.snapshot(false, settings.use_random_name_server);
            }
        }
        if settings.auto_resolve_name_servers {
            self.roster.refresh().await;
        }
        self.roster.snapshot(
            settings.auto_resolve_name_servers,
            settings.use_random_name_server,
        )
    }

    /// Single-flight: the first caller for a question becomes the leader
    /// and queries upstream; followers wait on its watch channel. A failed
    /// leader drops the channel and followers resolve on their own.
    async fn resolve_shared(
        &self,
        question: Question,
        settings: QuerySettings,
        servers: Vec<Arc<NameServer>>,
        cancel: CancellationToken,
    ) -> Result<DnsResponse, ResolveError> {
        let key = CacheKey::for_question(&question);

        let (is_leader, mut rx) = match self.inflight.entry(key.clone()) {
            Entry::Occupied(entry) => (false, entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None::<Arc<DnsResponse>>);
                entry.insert(Arc::new(tx));
                (true, rx)
            }
        };

        if !is_leader {
            debug!(question = %question, "joining in-flight query");
            if rx.changed().await.is_ok() {
                if let Some(shared) = rx.borrow().clone() {
                    return Ok((*shared).clone());
                }
            }
            // The leader may have sent before we subscribed; the value is
            // still readable. Otherwise the leader failed and we resolve
            // for ourselves.
            if let Some(shared) = rx.borrow().clone() {
                return Ok((*shared).clone());
            }
            return self
                .engine
                .resolve(&question, &settings, &servers, &cancel)
                .await;
        }

        let result = self
            .engine
            .resolve(&question, &settings, &servers, &cancel)
            .await;

        match &result {
            Ok(response) => {
                if let Some((_, tx)) = self.inflight.remove(&key) {
                    let _ = tx.send(Some(Arc::new(response.clone())));
                }
            }
            Err(_) => {
                self.inflight.remove(&key);
            }
        }
        result
    }
}

/// Assembles a [`LookupClient`], defaulting every port to the in-crate
/// adapter.
pub struct LookupClientBuilder {
    options: ResolverOptions,
    codec: Option<Arc<dyn MessageCodec>>,
    udp: Option<Arc<dyn DnsTransport>>,
    tcp: Option<Arc<dyn DnsTransport>>,
    discovery: Option<Arc<dyn ServerDiscovery>>,
    audit: Option<Arc<dyn AuditSink>>,
    cache: Option<Arc<ResponseCache>>,
}

impl LookupClientBuilder {
    pub fn new() -> Self {
        Self {
            options: ResolverOptions::default(),
            codec: None,
            udp: None,
            tcp: None,
            discovery: None,
            audit: None,
            cache: None,
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn MessageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn with_udp_transport(mut self, udp: Arc<dyn DnsTransport>) -> Self {
        self.udp = Some(udp);
        self
    }

    pub fn with_tcp_transport(mut self, tcp: Arc<dyn DnsTransport>) -> Self {
        self.tcp = Some(tcp);
        self
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn ServerDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<LookupClient, ResolveError> {
        self.options.validate()?;

        let cache = self.cache.unwrap_or_else(|| Arc::new(ResponseCache::new()));
        let discovery = match self.discovery {
            Some(discovery) => Some(discovery),
            None if self.options.auto_resolve_name_servers => {
                Some(Arc::new(SystemDiscovery::new()) as Arc<dyn ServerDiscovery>)
            }
            None => None,
        };
        let roster = Arc::new(ServerRoster::new(
            self.options.servers.iter().copied(),
            discovery,
        ));
        let audit: Arc<dyn AuditSink> = match self.audit {
            Some(audit) => audit,
            // With the trail enabled and no sink supplied, events still go
            // somewhere useful.
            None if self.options.enable_audit_trail => Arc::new(TracingAudit),
            None => Arc::new(NoopAudit),
        };
        let engine = Arc::new(ResolverEngine::new(
            self.codec.unwrap_or_else(|| Arc::new(HickoryCodec)),
            self.udp.unwrap_or_else(|| Arc::new(UdpTransport)),
            self.tcp.unwrap_or_else(|| Arc::new(TcpTransport)),
            Arc::clone(&cache),
            audit,
        ));

        info!(
            configured_servers = self.options.servers.len(),
            auto_resolve = self.options.auto_resolve_name_servers,
            cache = self.options.use_cache,
            "lookup client built"
        );

        Ok(LookupClient {
            engine,
            cache,
            roster,
            options: self.options,
            inflight: DashMap::with_hasher(FxBuildHasher),
        })
    }
}

impl Default for LookupClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
