//! The resolver engine: the per-question state machine that walks the
//! server list, retries, escalates UDP to TCP on truncation and consults
//! the cache.

use crate::cache::{CacheKey, ResponseCache};
use crate::interpreter::{ResponseInterpreter, ResponseOutcome};
use crate::query_builder::{fresh_xid, QueryBuilder};
use ferrous_resolver_application::ports::{
    AuditEvent, AuditSink, DnsTransport, MessageCodec, TransportProtocol,
};
use ferrous_resolver_domain::{
    DnsRequest, DnsResponse, NameServer, QuerySettings, Question, ResolveError,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Outcome of one full pass over the server list on a single transport.
enum Verdict {
    Answered(DnsResponse),
    Truncated,
}

/// What the retry loop decided to do after classifying one attempt.
enum Step {
    Return(Verdict),
    RetrySameServer,
    NextServer(Option<ResolveError>),
    Fail(ResolveError),
}

/// Drives queries against a prepared server list. Stateless between calls
/// apart from the shared cache; one engine serves any number of concurrent
/// callers.
pub struct ResolverEngine {
    codec: Arc<dyn MessageCodec>,
    udp: Arc<dyn DnsTransport>,
    tcp: Arc<dyn DnsTransport>,
    cache: Arc<ResponseCache>,
    audit: Arc<dyn AuditSink>,
}

impl ResolverEngine {
    pub fn new(
        codec: Arc<dyn MessageCodec>,
        udp: Arc<dyn DnsTransport>,
        tcp: Arc<dyn DnsTransport>,
        cache: Arc<ResponseCache>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            codec,
            udp,
            tcp,
            cache,
            audit,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Resolves `question` against `servers` (ordered, already shuffled if
    /// applicable). The timeout applies per transport invocation; the
    /// cancellation token is observed before every send and wins over the
    /// deadline.
    pub async fn resolve(
        &self,
        question: &Question,
        settings: &QuerySettings,
        servers: &[Arc<NameServer>],
        cancel: &CancellationToken,
    ) -> Result<DnsResponse, ResolveError> {
        if servers.is_empty() {
            return Err(ResolveError::EmptyServers);
        }
        settings.validate()?;

        let mut request = QueryBuilder::build(question.clone(), settings);
        self.audit(settings, || AuditEvent::QueryStarted {
            question: question.clone(),
            servers: servers.len(),
        });

        let first_transport = if settings.use_tcp_only {
            &self.tcp
        } else {
            &self.udp
        };

        match self
            .run_server_loop(&mut request, settings, servers, first_transport.as_ref(), cancel)
            .await?
        {
            Verdict::Answered(response) => Ok(response),
            Verdict::Truncated => {
                if first_transport.protocol() == TransportProtocol::Tcp {
                    return Err(ResolveError::UnexpectedTruncatedOverTcp);
                }
                if !settings.use_tcp_fallback {
                    return Err(ResolveError::TruncatedFallbackDisabled);
                }

                debug!(question = %request.question, "truncated response, retrying over TCP");
                self.audit(settings, || AuditEvent::TcpFallback {
                    reason: "truncated response",
                });
                request.id = fresh_xid(Some(request.id));

                match self
                    .run_server_loop(&mut request, settings, servers, self.tcp.as_ref(), cancel)
                    .await?
                {
                    Verdict::Answered(response) => Ok(response),
                    Verdict::Truncated => Err(ResolveError::UnexpectedTruncatedOverTcp),
                }
            }
        }
    }

    /// One pass over the server list: per server, the cache is consulted
    /// and then up to `retries + 1` attempts are made before moving on.
    async fn run_server_loop(
        &self,
        request: &mut DnsRequest,
        settings: &QuerySettings,
        servers: &[Arc<NameServer>],
        transport: &dyn DnsTransport,
        cancel: &CancellationToken,
    ) -> Result<Verdict, ResolveError> {
        let cache_key = settings
            .use_cache
            .then(|| CacheKey::for_question(&request.question));
        let attempts = settings.attempts();
        let last_index = servers.len() - 1;
        let mut last_error: Option<ResolveError> = None;

        for (index, server) in servers.iter().enumerate() {
            let is_last_server = index == last_index;
            if index > 0 {
                request.id = fresh_xid(Some(request.id));
            }

            if let Some(key) = &cache_key {
                if let Some(hit) = self.cache.get(key) {
                    debug!(%key, server = %server, "cache hit");
                    self.audit(settings, || AuditEvent::CacheHit {
                        fingerprint: key.to_string(),
                        server: server.endpoint(),
                    });
                    return Ok(Verdict::Answered((*hit).clone()));
                }
            }

            let mut attempt: u32 = 1;
            loop {
                let is_last_try = attempt >= attempts;
                if attempt > 1 {
                    request.id = fresh_xid(Some(request.id));
                }
                if cancel.is_cancelled() {
                    return Err(ResolveError::Cancelled);
                }

                let outcome = self
                    .send_once(request, settings, server, transport, cancel, attempt)
                    .await;

                match self.dispatch(
                    outcome,
                    &cache_key,
                    settings,
                    server,
                    transport.protocol(),
                    attempt,
                    is_last_try,
                    is_last_server,
                ) {
                    Step::Return(verdict) => return Ok(verdict),
                    Step::RetrySameServer => {
                        attempt += 1;
                        continue;
                    }
                    Step::NextServer(error) => {
                        if let Some(error) = error {
                            last_error = Some(error);
                        }
                        break;
                    }
                    Step::Fail(error) => return Err(error),
                }
            }
        }

        // Only reachable when the last pass on the last server elected to
        // move on, which the dispatch table prevents; keep the best error
        // observed in case that invariant is ever loosened.
        Err(last_error.unwrap_or(ResolveError::EmptyServers))
    }

    /// Encodes, sends and decodes one attempt, verifying the echoed id.
    async fn send_once(
        &self,
        request: &DnsRequest,
        settings: &QuerySettings,
        server: &Arc<NameServer>,
        transport: &dyn DnsTransport,
        cancel: &CancellationToken,
        attempt: u32,
    ) -> Result<ResponseOutcome, ResolveError> {
        let wire = self.codec.encode(request)?;
        // A reply can be as large as the buffer our request advertised; the
        // server's own advertisement only ever grows the allocation.
        let max_response_size = match transport.protocol() {
            TransportProtocol::Udp => usize::from(
                request
                    .max_udp_payload()
                    .max(server.advertised_udp_payload().unwrap_or(0)),
            ),
            TransportProtocol::Tcp => u16::MAX as usize,
        };

        self.audit(settings, || AuditEvent::Attempt {
            server: server.endpoint(),
            protocol: transport.protocol(),
            attempt,
            xid: request.id,
        });

        let started = Instant::now();
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            reply = transport.exchange(
                server.endpoint(),
                &wire,
                settings.timeout,
                max_response_size,
            ) => reply?,
        };

        let response = self.codec.decode(&reply.bytes, server.endpoint())?;
        if response.id != request.id {
            return Err(ResolveError::XidMismatch {
                expected: request.id,
                actual: response.id,
            });
        }

        self.audit(settings, || AuditEvent::ResponseReceived {
            server: server.endpoint(),
            rcode: response.rcode,
            answers: response.answers.len(),
            truncated: response.truncated,
            latency: started.elapsed(),
        });

        Ok(ResponseInterpreter::interpret(
            response,
            &request.question,
            settings,
            server,
        ))
    }

    /// The per-error decision table: given one attempt's outcome, decide
    /// whether to return, retry the same server, rotate, or fail.
    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        &self,
        outcome: Result<ResponseOutcome, ResolveError>,
        cache_key: &Option<CacheKey>,
        settings: &QuerySettings,
        server: &Arc<NameServer>,
        protocol: TransportProtocol,
        attempt: u32,
        is_last_try: bool,
        is_last_server: bool,
    ) -> Step {
        match outcome {
            Ok(ResponseOutcome::Answered(response)) => {
                if let Some(key) = cache_key {
                    self.cache.put(key.clone(), &response, false, settings);
                }
                Step::Return(Verdict::Answered(response))
            }

            Ok(ResponseOutcome::Unanswered(response)) => {
                if is_last_server {
                    // Nothing left to rotate to; hand back what we got.
                    return Step::Return(Verdict::Answered(response));
                }
                debug!(server = %server, "question not answered, trying next server");
                Step::NextServer(None)
            }

            Ok(ResponseOutcome::Truncated) => Step::Return(Verdict::Truncated),

            Ok(ResponseOutcome::DnsError(response)) => {
                if !settings.continue_on_dns_error {
                    return self.finish_dns_error(response, cache_key, settings);
                }
                if response.rcode.is_retryable() && !is_last_try {
                    debug!(server = %server, rcode = %response.rcode, attempt, "retrying after server error");
                    return Step::RetrySameServer;
                }
                if !is_last_server {
                    debug!(server = %server, rcode = %response.rcode, "DNS error, trying next server");
                    return Step::NextServer(None);
                }
                self.finish_dns_error(response, cache_key, settings)
            }

            Err(error) => {
                self.audit(settings, || AuditEvent::AttemptFailed {
                    server: server.endpoint(),
                    attempt,
                    message: error.to_string(),
                });
                self.dispatch_error(error, server, protocol, is_last_try, is_last_server)
            }
        }
    }

    fn dispatch_error(
        &self,
        error: ResolveError,
        server: &Arc<NameServer>,
        protocol: TransportProtocol,
        is_last_try: bool,
        is_last_server: bool,
    ) -> Step {
        match &error {
            ResolveError::Cancelled => Step::Fail(error),

            // Timeouts, transient I/O and id mismatches: exhaust the retry
            // budget on this server, then rotate; fail only when there is
            // nowhere left to go.
            ResolveError::Timeout { .. }
            | ResolveError::TransientIo { .. }
            | ResolveError::XidMismatch { .. } => {
                if !is_last_try {
                    debug!(server = %server, error = %error, "retrying same server");
                    return Step::RetrySameServer;
                }
                if is_last_server {
                    return Step::Fail(error);
                }
                warn!(server = %server, error = %error, "giving up on server");
                Step::NextServer(Some(error))
            }

            // A datagram that cannot be decoded but is short or was cut off
            // mid-record is truncation in disguise: the server sent more
            // than fit.
            ResolveError::Malformed {
                data_length,
                overrun,
            } => {
                if protocol == TransportProtocol::Udp && (*data_length <= 512 || *overrun) {
                    debug!(server = %server, data_length, "short or cut-off datagram, treating as truncated");
                    return Step::Return(Verdict::Truncated);
                }
                if is_last_server {
                    return Step::Fail(error);
                }
                warn!(server = %server, error = %error, "malformed response, trying next server");
                Step::NextServer(Some(error))
            }

            // Argument and programmer-state errors propagate untouched.
            _ if error.is_argument_error() => Step::Fail(error),

            // Anything else is an unexpected failure: never retried on the
            // same server.
            _ => {
                if is_last_server {
                    let error = match error {
                        failure @ ResolveError::ConnectionFailure { .. } => failure,
                        other => ResolveError::ConnectionFailure {
                            server: server.endpoint(),
                            message: other.to_string(),
                        },
                    };
                    return Step::Fail(error);
                }
                warn!(server = %server, error = %error, "unexpected failure, trying next server");
                Step::NextServer(Some(error))
            }
        }
    }

    /// Terminal handling for a DNS error response: optionally cache it
    /// negatively, then either throw or hand the response back with its
    /// error code intact.
    fn finish_dns_error(
        &self,
        response: DnsResponse,
        cache_key: &Option<CacheKey>,
        settings: &QuerySettings,
    ) -> Step {
        if settings.cache_failed_results {
            if let Some(key) = cache_key {
                self.cache.put(key.clone(), &response, true, settings);
            }
        }
        if settings.throw_dns_errors {
            return Step::Fail(ResolveError::Dns {
                rcode: response.rcode,
            });
        }
        Step::Return(Verdict::Answered(response))
    }

    fn audit(&self, settings: &QuerySettings, event: impl FnOnce() -> AuditEvent) {
        if settings.enable_audit_trail {
            self.audit.record(event());
        }
    }
}
