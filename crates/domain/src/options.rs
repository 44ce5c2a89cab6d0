use crate::errors::OptionsError;
use crate::server::ServerEndpoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for every configurable duration. Matches the widest timer
/// most platforms accept (`i32::MAX` milliseconds, a little under 25 days).
pub const MAX_DURATION: Duration = Duration::from_millis(i32::MAX as u64);

/// Hard floor and ceiling for the EDNS buffer size advertised in requests.
pub const MIN_EDNS_BUFFER: u16 = 512;
pub const MAX_EDNS_BUFFER: u16 = 4096;

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_retries() -> u32 {
    2
}

fn default_timeout() -> Option<Duration> {
    Some(Duration::from_secs(5))
}

fn default_edns_buffer() -> u16 {
    4096
}

fn default_failed_cache_duration() -> Duration {
    Duration::from_secs(5)
}

/// Client-level resolver configuration. Every recognized option with its
/// default; `None` on a timeout means "infinite".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// User-supplied name servers, tried in order (or shuffled, see
    /// `use_random_name_server`). Discovery-provided servers are appended
    /// when `auto_resolve_name_servers` is set.
    #[serde(default)]
    pub servers: Vec<ServerEndpoint>,

    /// Sets the RD bit on outgoing queries.
    #[serde(default = "default_true")]
    pub recursion: bool,

    /// Enables response cache reads and writes.
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Emit structured audit events for every step of a query.
    #[serde(default = "default_false")]
    pub enable_audit_trail: bool,

    /// Additional tries per server; total attempts per server = retries + 1.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Surface DNS error responses as failures instead of returning the
    /// response.
    #[serde(default = "default_false")]
    pub throw_dns_errors: bool,

    /// Deadline applied to each single transport invocation, not the whole
    /// call. `None` means no deadline.
    #[serde(default = "default_timeout")]
    pub timeout: Option<Duration>,

    /// Permit the one-shot UDP to TCP escalation on truncation.
    #[serde(default = "default_true")]
    pub use_tcp_fallback: bool,

    /// Skip UDP entirely and query over TCP from the start.
    #[serde(default = "default_false")]
    pub use_tcp_only: bool,

    /// Try the next server when one returns a DNS error response.
    #[serde(default = "default_true")]
    pub continue_on_dns_error: bool,

    /// Try the next server when a response does not answer the question.
    #[serde(default = "default_true")]
    pub continue_on_empty_response: bool,

    /// Shuffle the roster once per query.
    #[serde(default = "default_true")]
    pub use_random_name_server: bool,

    /// EDNS buffer size; clamped to [512, 4096]. EDNS is included when this
    /// exceeds 512 or DNSSEC records are requested.
    #[serde(default = "default_edns_buffer")]
    pub extended_dns_buffer_size: u16,

    /// Set the DO bit, forcing EDNS on.
    #[serde(default = "default_false")]
    pub request_dnssec_records: bool,

    /// Cache DNS error responses as negative entries.
    #[serde(default = "default_false")]
    pub cache_failed_results: bool,

    /// TTL applied to negative cache entries.
    #[serde(default = "default_failed_cache_duration")]
    pub failed_results_cache_duration: Duration,

    /// Lower clamp on cache TTLs; zero or absent means unset.
    #[serde(default)]
    pub minimum_cache_timeout: Option<Duration>,

    /// Upper clamp on cache TTLs; zero or absent means unset.
    #[serde(default)]
    pub maximum_cache_timeout: Option<Duration>,

    /// Include discovery-provided name servers in the roster.
    #[serde(default = "default_true")]
    pub auto_resolve_name_servers: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            recursion: true,
            use_cache: true,
            enable_audit_trail: false,
            retries: default_retries(),
            throw_dns_errors: false,
            timeout: default_timeout(),
            use_tcp_fallback: true,
            use_tcp_only: false,
            continue_on_dns_error: true,
            continue_on_empty_response: true,
            use_random_name_server: true,
            extended_dns_buffer_size: default_edns_buffer(),
            request_dnssec_records: false,
            cache_failed_results: false,
            failed_results_cache_duration: default_failed_cache_duration(),
            minimum_cache_timeout: None,
            maximum_cache_timeout: None,
            auto_resolve_name_servers: true,
        }
    }
}

impl ResolverOptions {
    /// Checks the duration bounds. Zero cache clamps are tolerated here and
    /// normalized away in [`effective`](Self::effective).
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_bounded("timeout", self.timeout, false)?;
        check_bounded(
            "failed_results_cache_duration",
            Some(self.failed_results_cache_duration),
            false,
        )?;
        check_bounded("minimum_cache_timeout", self.minimum_cache_timeout, true)?;
        check_bounded("maximum_cache_timeout", self.maximum_cache_timeout, true)?;
        Ok(())
    }

    /// Composes the client options with per-query overrides into the
    /// immutable snapshot a single call runs with.
    pub fn effective(&self, overrides: Option<&QueryOptions>) -> QuerySettings {
        let pick = |field: &Option<bool>, base: bool| field.unwrap_or(base);
        let o = overrides;
        QuerySettings {
            recursion: o.map_or(self.recursion, |q| pick(&q.recursion, self.recursion)),
            use_cache: o.map_or(self.use_cache, |q| pick(&q.use_cache, self.use_cache)),
            enable_audit_trail: o.map_or(self.enable_audit_trail, |q| {
                pick(&q.enable_audit_trail, self.enable_audit_trail)
            }),
            retries: o.and_then(|q| q.retries).unwrap_or(self.retries),
            throw_dns_errors: o.map_or(self.throw_dns_errors, |q| {
                pick(&q.throw_dns_errors, self.throw_dns_errors)
            }),
            timeout: o.and_then(|q| q.timeout).map(Some).unwrap_or(self.timeout),
            use_tcp_fallback: o.map_or(self.use_tcp_fallback, |q| {
                pick(&q.use_tcp_fallback, self.use_tcp_fallback)
            }),
            use_tcp_only: o.map_or(self.use_tcp_only, |q| {
                pick(&q.use_tcp_only, self.use_tcp_only)
            }),
            continue_on_dns_error: o.map_or(self.continue_on_dns_error, |q| {
                pick(&q.continue_on_dns_error, self.continue_on_dns_error)
            }),
            continue_on_empty_response: o.map_or(self.continue_on_empty_response, |q| {
                pick(&q.continue_on_empty_response, self.continue_on_empty_response)
            }),
            use_random_name_server: o.map_or(self.use_random_name_server, |q| {
                pick(&q.use_random_name_server, self.use_random_name_server)
            }),
            extended_dns_buffer_size: o
                .and_then(|q| q.extended_dns_buffer_size)
                .unwrap_or(self.extended_dns_buffer_size),
            request_dnssec_records: o.map_or(self.request_dnssec_records, |q| {
                pick(&q.request_dnssec_records, self.request_dnssec_records)
            }),
            cache_failed_results: o.map_or(self.cache_failed_results, |q| {
                pick(&q.cache_failed_results, self.cache_failed_results)
            }),
            failed_results_cache_duration: o
                .and_then(|q| q.failed_results_cache_duration)
                .unwrap_or(self.failed_results_cache_duration),
            minimum_cache_timeout: normalize_clamp(self.minimum_cache_timeout),
            maximum_cache_timeout: normalize_clamp(self.maximum_cache_timeout),
            auto_resolve_name_servers: o.map_or(self.auto_resolve_name_servers, |q| {
                pick(&q.auto_resolve_name_servers, self.auto_resolve_name_servers)
            }),
        }
    }
}

/// Zero clamps mean "unset".
fn normalize_clamp(value: Option<Duration>) -> Option<Duration> {
    value.filter(|d| !d.is_zero())
}

fn check_bounded(
    field: &'static str,
    value: Option<Duration>,
    zero_means_unset: bool,
) -> Result<(), OptionsError> {
    let Some(value) = value else { return Ok(()) };
    if value.is_zero() {
        if zero_means_unset {
            return Ok(());
        }
        return Err(OptionsError::NotPositive { field });
    }
    if value > MAX_DURATION {
        return Err(OptionsError::TooLarge {
            field,
            max: MAX_DURATION,
        });
    }
    Ok(())
}

/// Per-query overrides. Unset fields inherit the client options. A
/// non-empty `servers` list replaces the roster for this query and
/// suppresses discovery entirely; it is never merged with auto-resolved
/// servers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub servers: Vec<ServerEndpoint>,
    #[serde(default)]
    pub recursion: Option<bool>,
    #[serde(default)]
    pub use_cache: Option<bool>,
    #[serde(default)]
    pub enable_audit_trail: Option<bool>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub throw_dns_errors: Option<bool>,
    #[serde(default)]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub use_tcp_fallback: Option<bool>,
    #[serde(default)]
    pub use_tcp_only: Option<bool>,
    #[serde(default)]
    pub continue_on_dns_error: Option<bool>,
    #[serde(default)]
    pub continue_on_empty_response: Option<bool>,
    #[serde(default)]
    pub use_random_name_server: Option<bool>,
    #[serde(default)]
    pub extended_dns_buffer_size: Option<u16>,
    #[serde(default)]
    pub request_dnssec_records: Option<bool>,
    #[serde(default)]
    pub cache_failed_results: Option<bool>,
    #[serde(default)]
    pub failed_results_cache_duration: Option<Duration>,
    #[serde(default)]
    pub auto_resolve_name_servers: Option<bool>,
}

/// The effective settings snapshot for one call. Captured before the first
/// send; mutating the originating options afterwards has no effect on the
/// query in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub recursion: bool,
    pub use_cache: bool,
    pub enable_audit_trail: bool,
    pub retries: u32,
    pub throw_dns_errors: bool,
    pub timeout: Option<Duration>,
    pub use_tcp_fallback: bool,
    pub use_tcp_only: bool,
    pub continue_on_dns_error: bool,
    pub continue_on_empty_response: bool,
    pub use_random_name_server: bool,
    pub extended_dns_buffer_size: u16,
    pub request_dnssec_records: bool,
    pub cache_failed_results: bool,
    pub failed_results_cache_duration: Duration,
    pub minimum_cache_timeout: Option<Duration>,
    pub maximum_cache_timeout: Option<Duration>,
    pub auto_resolve_name_servers: bool,
}

impl QuerySettings {
    /// Total tries per server.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// EDNS goes on the wire iff the buffer exceeds the classic 512-byte
    /// limit or DNSSEC records were requested.
    pub fn edns_enabled(&self) -> bool {
        self.extended_dns_buffer_size > MIN_EDNS_BUFFER || self.request_dnssec_records
    }

    /// The advertised buffer size, clamped to [512, 4096].
    pub fn udp_payload_size(&self) -> u16 {
        self.extended_dns_buffer_size
            .clamp(MIN_EDNS_BUFFER, MAX_EDNS_BUFFER)
    }

    /// Re-check bounds after per-query overrides were applied.
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_bounded("timeout", self.timeout, false)?;
        check_bounded(
            "failed_results_cache_duration",
            Some(self.failed_results_cache_duration),
            false,
        )?;
        Ok(())
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        ResolverOptions::default().effective(None)
    }
}
