//! Discovery from `/etc/resolv.conf`. Only the `nameserver` directive is
//! interesting to the roster; search domains and options belong to name
//! qualification, which this resolver does not do.

use async_trait::async_trait;
use ferrous_resolver_application::ports::ServerDiscovery;
use ferrous_resolver_domain::{ResolveError, ServerEndpoint};
use std::path::PathBuf;
use tracing::debug;

pub struct SystemDiscovery {
    path: PathBuf,
}

impl SystemDiscovery {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("/etc/resolv.conf"),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for SystemDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServerDiscovery for SystemDiscovery {
    #[cfg(unix)]
    async fn discover(&self) -> Result<Vec<ServerEndpoint>, ResolveError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ResolveError::Discovery(format!("{}: {}", self.path.display(), e)))?;
        let servers = parse_resolv_conf(&contents);
        debug!(
            path = %self.path.display(),
            count = servers.len(),
            "parsed system resolver configuration"
        );
        Ok(servers)
    }

    #[cfg(not(unix))]
    async fn discover(&self) -> Result<Vec<ServerEndpoint>, ResolveError> {
        Ok(Vec::new())
    }
}

fn parse_resolv_conf(contents: &str) -> Vec<ServerEndpoint> {
    let mut servers = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut words = line.split_whitespace();
        if words.next() != Some("nameserver") {
            continue;
        }
        let Some(address) = words.next() else {
            continue;
        };
        match address.parse::<ServerEndpoint>() {
            Ok(endpoint) => servers.push(endpoint),
            Err(_) => debug!(address, "skipping unparseable nameserver entry"),
        }
    }
    servers
}
