use crate::observer::PipelineObserver;
use crate::parse::SubdomainSet;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use tracing::{debug, trace};

pub const RESOLVE_DNS_TIMEOUT_MS: u64 = 4000;

#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolves(&self, host: &str) -> bool;
}

pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    pub fn new() -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_millis(RESOLVE_DNS_TIMEOUT_MS);
        debug!("DNS resolver options: {:?}", opts);
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);

        Self { resolver }
    }
}

#[async_trait]
impl HostResolver for DnsResolver {
    async fn resolves(&self, host: &str) -> bool {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup_ip) => {
                trace!("{:12} - {} {:?}", "RESOLVED", host, lookup_ip);
                true
            }
            Err(err) => {
                trace!("{:12} - {} {}", "NOT RESOLVED", host, err);
                false
            }
        }
    }
}

/// Drops hosts that do not resolve, one lookup at a time.
/// Returns the survivors and the number dropped.
pub async fn retain_resolving(
    subdomains: SubdomainSet,
    resolver: &dyn HostResolver,
    observer: &dyn PipelineObserver,
) -> (SubdomainSet, usize) {
    let total = subdomains.len();
    let mut resolved = SubdomainSet::with_capacity(total);

    for host in subdomains {
        if resolver.resolves(&host).await {
            resolved.insert(host);
        }
    }

    let unresolved = total - resolved.len();
    observer.dns_check_completed(resolved.len(), unresolved);
    (resolved, unresolved)
}
