use async_trait::async_trait;
use dns_lookup::{getaddrinfo, AddrFamily, AddrInfoHints, SockType};
use std::fmt;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub code: String,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl std::error::Error for ResolveError {}

#[async_trait]
pub trait Resolver: Send + Sync {
    /// IPv4 addresses for `host`, without duplicates.
    async fn resolve_ipv4(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// getaddrinfo(3) restricted to IPv4 stream sockets.
#[derive(Debug, Default, Clone)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve_ipv4(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let host = host.to_string();
        tokio::task::spawn_blocking(move || lookup_ipv4(&host))
            .await
            .map_err(|err| ResolveError {
                code: format!("resolver task failed: {err}"),
            })?
    }
}

fn lookup_ipv4(host: &str) -> Result<Vec<IpAddr>, ResolveError> {
    let hints = AddrInfoHints {
        socktype: SockType::Stream.into(),
        address: AddrFamily::Inet.into(),
        ..AddrInfoHints::default()
    };
    let entries = getaddrinfo(Some(host), None, Some(hints)).map_err(|err| ResolveError {
        code: format!("{:?}", err.kind()),
    })?;

    let mut addrs = Vec::new();
    for entry in entries {
        match entry {
            Ok(info) => addrs.push(info.sockaddr.ip()),
            Err(err) => tracing::debug!(%host, error = %err, "skipping unreadable address entry"),
        }
    }
    Ok(dedup_ipv4(addrs))
}

pub(crate) fn dedup_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut unique: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if addr.is_ipv4() && !unique.contains(&addr) {
            unique.push(addr);
        }
    }
    unique
}
