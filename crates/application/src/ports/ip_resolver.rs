use async_trait::async_trait;
use std::net::IpAddr;
use warden_dns_domain::{FilterError, RecordType};

/// Address lookup used by the safe-search checker to resolve replacement
/// hosts. `qtype` restricts the address family (`A` or `AAAA`).
#[async_trait]
pub trait IpResolver: Send + Sync {
    async fn lookup_ip(&self, qtype: RecordType, host: &str) -> Result<Vec<IpAddr>, FilterError>;
}
