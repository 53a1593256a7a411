use super::ip_resolver::IpResolver;
use async_trait::async_trait;
use warden_dns_domain::{CheckResult, FilterError, RecordType};

/// Safe-search rewriting. On a hit the implementation resolves the
/// engine-specific replacement host through `resolver` and returns a
/// `FilteredSafeSearch` result carrying the replacement addresses.
#[async_trait]
pub trait SafeSearchChecker: Send + Sync {
    async fn check(
        &self,
        host: &str,
        qtype: RecordType,
        resolver: &dyn IpResolver,
    ) -> Result<CheckResult, FilterError>;
}
