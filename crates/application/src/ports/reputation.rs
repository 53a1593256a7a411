use async_trait::async_trait;
use warden_dns_domain::{CheckResult, FilterError};

/// A reputation lookup service (safe browsing, parental control).
/// Implementations bring their own cache and upstream transport and return
/// a fully populated result on a hit, or an unmatched result otherwise.
#[async_trait]
pub trait ReputationChecker: Send + Sync {
    async fn check(&self, host: &str) -> Result<CheckResult, FilterError>;
}
