mod hosts_container;
mod ip_resolver;
mod reputation;
mod rule_engine;
mod safe_search;

pub use hosts_container::HostsContainer;
pub use ip_resolver::IpResolver;
pub use reputation::ReputationChecker;
pub use rule_engine::{
    DnsMatch, DnsRuleSet, HostRule, HostnameRule, MatchRequest, NetworkRule, RuleCompiler,
    RuleInfo, RuleList,
};
pub use safe_search::SafeSearchChecker;
