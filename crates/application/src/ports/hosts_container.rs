use super::rule_engine::{DnsMatch, MatchRequest};

/// Container of IP-hostname pairs taken from the operating system's
/// configuration files (`/etc/hosts` and friends). Matches are delivered as
/// rewrite rules in the same shape the rule engine produces.
pub trait HostsContainer: Send + Sync {
    fn match_request(&self, req: &MatchRequest<'_>) -> Option<DnsMatch>;

    /// Maps a generated rule text back to the original hosts-file line for
    /// display. Returns `None` when the text is not one of the container's.
    fn translate(&self, rule_text: &str) -> Option<String>;
}
