use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use warden_dns_domain::{DnsRewrite, FilterError, RecordType};

/// Input to a DNS rule matcher: the query plus the client identity the rule
/// dialect can constrain on.
#[derive(Debug, Clone)]
pub struct MatchRequest<'a> {
    pub hostname: &'a str,
    pub sorted_client_tags: &'a [String],
    pub client_ip: Option<IpAddr>,
    pub client_name: Option<&'a str>,
    pub qtype: RecordType,
}

/// Common surface of every matched rule handle.
pub trait RuleInfo: Send + Sync {
    fn text(&self) -> &str;
    fn filter_list_id(&self) -> i64;
}

/// An adblock-style network rule.
pub trait NetworkRule: RuleInfo {
    /// True for `@@` exception rules.
    fn is_allowlist(&self) -> bool;

    /// The `$dnsrewrite` payload, if the rule carries one.
    fn dns_rewrite(&self) -> Option<&DnsRewrite>;
}

/// An `/etc/hosts`-syntax rule binding a name to an address.
pub trait HostRule: RuleInfo {
    fn ip(&self) -> IpAddr;
}

/// A standalone hostname predicate compiled from one rule line; used for
/// blocked-service rules.
pub trait HostnameRule: RuleInfo {
    fn is_match(&self, hostname: &str) -> bool;
}

/// Everything one matcher query produced. Rule handles are owned, but the
/// engine lock must still be held while they are consumed, so they never
/// escape the match path.
#[derive(Default, Clone)]
pub struct DnsMatch {
    /// The winning network rule, if any.
    pub network_rule: Option<Arc<dyn NetworkRule>>,
    pub host_rules_v4: Vec<Arc<dyn HostRule>>,
    pub host_rules_v6: Vec<Arc<dyn HostRule>>,

    /// Every matched rule carrying a `$dnsrewrite` payload, in list order.
    pub rewrite_rules: Vec<Arc<dyn NetworkRule>>,
}

impl DnsMatch {
    pub fn has_rules(&self) -> bool {
        self.network_rule.is_some()
            || !self.host_rules_v4.is_empty()
            || !self.host_rules_v6.is_empty()
    }
}

/// One rule list handed to the compiler: inline text or a file the compiler
/// may map or read as it sees fit. Cosmetic rules are always ignored.
#[derive(Debug, Clone)]
pub enum RuleList {
    Text { id: i64, text: String },
    File { id: i64, path: PathBuf },
}

/// A compiled rule storage plus its matcher. Owns the underlying file or
/// memory buffers; dropping it releases them.
pub trait DnsRuleSet: Send + Sync {
    /// Returns `None` when nothing matched at all. A `Some` with empty rule
    /// lists is an invariant violation the caller surfaces as an error.
    fn match_request(&self, req: &MatchRequest<'_>) -> Option<DnsMatch>;

    fn rule_count(&self) -> usize;
}

/// The rule-list compiler.
pub trait RuleCompiler: Send + Sync {
    fn compile(&self, lists: Vec<RuleList>) -> Result<Box<dyn DnsRuleSet>, FilterError>;

    /// Compiles a single rule line into a hostname predicate.
    fn compile_hostname_rule(
        &self,
        text: &str,
        filter_list_id: i64,
    ) -> Result<Arc<dyn HostnameRule>, FilterError>;
}
