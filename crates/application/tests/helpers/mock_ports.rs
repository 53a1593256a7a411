#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use warden_dns_application::ports::{
    DnsMatch, DnsRuleSet, HostRule, HostnameRule, HostsContainer, IpResolver, MatchRequest,
    NetworkRule, ReputationChecker, RuleCompiler, RuleInfo, RuleList, SafeSearchChecker,
};
use warden_dns_domain::{CheckResult, DnsRewrite, FilterError, RecordType};

// ============================================================================
// Rule handles
// ============================================================================

pub struct SimpleNetworkRule {
    pub text: String,
    pub filter_list_id: i64,
    pub allow: bool,
    pub rewrite: Option<DnsRewrite>,
}

impl SimpleNetworkRule {
    pub fn block(text: &str, filter_list_id: i64) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            filter_list_id,
            allow: false,
            rewrite: None,
        })
    }

    pub fn allow(text: &str, filter_list_id: i64) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            filter_list_id,
            allow: true,
            rewrite: None,
        })
    }

    pub fn rewrite(text: &str, filter_list_id: i64, rewrite: DnsRewrite) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            filter_list_id,
            allow: false,
            rewrite: Some(rewrite),
        })
    }
}

impl RuleInfo for SimpleNetworkRule {
    fn text(&self) -> &str {
        &self.text
    }

    fn filter_list_id(&self) -> i64 {
        self.filter_list_id
    }
}

impl NetworkRule for SimpleNetworkRule {
    fn is_allowlist(&self) -> bool {
        self.allow
    }

    fn dns_rewrite(&self) -> Option<&DnsRewrite> {
        self.rewrite.as_ref()
    }
}

pub struct SimpleHostRule {
    pub text: String,
    pub filter_list_id: i64,
    pub ip: IpAddr,
}

impl SimpleHostRule {
    pub fn new(text: &str, filter_list_id: i64, ip: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            filter_list_id,
            ip: ip.parse().unwrap(),
        })
    }
}

impl RuleInfo for SimpleHostRule {
    fn text(&self) -> &str {
        &self.text
    }

    fn filter_list_id(&self) -> i64 {
        self.filter_list_id
    }
}

impl HostRule for SimpleHostRule {
    fn ip(&self) -> IpAddr {
        self.ip
    }
}

struct DomainHostnameRule {
    text: String,
    filter_list_id: i64,
    domain: String,
}

impl RuleInfo for DomainHostnameRule {
    fn text(&self) -> &str {
        &self.text
    }

    fn filter_list_id(&self) -> i64 {
        self.filter_list_id
    }
}

impl HostnameRule for DomainHostnameRule {
    fn is_match(&self, hostname: &str) -> bool {
        hostname == self.domain
            || (hostname.ends_with(&self.domain)
                && hostname.as_bytes()[hostname.len() - self.domain.len() - 1] == b'.')
    }
}

// ============================================================================
// Mock rule set and compiler
// ============================================================================

/// A programmable rule set keyed by exact hostname.
#[derive(Default)]
pub struct MockRuleSet {
    responses: HashMap<String, DnsMatch>,
    /// When set, every query matches with an empty result, emulating a
    /// broken engine.
    pub empty_match: bool,
}

impl MockRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: &str, m: DnsMatch) {
        self.responses.insert(host.to_string(), m);
    }

    pub fn with_block(mut self, host: &str, text: &str, filter_list_id: i64) -> Self {
        self.insert(
            host,
            DnsMatch {
                network_rule: Some(SimpleNetworkRule::block(text, filter_list_id)),
                ..DnsMatch::default()
            },
        );
        self
    }
}

impl DnsRuleSet for MockRuleSet {
    fn match_request(&self, req: &MatchRequest<'_>) -> Option<DnsMatch> {
        if self.empty_match {
            return Some(DnsMatch::default());
        }

        self.responses.get(req.hostname).cloned()
    }

    fn rule_count(&self) -> usize {
        self.responses.len()
    }
}

/// A compiler that understands a toy one-entry-per-line dialect:
///
/// - `host`: exact block rule
/// - `@@host`: exact allow rule
/// - `host=IP`: host rule binding `host` to `IP`
/// - `!empty-match`: the compiled set claims a match with no rules
///
/// Compiles can be made to fail, and every compile is counted.
#[derive(Default)]
pub struct MockCompiler {
    pub fail: AtomicBool,
    pub compiles: AtomicUsize,
    pub last_lists: Mutex<Vec<RuleList>>,
}

impl MockCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl RuleCompiler for MockCompiler {
    fn compile(&self, lists: Vec<RuleList>) -> Result<Box<dyn DnsRuleSet>, FilterError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(FilterError::Compile("mock compile failure".into()));
        }

        let mut set = MockRuleSet::new();
        for list in &lists {
            let (id, text) = match list {
                RuleList::Text { id, text } => (*id, text.clone()),
                RuleList::File { id, path } => (
                    *id,
                    std::fs::read_to_string(path).map_err(|e| FilterError::ListRead {
                        path: path.clone(),
                        source: e,
                    })?,
                ),
            };

            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                if line == "!empty-match" {
                    set.empty_match = true;
                } else if let Some(host) = line.strip_prefix("@@") {
                    set.insert(
                        host,
                        DnsMatch {
                            network_rule: Some(SimpleNetworkRule::allow(line, id)),
                            ..DnsMatch::default()
                        },
                    );
                } else if let Some((host, ip)) = line.split_once('=') {
                    let ip: IpAddr = ip.parse().unwrap();
                    let rule = SimpleHostRule::new(line, id, &ip.to_string());
                    let mut m = DnsMatch::default();
                    if ip.is_ipv4() {
                        m.host_rules_v4.push(rule);
                    } else {
                        m.host_rules_v6.push(rule);
                    }
                    set.insert(host, m);
                } else {
                    set.insert(
                        line,
                        DnsMatch {
                            network_rule: Some(SimpleNetworkRule::block(line, id)),
                            ..DnsMatch::default()
                        },
                    );
                }
            }
        }

        *self.last_lists.lock().unwrap() = lists;

        Ok(Box::new(set))
    }

    fn compile_hostname_rule(
        &self,
        text: &str,
        filter_list_id: i64,
    ) -> Result<Arc<dyn HostnameRule>, FilterError> {
        let domain = text
            .trim_start_matches("||")
            .trim_end_matches('^')
            .to_string();

        Ok(Arc::new(DomainHostnameRule {
            text: text.to_string(),
            filter_list_id,
            domain,
        }))
    }
}

// ============================================================================
// Mock hosts container
// ============================================================================

#[derive(Default)]
pub struct MockHostsContainer {
    responses: HashMap<String, DnsMatch>,
    translations: HashMap<String, String>,
}

impl MockHostsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hosts entry answering `host` with `ip`.
    pub fn with_addr(mut self, host: &str, rule_text: &str, ip: &str) -> Self {
        self.responses.insert(
            host.to_string(),
            DnsMatch {
                rewrite_rules: vec![SimpleNetworkRule::rewrite(
                    rule_text,
                    warden_dns_domain::SYS_HOSTS_LIST_ID,
                    DnsRewrite::addr(ip.parse().unwrap()),
                )],
                ..DnsMatch::default()
            },
        );
        self
    }

    /// Adds a hosts alias from `host` to `target`.
    pub fn with_alias(mut self, host: &str, rule_text: &str, target: &str) -> Self {
        self.responses.insert(
            host.to_string(),
            DnsMatch {
                rewrite_rules: vec![SimpleNetworkRule::rewrite(
                    rule_text,
                    warden_dns_domain::SYS_HOSTS_LIST_ID,
                    DnsRewrite::cname(target),
                )],
                ..DnsMatch::default()
            },
        );
        self
    }

    pub fn with_translation(mut self, rule_text: &str, original: &str) -> Self {
        self.translations
            .insert(rule_text.to_string(), original.to_string());
        self
    }
}

impl HostsContainer for MockHostsContainer {
    fn match_request(&self, req: &MatchRequest<'_>) -> Option<DnsMatch> {
        self.responses.get(req.hostname).cloned()
    }

    fn translate(&self, rule_text: &str) -> Option<String> {
        self.translations.get(rule_text).cloned()
    }
}

// ============================================================================
// Mock reputation and safe-search checkers
// ============================================================================

pub struct MockReputationChecker {
    result: Mutex<Option<CheckResult>>,
    pub calls: AtomicUsize,
    fail: bool,
}

impl MockReputationChecker {
    pub fn hit(result: CheckResult) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(result)),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn miss() -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(None),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(None),
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReputationChecker for MockReputationChecker {
    async fn check(&self, _host: &str) -> Result<CheckResult, FilterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(FilterError::Upstream("mock lookup failed".into()));
        }

        Ok(self
            .result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }
}

pub struct MockSafeSearch {
    result: CheckResult,
}

impl MockSafeSearch {
    pub fn hit(result: CheckResult) -> Arc<Self> {
        Arc::new(Self { result })
    }
}

#[async_trait]
impl SafeSearchChecker for MockSafeSearch {
    async fn check(
        &self,
        _host: &str,
        _qtype: RecordType,
        _resolver: &dyn IpResolver,
    ) -> Result<CheckResult, FilterError> {
        Ok(self.result.clone())
    }
}
