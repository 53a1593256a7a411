use super::parser::NetworkRuleData;
use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use warden_dns_application::ports::{
    DnsMatch, DnsRuleSet, HostRule, HostnameRule, MatchRequest, NetworkRule, RuleInfo,
};
use warden_dns_domain::DnsRewrite;

type RuleIndex = HashMap<CompactString, SmallVec<[u32; 2]>, FxBuildHasher>;

pub(crate) struct StoredNetworkRule {
    text: Arc<str>,
    filter_list_id: i64,
    data: NetworkRuleData,
}

impl StoredNetworkRule {
    pub fn new(data: NetworkRuleData, filter_list_id: i64) -> Self {
        Self {
            text: Arc::from(data.text.as_str()),
            filter_list_id,
            data,
        }
    }

    fn accepts_client(&self, req: &MatchRequest<'_>) -> bool {
        if !self.data.clients.is_empty() {
            let by_name = req
                .client_name
                .is_some_and(|n| self.data.clients.iter().any(|c| c == &n.to_lowercase()));
            let by_ip = req
                .client_ip
                .is_some_and(|ip| self.data.clients.iter().any(|c| *c == ip.to_string()));

            if !by_name && !by_ip {
                return false;
            }
        }

        if !self.data.ctags.is_empty() {
            let tagged = self
                .data
                .ctags
                .iter()
                .any(|t| req.sorted_client_tags.binary_search(t).is_ok());

            if !tagged {
                return false;
            }
        }

        true
    }
}

impl RuleInfo for StoredNetworkRule {
    fn text(&self) -> &str {
        &self.text
    }

    fn filter_list_id(&self) -> i64 {
        self.filter_list_id
    }
}

impl NetworkRule for StoredNetworkRule {
    fn is_allowlist(&self) -> bool {
        self.data.allow
    }

    fn dns_rewrite(&self) -> Option<&DnsRewrite> {
        self.data.dns_rewrite.as_ref()
    }
}

impl HostnameRule for StoredNetworkRule {
    fn is_match(&self, hostname: &str) -> bool {
        self.data.matches_domain(hostname)
    }
}

struct StoredHostRule {
    text: Arc<str>,
    filter_list_id: i64,
    ip: IpAddr,
}

impl RuleInfo for StoredHostRule {
    fn text(&self) -> &str {
        &self.text
    }

    fn filter_list_id(&self) -> i64 {
        self.filter_list_id
    }
}

impl HostRule for StoredHostRule {
    fn ip(&self) -> IpAddr {
        self.ip
    }
}

/// A compiled, immutable rule storage with its matcher. Network rules are
/// keyed by their anchor domain and found by walking the query's label
/// suffixes; host rules are exact-keyed.
#[derive(Default)]
pub(crate) struct CompiledRuleSet {
    network_rules: Vec<Arc<StoredNetworkRule>>,
    net_index: RuleIndex,

    host_rules: Vec<Arc<StoredHostRule>>,
    host_index: RuleIndex,
}

impl CompiledRuleSet {
    pub fn add_network_rule(&mut self, data: NetworkRuleData, filter_list_id: i64) {
        let idx = self.network_rules.len() as u32;
        let key = CompactString::new(&data.domain);
        self.network_rules
            .push(Arc::new(StoredNetworkRule::new(data, filter_list_id)));
        self.net_index.entry(key).or_default().push(idx);
    }

    pub fn add_host_rule(&mut self, text: &str, hostname: &str, ip: IpAddr, filter_list_id: i64) {
        let idx = self.host_rules.len() as u32;
        self.host_rules.push(Arc::new(StoredHostRule {
            text: Arc::from(text),
            filter_list_id,
            ip,
        }));
        self.host_index
            .entry(CompactString::new(hostname))
            .or_default()
            .push(idx);
    }

    /// Network rules applicable to the hostname, in list order.
    fn candidate_network_rules(&self, req: &MatchRequest<'_>) -> Vec<Arc<StoredNetworkRule>> {
        let mut indices: SmallVec<[u32; 8]> = SmallVec::new();

        for suffix in domain_suffixes(req.hostname) {
            let Some(found) = self.net_index.get(suffix) else {
                continue;
            };

            for &idx in found {
                let rule = &self.network_rules[idx as usize];
                if rule.data.matches_domain(req.hostname) && rule.accepts_client(req) {
                    indices.push(idx);
                }
            }
        }

        indices.sort_unstable();
        indices
            .into_iter()
            .map(|idx| Arc::clone(&self.network_rules[idx as usize]))
            .collect()
    }
}

impl DnsRuleSet for CompiledRuleSet {
    fn match_request(&self, req: &MatchRequest<'_>) -> Option<DnsMatch> {
        let candidates = self.candidate_network_rules(req);

        let mut rewrite_rules: Vec<Arc<dyn NetworkRule>> = Vec::new();
        let mut plain: Vec<Arc<StoredNetworkRule>> = Vec::new();
        for rule in candidates {
            if rule.data.dns_rewrite.is_some() {
                rewrite_rules.push(rule);
            } else {
                plain.push(rule);
            }
        }

        // Exception rules win over block rules within one storage.
        let mut network_rule: Option<Arc<dyn NetworkRule>> = None;
        if let Some(rule) = plain.iter().find(|r| r.data.allow).or_else(|| plain.first()) {
            network_rule = Some(Arc::clone(rule) as Arc<dyn NetworkRule>);
        }

        let mut host_rules_v4: Vec<Arc<dyn HostRule>> = Vec::new();
        let mut host_rules_v6: Vec<Arc<dyn HostRule>> = Vec::new();
        if let Some(found) = self.host_index.get(req.hostname) {
            for &idx in found {
                let rule = &self.host_rules[idx as usize];
                match rule.ip {
                    IpAddr::V4(_) => host_rules_v4.push(Arc::clone(rule) as Arc<dyn HostRule>),
                    IpAddr::V6(_) => host_rules_v6.push(Arc::clone(rule) as Arc<dyn HostRule>),
                }
            }
        }

        if network_rule.is_none()
            && rewrite_rules.is_empty()
            && host_rules_v4.is_empty()
            && host_rules_v6.is_empty()
        {
            return None;
        }

        Some(DnsMatch {
            network_rule,
            host_rules_v4,
            host_rules_v6,
            rewrite_rules,
        })
    }

    fn rule_count(&self) -> usize {
        self.network_rules.len() + self.host_rules.len()
    }
}

/// The query name and every parent domain, shortest-label-stripped first:
/// `a.b.c` yields `a.b.c`, `b.c`, `c`.
fn domain_suffixes(hostname: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(hostname), |current| {
        current.find('.').map(|pos| &current[pos + 1..])
    })
    .filter(|s| !s.is_empty())
}
