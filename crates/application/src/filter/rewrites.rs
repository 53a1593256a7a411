use super::DnsFilter;
use crate::ports::NetworkRule;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use warden_dns_domain::{
    CheckResult, DnsRewriteResult, Reason, RecordType, ResponseCode, ResultRule, RewriteValue,
};

impl DnsFilter {
    /// Resolves the user rewrite table for one query.
    ///
    /// Walks the CNAME chain while the first matching entry is a CNAME,
    /// re-querying the table for each target; only the last target is
    /// reported as the canonical name. An entry answering with its own
    /// domain, or an address entry without an address, is an exception that
    /// resets the result to unmatched. A chain revisiting a host stops where
    /// it is, keeping whatever was accumulated.
    pub(crate) fn process_rewrites(&self, host: &str, qtype: RecordType) -> CheckResult {
        let state = self.state.read().unwrap();

        let mut rr = state.rewrites.find(host, qtype);

        let mut res = CheckResult::default();
        if !rr.is_empty() {
            res.reason = Reason::Rewritten;
        }

        let orig_host = host;
        let mut host = host.to_string();
        let mut cnames = HashSet::new();
        cnames.insert(host.clone());

        while rr.first().is_some_and(|r| r.rtype() == RecordType::CNAME) {
            let answer = rr[0].answer.clone();
            debug!(host = %host, cname = %answer, "rewrite: cname chain step");

            if host == answer {
                // An entry rewriting a host to itself suppresses rewriting.
                res.reason = Reason::NotFilteredNotFound;

                return res;
            }

            host = answer;
            if cnames.contains(&host) {
                info!(
                    host = %host,
                    question = %orig_host,
                    "rewrite: breaking cname redirection loop"
                );

                return res;
            }

            cnames.insert(host.clone());
            res.canon_name = Some(host.clone());
            rr = state.rewrites.find(&host, qtype);
        }

        for r in &rr {
            if r.rtype() == qtype && qtype.is_address() {
                match r.ip() {
                    None => {
                        // Typed exception: no address for this query type.
                        res.reason = Reason::NotFilteredNotFound;

                        return res;
                    }
                    Some(ip) => {
                        res.ip_list.push(ip);
                        debug!(host = %host, ip = %ip, "rewrite: address answer");
                    }
                }
            }
        }

        res
    }
}

/// Interprets the `$dnsrewrite` payloads of the matched rules.
///
/// A new-CNAME rule wins immediately, as does any rule forcing a response
/// code other than NOERROR; NOERROR record values accumulate into the
/// response map.
pub(crate) fn process_dns_rewrites(rules: &[Arc<dyn NetworkRule>]) -> CheckResult {
    if rules.is_empty() {
        return CheckResult::default();
    }

    let mut res_rules = Vec::new();
    let mut response: HashMap<RecordType, Vec<RewriteValue>> = HashMap::new();

    for nr in rules {
        let Some(dr) = nr.dns_rewrite() else { continue };

        if let Some(cname) = &dr.new_cname {
            return CheckResult {
                reason: Reason::RewrittenRule,
                rules: vec![ResultRule::new(nr.text(), nr.filter_list_id())],
                canon_name: Some(cname.clone()),
                ..CheckResult::default()
            };
        }

        match dr.rcode {
            ResponseCode::NoError => {
                if let (Some(rr_type), Some(value)) = (dr.rr_type, &dr.value) {
                    response.entry(rr_type).or_default().push(value.clone());
                }

                res_rules.push(ResultRule::new(nr.text(), nr.filter_list_id()));
            }
            rcode => {
                return CheckResult {
                    reason: Reason::RewrittenRule,
                    rules: vec![ResultRule::new(nr.text(), nr.filter_list_id())],
                    dns_rewrite_result: Some(DnsRewriteResult {
                        rcode,
                        response: HashMap::new(),
                    }),
                    ..CheckResult::default()
                };
            }
        }
    }

    CheckResult {
        reason: Reason::RewrittenRule,
        rules: res_rules,
        dns_rewrite_result: Some(DnsRewriteResult {
            rcode: ResponseCode::NoError,
            response,
        }),
        ..CheckResult::default()
    }
}
