use super::{DnsFilter, Settings};
use crate::ports::{DnsMatch, DnsRuleSet, HostRule, MatchRequest, RuleList};
use std::sync::Arc;
use tracing::debug;
use warden_dns_domain::{
    CheckResult, FilterError, FilterListSource, Reason, RecordType, ResultRule,
};

/// The active compiled rule sets. Guarded by the engine lock, which is held
/// for reading across a whole match, including consumption of the returned
/// rule handles, and for writing only during the install step of a rebuild.
#[derive(Default)]
pub(crate) struct EnginePair {
    pub block: Option<Box<dyn DnsRuleSet>>,
    pub allow: Option<Box<dyn DnsRuleSet>>,
}

/// Turns filter sources into compiler inputs.
///
/// Sources with inline data compile in memory. Sources with neither data nor
/// an existing file are skipped. On hosts where the compiler memory-maps
/// list files, a file being replaced mid-use is unsafe, so the contents are
/// read into memory up front there; elsewhere the file is handed to the
/// compiler as-is. File I/O failures other than not-exist abort the build.
fn collect_rule_lists(filters: &[FilterListSource]) -> Result<Vec<RuleList>, FilterError> {
    let mut lists = Vec::with_capacity(filters.len());

    for f in filters {
        if !f.data.is_empty() {
            lists.push(RuleList::Text {
                id: f.id,
                text: f.data.clone(),
            });
            continue;
        }

        let Some(path) = &f.file_path else { continue };

        if cfg!(windows) {
            match std::fs::read_to_string(path) {
                Ok(text) => lists.push(RuleList::Text { id: f.id, text }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(FilterError::ListRead {
                        path: path.clone(),
                        source: e,
                    })
                }
            }

            continue;
        }

        match std::fs::metadata(path) {
            Ok(_) => lists.push(RuleList::File {
                id: f.id,
                path: path.clone(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(FilterError::ListRead {
                    path: path.clone(),
                    source: e,
                })
            }
        }
    }

    Ok(lists)
}

impl DnsFilter {
    /// Compiles both rule storages and installs them. Building happens
    /// outside the engine lock; the lock is taken only to swap the pair in,
    /// which also drops (releases) the outgoing storages. On error the
    /// current engine is left untouched.
    pub(crate) fn init_filtering(
        &self,
        allow_filters: &[FilterListSource],
        block_filters: &[FilterListSource],
    ) -> Result<(), FilterError> {
        let block = self.compiler.compile(collect_rule_lists(block_filters)?)?;
        let allow = self.compiler.compile(collect_rule_lists(allow_filters)?)?;

        {
            let mut engines = self.engines.write().unwrap();
            *engines = EnginePair {
                block: Some(block),
                allow: Some(allow),
            };
        }

        debug!("initialized filtering engine");

        Ok(())
    }

    /// Matches the host against the rule engines only, skipping the
    /// reputation and hosts checks.
    pub(crate) fn match_host(
        &self,
        host: &str,
        qtype: RecordType,
        setts: &Settings,
    ) -> Result<CheckResult, FilterError> {
        if !setts.filtering_enabled {
            return Ok(CheckResult::default());
        }

        let req = MatchRequest {
            hostname: host,
            sorted_client_tags: &setts.client_tags,
            client_ip: setts.client_ip,
            client_name: setts.client_name.as_deref(),
            qtype,
        };

        // Held until the matched rule handles have been fully consumed.
        let engines = self.engines.read().unwrap();

        if setts.protection_enabled {
            if let Some(allow) = &engines.allow {
                if let Some(m) = allow.match_request(&req) {
                    return match_host_process_allow_list(host, m);
                }
            }
        }

        let Some(block) = &engines.block else {
            return Ok(CheckResult::default());
        };

        let Some(dnsres) = block.match_request(&req) else {
            return Ok(CheckResult::default());
        };

        if !dnsres.rewrite_rules.is_empty() {
            let res = super::rewrites::process_dns_rewrites(&dnsres.rewrite_rules);

            let self_rewrite =
                res.reason == Reason::RewrittenRule && res.canon_name.as_deref() == Some(host);
            if !self_rewrite {
                return Ok(res);
            }
            // A rewrite of a host to itself. Go on and try matching other
            // things.
        } else if !dnsres.has_rules() {
            return Ok(CheckResult::default());
        }

        if !setts.protection_enabled {
            // Dnsrewrite results are the only thing that surfaces while
            // protection is off.
            return Ok(CheckResult::default());
        }

        let res = match_host_process_dns_result(qtype, &dnsres);
        for rule in &res.rules {
            debug!(
                rule = %rule.text,
                host,
                filter_list_id = rule.filter_list_id,
                "filtering: found rule"
            );
        }

        Ok(res)
    }
}

/// Builds the allowlist result: the single network rule if present, else the
/// v4 host rules, else the v6 host rules. A match with no rules at all is an
/// engine invariant violation.
fn match_host_process_allow_list(
    host: &str,
    dnsres: DnsMatch,
) -> Result<CheckResult, FilterError> {
    let rules: Vec<ResultRule> = if let Some(nr) = &dnsres.network_rule {
        vec![ResultRule::new(nr.text(), nr.filter_list_id())]
    } else if !dnsres.host_rules_v4.is_empty() {
        host_result_rules(&dnsres.host_rules_v4, false)
    } else if !dnsres.host_rules_v6.is_empty() {
        host_result_rules(&dnsres.host_rules_v6, false)
    } else {
        return Err(FilterError::EmptyDnsResult);
    };

    debug!(host, ?rules, "filtering: allowlist rules");

    Ok(CheckResult::from_rules(rules, Reason::NotFilteredAllowList))
}

/// Builds the block result from a matched DNS filtering result, in priority
/// order: network rule, address rules matching the query type, then a single
/// address rule with no IP when the query type mismatches.
fn match_host_process_dns_result(qtype: RecordType, dnsres: &DnsMatch) -> CheckResult {
    if let Some(nr) = &dnsres.network_rule {
        let reason = if nr.is_allowlist() {
            Reason::NotFilteredAllowList
        } else {
            Reason::FilteredBlockList
        };

        return CheckResult::from_rules(
            vec![ResultRule::new(nr.text(), nr.filter_list_id())],
            reason,
        );
    }

    if qtype == RecordType::A && !dnsres.host_rules_v4.is_empty() {
        return CheckResult::from_rules(
            host_result_rules(&dnsres.host_rules_v4, true),
            Reason::FilteredBlockList,
        );
    }

    if qtype == RecordType::AAAA && !dnsres.host_rules_v6.is_empty() {
        return CheckResult::from_rules(
            host_result_rules(&dnsres.host_rules_v6, true),
            Reason::FilteredBlockList,
        );
    }

    // Question type doesn't match the host rules. Return the first matched
    // host rule, but without an IP address.
    let first = dnsres
        .host_rules_v4
        .first()
        .or_else(|| dnsres.host_rules_v6.first());
    if let Some(hr) = first {
        return CheckResult::from_rules(
            vec![ResultRule::new(hr.text(), hr.filter_list_id())],
            Reason::FilteredBlockList,
        );
    }

    CheckResult::default()
}

fn host_result_rules(rules: &[Arc<dyn HostRule>], with_ip: bool) -> Vec<ResultRule> {
    rules
        .iter()
        .map(|hr| ResultRule {
            text: hr.text().to_string(),
            ip: with_ip.then(|| hr.ip()),
            filter_list_id: hr.filter_list_id(),
        })
        .collect()
}
