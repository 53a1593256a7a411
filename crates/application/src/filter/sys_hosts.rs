use super::rewrites::process_dns_rewrites;
use super::{DnsFilter, Settings};
use crate::ports::MatchRequest;
use warden_dns_domain::{CheckResult, FilterError, Reason, RecordType};

impl DnsFilter {
    /// Matches the host against the operating system's hosts database. The
    /// error is always `Ok`; the signature matches the checker contract.
    pub(crate) fn match_sys_hosts(
        &self,
        host: &str,
        qtype: RecordType,
        setts: &Settings,
    ) -> Result<CheckResult, FilterError> {
        let hosts = { self.state.read().unwrap().conf.etc_hosts.clone() };

        let (Some(hosts), true) = (hosts, setts.filtering_enabled) else {
            return Ok(CheckResult::default());
        };

        let mut hostname = host.to_string();
        loop {
            let req = MatchRequest {
                hostname: &hostname,
                sorted_client_tags: &setts.client_tags,
                client_ip: setts.client_ip,
                client_name: setts.client_name.as_deref(),
                qtype,
            };

            let rewrites = match hosts.match_request(&req) {
                Some(m) if !m.rewrite_rules.is_empty() => m.rewrite_rules,
                _ => return Ok(CheckResult::default()),
            };

            let mut res = process_dns_rewrites(&rewrites);
            if let Some(cn) = res.canon_name.clone() {
                // Probably an alias; follow it through the container.
                hostname = cn;
                continue;
            }

            res.reason = Reason::RewrittenAutoHosts;
            for rule in &mut res.rules {
                if let Some(text) = hosts.translate(&rule.text) {
                    rule.text = text;
                }
            }

            return Ok(res);
        }
    }
}
