mod parser;
mod ruleset;

use parser::ParsedLine;
use ruleset::{CompiledRuleSet, StoredNetworkRule};
use std::sync::Arc;
use tracing::{debug, warn};
use warden_dns_application::ports::{DnsRuleSet, HostnameRule, RuleCompiler, RuleList};
use warden_dns_domain::FilterError;

/// The built-in rule-list compiler: adblock-style network rules plus
/// `/etc/hosts`-syntax host rules, with the `$client`, `$ctag` and
/// `$dnsrewrite` modifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdblockCompiler;

impl AdblockCompiler {
    pub fn new() -> Self {
        Self
    }

    fn add_list(set: &mut CompiledRuleSet, id: i64, text: &str) {
        let mut rules = 0usize;
        for line in text.lines() {
            match parser::parse_line(line) {
                Some(ParsedLine::Network(data)) => {
                    set.add_network_rule(data, id);
                    rules += 1;
                }
                Some(ParsedLine::Hosts { ip, hostnames }) => {
                    for hostname in &hostnames {
                        set.add_host_rule(line.trim(), hostname, ip, id);
                        rules += 1;
                    }
                }
                None => {}
            }
        }

        debug!(filter_list_id = id, rules, "compiled rule list");
    }
}

impl RuleCompiler for AdblockCompiler {
    fn compile(&self, lists: Vec<RuleList>) -> Result<Box<dyn DnsRuleSet>, FilterError> {
        let mut set = CompiledRuleSet::default();

        for list in lists {
            match list {
                RuleList::Text { id, text } => Self::add_list(&mut set, id, &text),
                RuleList::File { id, path } => {
                    let text = std::fs::read_to_string(&path).map_err(|e| {
                        warn!(path = %path.display(), error = %e, "unreadable rule list");
                        FilterError::ListRead { path, source: e }
                    })?;

                    Self::add_list(&mut set, id, &text);
                }
            }
        }

        Ok(Box::new(set))
    }

    fn compile_hostname_rule(
        &self,
        text: &str,
        filter_list_id: i64,
    ) -> Result<Arc<dyn HostnameRule>, FilterError> {
        let data = parser::parse_network_rule(text)?;

        Ok(Arc::new(StoredNetworkRule::new(data, filter_list_id)))
    }
}
