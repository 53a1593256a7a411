use super::{ServiceEntry, Settings};
use crate::ports::RuleCompiler;
use tracing::{debug, warn};
use warden_dns_domain::{
    service_catalog, CheckResult, Reason, ResultRule, BLOCKED_SVCS_LIST_ID,
};

/// Checks the host against the blocked-services rules carried by the query
/// settings. First matching rule wins.
pub(crate) fn match_blocked_services(host: &str, setts: &Settings) -> CheckResult {
    if !setts.protection_enabled {
        return CheckResult::default();
    }

    for svc in &setts.services_rules {
        for rule in &svc.rules {
            if !rule.is_match(host) {
                continue;
            }

            debug!(
                rule = rule.text(),
                host,
                service = %svc.name,
                "blocked services: matched rule"
            );

            return CheckResult {
                is_filtered: true,
                reason: Reason::FilteredBlockedService,
                service_name: Some(svc.name.clone()),
                rules: vec![ResultRule::new(rule.text(), rule.filter_list_id())],
                ..CheckResult::default()
            };
        }
    }

    CheckResult::default()
}

/// Compiles the configured service names into matchable entries, dropping
/// names missing from the catalog. Returns the surviving names alongside
/// their compiled entries.
pub(crate) fn build_service_entries(
    names: &[String],
    compiler: &dyn RuleCompiler,
) -> (Vec<String>, Vec<ServiceEntry>) {
    let mut kept = Vec::with_capacity(names.len());
    let mut entries = Vec::with_capacity(names.len());

    for name in names {
        let Some(def) = service_catalog::find_service(name) else {
            debug!(service = %name, "skipping unknown blocked service");
            continue;
        };

        let mut rules = Vec::with_capacity(def.rules.len());
        for text in def.rules {
            match compiler.compile_hostname_rule(text, BLOCKED_SVCS_LIST_ID) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    warn!(service = %name, rule = text, error = %e, "bad service rule");
                }
            }
        }

        kept.push(name.clone());
        entries.push(ServiceEntry {
            name: def.id.to_string(),
            rules,
        });
    }

    (kept, entries)
}
