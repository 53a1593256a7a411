use super::blocked_services::match_blocked_services;
use super::{DnsFilter, Settings};
use warden_dns_domain::{CheckResult, FilterError, Reason, RecordType};

/// One member of the host checker chain. Each checker either claims the
/// query by returning a matched reason or passes it along by returning an
/// unmatched result; it never mutates the settings.
pub(crate) struct HostChecker {
    pub name: &'static str,
    pub kind: CheckerKind,
}

pub(crate) enum CheckerKind {
    SysHosts,
    RuleEngine,
    BlockedServices,
    SafeBrowsing,
    Parental,
    SafeSearch,
}

/// The fixed chain order. Declared as data so the sequence is visible in one
/// place and the externally supplied members stay substitutable in tests.
pub(crate) fn host_checkers() -> Vec<HostChecker> {
    vec![
        HostChecker {
            name: "hosts container",
            kind: CheckerKind::SysHosts,
        },
        HostChecker {
            name: "filtering",
            kind: CheckerKind::RuleEngine,
        },
        HostChecker {
            name: "blocked services",
            kind: CheckerKind::BlockedServices,
        },
        HostChecker {
            name: "safe browsing",
            kind: CheckerKind::SafeBrowsing,
        },
        HostChecker {
            name: "parental",
            kind: CheckerKind::Parental,
        },
        HostChecker {
            name: "safe search",
            kind: CheckerKind::SafeSearch,
        },
    ]
}

impl DnsFilter {
    /// Tries to match the host against filtering rules only, skipping the
    /// hosts container and the reputation lookups.
    pub fn check_host_rules(
        &self,
        host: &str,
        qtype: RecordType,
        setts: &Settings,
    ) -> Result<CheckResult, FilterError> {
        if !setts.filtering_enabled {
            return Ok(CheckResult::default());
        }

        let host = host.to_lowercase();

        self.match_host(&host, qtype, setts)
    }

    /// Checks one query against the rewrite table and the full checker
    /// chain. The first checker reporting a match wins; a checker error is
    /// wrapped with the checker's name and stops the chain.
    pub async fn check_host(
        &self,
        host: &str,
        qtype: RecordType,
        setts: &Settings,
    ) -> Result<CheckResult, FilterError> {
        // Clients sometimes resolve ".", a request for the root servers.
        if host.is_empty() {
            return Ok(CheckResult::default());
        }

        let host = host.to_lowercase();

        if setts.filtering_enabled {
            let res = self.process_rewrites(&host, qtype);
            if res.reason == Reason::Rewritten {
                return Ok(res);
            }
        }

        for checker in &self.host_checkers {
            let res = self
                .run_checker(checker, &host, qtype, setts)
                .await
                .map_err(|e| e.in_checker(checker.name))?;

            if res.reason.matched() {
                return Ok(res);
            }
        }

        Ok(CheckResult::default())
    }

    async fn run_checker(
        &self,
        checker: &HostChecker,
        host: &str,
        qtype: RecordType,
        setts: &Settings,
    ) -> Result<CheckResult, FilterError> {
        match checker.kind {
            CheckerKind::SysHosts => self.match_sys_hosts(host, qtype, setts),
            CheckerKind::RuleEngine => self.match_host(host, qtype, setts),
            CheckerKind::BlockedServices => Ok(match_blocked_services(host, setts)),
            CheckerKind::SafeBrowsing => {
                if !setts.safe_browsing_enabled {
                    return Ok(CheckResult::default());
                }

                let port = { self.state.read().unwrap().conf.safe_browsing.clone() };
                match port {
                    Some(port) => port.check(host).await,
                    None => Ok(CheckResult::default()),
                }
            }
            CheckerKind::Parental => {
                if !setts.parental_enabled {
                    return Ok(CheckResult::default());
                }

                let port = { self.state.read().unwrap().conf.parental.clone() };
                match port {
                    Some(port) => port.check(host).await,
                    None => Ok(CheckResult::default()),
                }
            }
            CheckerKind::SafeSearch => {
                if !setts.safe_search_enabled {
                    return Ok(CheckResult::default());
                }

                let port = { self.state.read().unwrap().conf.safe_search.clone() };
                match port {
                    Some(port) => port.check(host, qtype, self.resolver.as_ref()).await,
                    None => Ok(CheckResult::default()),
                }
            }
        }
    }
}
