mod blocked_services;
mod chain;
mod engine;
mod reload;
mod rewrites;
mod sys_hosts;

use crate::ports::{
    HostnameRule, HostsContainer, IpResolver, ReputationChecker, RuleCompiler, SafeSearchChecker,
};
use async_trait::async_trait;
use engine::EnginePair;
use reload::{ReloadParams, ReloadQueue};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::error;
use warden_dns_domain::{
    FilterError, FilterListSource, RecordType, RewriteEntry, RewriteTable,
};

/// A blocked service carried by per-query settings: its name and the
/// compiled rules that match its hostnames.
#[derive(Clone)]
pub struct ServiceEntry {
    pub name: String,
    pub rules: Vec<Arc<dyn HostnameRule>>,
}

/// Per-query filtering settings supplied by the forwarder for one client.
#[derive(Clone, Default)]
pub struct Settings {
    pub client_name: Option<String>,
    pub client_ip: Option<IpAddr>,
    /// Must be sorted; the rule dialect binary-searches tags.
    pub client_tags: Vec<String>,

    pub services_rules: Vec<ServiceEntry>,

    pub protection_enabled: bool,
    pub filtering_enabled: bool,
    pub safe_search_enabled: bool,
    pub safe_browsing_enabled: bool,
    pub parental_enabled: bool,
}

/// Filter configuration. The serializable fields round-trip to disk through
/// the embedding server; the port fields are wired at construction.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub parental_enabled: bool,
    pub safe_search_enabled: bool,
    pub safe_browsing_enabled: bool,

    #[serde(default)]
    pub rewrites: Vec<RewriteEntry>,

    /// Services to block globally; per-client settings can override this.
    #[serde(default)]
    pub blocked_services: Vec<String>,

    #[serde(skip)]
    pub etc_hosts: Option<Arc<dyn HostsContainer>>,
    #[serde(skip)]
    pub safe_browsing: Option<Arc<dyn ReputationChecker>>,
    #[serde(skip)]
    pub parental: Option<Arc<dyn ReputationChecker>>,
    #[serde(skip)]
    pub safe_search: Option<Arc<dyn SafeSearchChecker>>,

    /// Resolver used while safe search; the system resolver when absent.
    #[serde(skip)]
    pub resolver: Option<Arc<dyn IpResolver>>,
}

/// Configuration plus the state derived from it, guarded by one lock so a
/// mutation and its derived forms swap together.
struct ConfState {
    conf: FilterConfig,
    rewrites: RewriteTable,
    services: Vec<ServiceEntry>,
}

/// Matches hostnames and DNS requests against filtering rules.
///
/// The configuration lock and the engine lock are independent on purpose:
/// rebuilds are long and must not block configuration readers.
pub struct DnsFilter {
    enabled: AtomicBool,

    state: RwLock<ConfState>,
    engines: RwLock<EnginePair>,

    compiler: Arc<dyn RuleCompiler>,
    resolver: Arc<dyn IpResolver>,

    reload_queue: ReloadQueue,
    worker_started: AtomicBool,

    host_checkers: Vec<chain::HostChecker>,
}

impl DnsFilter {
    /// Creates a filter from configuration. Unknown blocked services are
    /// dropped, rewrites are preprocessed, and, when `block_filters` is
    /// given, the initial engine is compiled (with an empty allow set); a
    /// compile failure fails construction.
    pub fn new(
        conf: FilterConfig,
        compiler: Arc<dyn RuleCompiler>,
        block_filters: Option<&[FilterListSource]>,
    ) -> Result<Self, FilterError> {
        let resolver = conf
            .resolver
            .clone()
            .unwrap_or_else(|| Arc::new(SystemResolver));

        let (kept, services) =
            blocked_services::build_service_entries(&conf.blocked_services, compiler.as_ref());
        let rewrites = RewriteTable::new(conf.rewrites.clone());

        let mut conf = conf;
        conf.blocked_services = kept;

        let filter = Self {
            enabled: AtomicBool::new(false),
            state: RwLock::new(ConfState {
                conf,
                rewrites,
                services,
            }),
            engines: RwLock::new(EnginePair::default()),
            compiler,
            resolver,
            reload_queue: ReloadQueue::new(),
            worker_started: AtomicBool::new(false),
            host_checkers: chain::host_checkers(),
        };

        if let Some(block) = block_filters {
            filter.init_filtering(&[], block).map_err(|e| {
                error!(error = %e, "Can't initialize filtering subsystem");
                e
            })?;
        }

        Ok(filter)
    }

    /// Spawns the reload worker. The worker runs for the rest of the
    /// process; `close` leaves it parked on the idle mailbox.
    pub fn start(self: Arc<Self>) {
        if self.worker_started.swap(true, Ordering::SeqCst) {
            return;
        }

        tokio::spawn(async move {
            loop {
                let params = self.reload_queue.next().await;

                let this = Arc::clone(&self);
                let built = tokio::task::spawn_blocking(move || {
                    this.init_filtering(&params.allow, &params.block)
                })
                .await;

                match built {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!(error = %e, "Can't initialize filtering subsystem"),
                    Err(e) => error!(error = %e, "filter rebuild task failed"),
                }
            }
        });
    }

    /// Releases the compiled engines. Matches in flight finish first; the
    /// engine write lock excludes them.
    pub fn close(&self) {
        let mut engines = self.engines.write().unwrap();
        *engines = EnginePair::default();
    }

    /// Installs new filters, synchronously or asynchronously. The async path
    /// coalesces into the reload mailbox and always succeeds; the old engine
    /// keeps serving until the new one is ready, so the caller must keep the
    /// old filter files intact meanwhile.
    pub fn set_filters(
        &self,
        block_filters: Vec<FilterListSource>,
        allow_filters: Vec<FilterListSource>,
        async_reload: bool,
    ) -> Result<(), FilterError> {
        if async_reload {
            self.reload_queue.publish(ReloadParams {
                allow: allow_filters,
                block: block_filters,
            });

            return Ok(());
        }

        self.init_filtering(&allow_filters, &block_filters)
            .map_err(|e| {
                error!(error = %e, "Can't initialize filtering subsystem");
                e
            })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Snapshot of the current flags.
    pub fn get_config(&self) -> Settings {
        let state = self.state.read().unwrap();

        Settings {
            filtering_enabled: self.enabled.load(Ordering::SeqCst),
            safe_search_enabled: state.conf.safe_search_enabled,
            safe_browsing_enabled: state.conf.safe_browsing_enabled,
            parental_enabled: state.conf.parental_enabled,
            ..Settings::default()
        }
    }

    /// Copies the configuration for persistence. The rewrite entries are
    /// deep copies, independently mutable from the filter's own.
    pub fn write_disk_config(&self, out: &mut FilterConfig) {
        let state = self.state.read().unwrap();
        *out = state.conf.clone();
    }

    /// Copies the globally configured blocked-service rules into the query
    /// settings.
    pub fn apply_blocked_services(&self, setts: &mut Settings) {
        let state = self.state.read().unwrap();
        setts.services_rules = state.services.clone();
    }

    /// Replaces the globally blocked services; unknown names are dropped.
    pub fn set_blocked_services(&self, names: Vec<String>) {
        let (kept, services) =
            blocked_services::build_service_entries(&names, self.compiler.as_ref());

        let mut state = self.state.write().unwrap();
        state.conf.blocked_services = kept;
        state.services = services;
    }

    pub fn add_rewrite(&self, entry: RewriteEntry) {
        let mut state = self.state.write().unwrap();
        state.conf.rewrites.push(entry.clone());
        state.rewrites.push(entry);
    }

    /// Removes every rewrite with the given domain and answer; returns how
    /// many were dropped.
    pub fn remove_rewrite(&self, domain: &str, answer: &str) -> usize {
        let mut state = self.state.write().unwrap();
        let removed = state.rewrites.remove(domain, answer);
        state
            .conf
            .rewrites
            .retain(|e| !(e.domain.eq_ignore_ascii_case(domain) && e.answer == answer));

        removed
    }
}

/// Default address lookup over the operating system resolver.
struct SystemResolver;

#[async_trait]
impl IpResolver for SystemResolver {
    async fn lookup_ip(&self, qtype: RecordType, host: &str) -> Result<Vec<IpAddr>, FilterError> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| FilterError::Upstream(format!("lookup {host}: {e}")))?;

        let ips = addrs
            .map(|a| a.ip())
            .filter(|ip| match qtype {
                RecordType::A => ip.is_ipv4(),
                RecordType::AAAA => ip.is_ipv6(),
                _ => true,
            })
            .collect();

        Ok(ips)
    }
}
