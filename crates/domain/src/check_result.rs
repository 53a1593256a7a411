use crate::dns_rewrite::DnsRewriteResult;
use crate::reason::Reason;
use serde::Serialize;
use std::net::IpAddr;

/// A rule that was applied to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRule {
    /// The rule text.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// The host IP. Only set for `/etc/hosts`-syntax rules and safe-search
    /// results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,

    /// The ID of the filter list the rule came from.
    #[serde(skip_serializing_if = "is_zero")]
    pub filter_list_id: i64,
}

fn is_zero(id: &i64) -> bool {
    *id == 0
}

impl ResultRule {
    pub fn new(text: impl Into<String>, filter_list_id: i64) -> Self {
        Self {
            text: text.into(),
            ip: None,
            filter_list_id,
        }
    }
}

/// The outcome of checking one query.
///
/// Every field serializes with omit-empty semantics so query-log consumers
/// don't bloat; which optional fields are populated is keyed by `reason`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckResult {
    /// True if the request is filtered.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_filtered: bool,

    /// Why the request was blocked, rewritten, or passed.
    #[serde(skip_serializing_if = "is_default_reason")]
    pub reason: Reason,

    /// The applied rules, in match order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ResultRule>,

    /// Rewrite target addresses. Empty unless `reason` is `Rewritten`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_list: Vec<IpAddr>,

    /// The final CNAME of a rewrite chain. Empty unless `reason` is
    /// `Rewritten` or `RewrittenRule`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canon_name: Option<String>,

    /// The blocked service. Empty unless `reason` is
    /// `FilteredBlockedService`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// The `$dnsrewrite` outcome. Empty unless `reason` is `RewrittenRule`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_rewrite_result: Option<DnsRewriteResult>,
}

fn is_default_reason(reason: &Reason) -> bool {
    !reason.matched()
}

impl CheckResult {
    /// A result built from matched rules. `is_filtered` is set only for
    /// block-list hits; checkers that filter under other reasons set the
    /// flag themselves.
    pub fn from_rules(rules: Vec<ResultRule>, reason: Reason) -> Self {
        Self {
            is_filtered: reason == Reason::FilteredBlockList,
            reason,
            rules,
            ..Self::default()
        }
    }
}
