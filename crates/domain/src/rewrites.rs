use crate::record_type::RecordType;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A user-configured DNS rewrite.
///
/// `domain` may carry a `*.` prefix, which matches proper subdomains only.
/// `answer` is an IP address, a canonical hostname, or the literal `A` or
/// `AAAA`, the latter two marking a typed exception that suppresses
/// rewriting for that query type. An entry whose answer equals its own
/// domain is likewise an exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteEntry {
    pub domain: String,
    pub answer: String,

    #[serde(skip)]
    rtype: Option<RecordType>,
    #[serde(skip)]
    ip: Option<IpAddr>,
}

/// Entries are compared by what the operator wrote; the derived match
/// fields are a cache.
impl PartialEq for RewriteEntry {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.answer == other.answer
    }
}

impl Eq for RewriteEntry {}

impl RewriteEntry {
    pub fn new(domain: impl Into<String>, answer: impl Into<String>) -> Self {
        let mut entry = Self {
            domain: domain.into(),
            answer: answer.into(),
            rtype: None,
            ip: None,
        };
        entry.normalize();
        entry
    }

    /// Derives the record type and IP from the answer, lowercasing the
    /// domain pattern. Must run before the entry is matched against.
    pub fn normalize(&mut self) {
        self.domain = self.domain.to_lowercase();

        match self.answer.as_str() {
            "A" => {
                self.rtype = Some(RecordType::A);
                self.ip = None;
            }
            "AAAA" => {
                self.rtype = Some(RecordType::AAAA);
                self.ip = None;
            }
            answer => match answer.parse::<IpAddr>() {
                Ok(ip @ IpAddr::V4(_)) => {
                    self.rtype = Some(RecordType::A);
                    self.ip = Some(ip);
                }
                Ok(ip @ IpAddr::V6(_)) => {
                    self.rtype = Some(RecordType::AAAA);
                    self.ip = Some(ip);
                }
                Err(_) => {
                    self.answer = self.answer.to_lowercase();
                    self.rtype = Some(RecordType::CNAME);
                    self.ip = None;
                }
            },
        }
    }

    pub fn rtype(&self) -> RecordType {
        // Entries are normalized on construction and after deserialization.
        self.rtype.unwrap_or(RecordType::CNAME)
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    fn is_wildcard(&self) -> bool {
        self.domain.starts_with("*.")
    }

    fn matches_domain(&self, host: &str) -> bool {
        if self.domain == host {
            return true;
        }

        // "*.example.com" matches proper subdomains of example.com only.
        self.is_wildcard() && host.ends_with(&self.domain[1..])
    }

    fn matches_qtype(&self, qtype: RecordType) -> bool {
        self.rtype() == RecordType::CNAME || self.rtype() == qtype
    }
}

/// The ordered rewrite table consulted by the legacy-rewrite pre-pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteTable {
    entries: Vec<RewriteEntry>,
}

impl RewriteTable {
    pub fn new(mut entries: Vec<RewriteEntry>) -> Self {
        for entry in &mut entries {
            entry.normalize();
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[RewriteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, mut entry: RewriteEntry) {
        entry.normalize();
        self.entries.push(entry);
    }

    /// Removes every entry with the given domain and answer. Returns how
    /// many were dropped.
    pub fn remove(&mut self, domain: &str, answer: &str) -> usize {
        let before = self.entries.len();
        let domain = domain.to_lowercase();
        self.entries
            .retain(|e| e.domain != domain || e.answer != answer);
        before - self.entries.len()
    }

    /// Entries applicable to `host`/`qtype`: exact-domain matches are
    /// preferred over wildcard matches, and CNAME entries sort first so the
    /// chain walk sees them before address answers. Order is otherwise
    /// stable.
    pub fn find(&self, host: &str, qtype: RecordType) -> Vec<RewriteEntry> {
        let mut matched: Vec<RewriteEntry> = self
            .entries
            .iter()
            .filter(|e| e.matches_qtype(qtype) && e.matches_domain(host))
            .cloned()
            .collect();

        if matched.iter().any(|e| !e.is_wildcard()) {
            matched.retain(|e| !e.is_wildcard());
        }

        matched.sort_by_key(|e| e.rtype() != RecordType::CNAME);

        matched
    }
}
