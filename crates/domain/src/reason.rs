use serde::{Serialize, Serializer};
use std::fmt;

/// Why a query was filtered, rewritten, or left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The host was not found in any check.
    #[default]
    NotFilteredNotFound,
    /// The host is explicitly allowed.
    NotFilteredAllowList,
    /// A check failed. Reserved, currently unused.
    NotFilteredError,

    /// The host matched a block list.
    FilteredBlockList,
    /// The host was flagged malicious or phishing.
    FilteredSafeBrowsing,
    /// The host falls outside parental control settings.
    FilteredParental,
    /// The request was invalid and was not processed.
    FilteredInvalid,
    /// The host was replaced with its safe-search variant.
    FilteredSafeSearch,
    /// The host belongs to a blocked service.
    FilteredBlockedService,

    /// A legacy rewrite entry applied.
    Rewritten,
    /// A system-hosts entry applied.
    RewrittenAutoHosts,
    /// A `$dnsrewrite` filter rule applied.
    RewrittenRule,
}

impl Reason {
    /// The historical wire name. Diverges from the variant names for the
    /// allow/block lists and the rewrite family; admin consumers depend on
    /// these exact strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::NotFilteredNotFound => "NotFilteredNotFound",
            Reason::NotFilteredAllowList => "NotFilteredWhiteList",
            Reason::NotFilteredError => "NotFilteredError",
            Reason::FilteredBlockList => "FilteredBlackList",
            Reason::FilteredSafeBrowsing => "FilteredSafeBrowsing",
            Reason::FilteredParental => "FilteredParental",
            Reason::FilteredInvalid => "FilteredInvalid",
            Reason::FilteredSafeSearch => "FilteredSafeSearch",
            Reason::FilteredBlockedService => "FilteredBlockedService",
            Reason::Rewritten => "Rewrite",
            Reason::RewrittenAutoHosts => "RewriteEtcHosts",
            Reason::RewrittenRule => "RewriteRule",
        }
    }

    /// True if any match at all was found, filtered or not.
    pub fn matched(&self) -> bool {
        *self != Reason::NotFilteredNotFound
    }

    pub fn is_in(&self, reasons: &[Reason]) -> bool {
        reasons.contains(self)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
