use crate::record_type::RecordType;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// Response codes a `$dnsrewrite` rule can force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseCode {
    #[default]
    NoError,
    NxDomain,
    Refused,
    ServFail,
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::NxDomain => "NXDOMAIN",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::ServFail => "SERVFAIL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NOERROR" => Some(ResponseCode::NoError),
            "NXDOMAIN" => Some(ResponseCode::NxDomain),
            "REFUSED" => Some(ResponseCode::Refused),
            "SERVFAIL" => Some(ResponseCode::ServFail),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record value carried by a rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RewriteValue {
    Ip(IpAddr),
    Text(String),
}

/// The parsed payload of one `$dnsrewrite` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DnsRewrite {
    pub rcode: ResponseCode,

    /// Rewrite target hostname. CNAME rewrites take priority over every
    /// other rewrite value.
    pub new_cname: Option<String>,

    pub rr_type: Option<RecordType>,
    pub value: Option<RewriteValue>,
}

impl DnsRewrite {
    pub fn cname(target: impl Into<String>) -> Self {
        Self {
            new_cname: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn addr(ip: IpAddr) -> Self {
        let rr_type = if ip.is_ipv4() {
            RecordType::A
        } else {
            RecordType::AAAA
        };

        Self {
            rr_type: Some(rr_type),
            value: Some(RewriteValue::Ip(ip)),
            ..Self::default()
        }
    }

    pub fn refusal(rcode: ResponseCode) -> Self {
        Self {
            rcode,
            ..Self::default()
        }
    }
}

/// The combined outcome of the `$dnsrewrite` rules that matched a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DnsRewriteResult {
    #[serde(skip_serializing_if = "is_no_error")]
    pub rcode: ResponseCode,

    /// Record values to answer with, keyed by record type.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub response: HashMap<RecordType, Vec<RewriteValue>>,
}

fn is_no_error(rcode: &ResponseCode) -> bool {
    *rcode == ResponseCode::NoError
}
