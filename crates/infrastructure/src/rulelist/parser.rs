use std::net::IpAddr;
use warden_dns_domain::{DnsRewrite, FilterError, RecordType, ResponseCode, RewriteValue};

/// One parsed rule line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedLine {
    Network(NetworkRuleData),
    Hosts { ip: IpAddr, hostnames: Vec<String> },
}

/// An adblock-style network rule reduced to what the DNS dialect needs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NetworkRuleData {
    pub text: String,
    pub domain: String,
    /// False for `*.domain` patterns, which match proper subdomains only.
    pub include_self: bool,
    pub allow: bool,
    pub dns_rewrite: Option<DnsRewrite>,
    /// `$client=` constraint values; empty means unconstrained.
    pub clients: Vec<String>,
    /// `$ctag=` constraint values; empty means unconstrained.
    pub ctags: Vec<String>,
}

impl NetworkRuleData {
    pub fn matches_domain(&self, host: &str) -> bool {
        if self.include_self && host == self.domain {
            return true;
        }

        host.len() > self.domain.len()
            && host.ends_with(&self.domain)
            && host.as_bytes()[host.len() - self.domain.len() - 1] == b'.'
    }
}

/// Parses one list line, skipping whatever the DNS dialect has no use for:
/// comments, cosmetic rules, and modifiers outside the supported set.
pub(crate) fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with('!') || line.starts_with('[') {
        return None;
    }

    // Cosmetic rules are always ignored.
    if line.contains("##") || line.contains("#@#") || line.contains("#%#") || line.contains("$$") {
        return None;
    }

    if let Some(hosts) = parse_hosts_line(line) {
        return Some(hosts);
    }

    parse_network_rule(line).ok().map(ParsedLine::Network)
}

fn parse_hosts_line(line: &str) -> Option<ParsedLine> {
    let mut parts = line.split_whitespace();
    let ip: IpAddr = parts.next()?.parse().ok()?;

    let hostnames: Vec<String> = parts
        .take_while(|p| !p.starts_with('#'))
        .filter(|h| {
            !matches!(
                *h,
                "localhost" | "localhost.localdomain" | "broadcasthost" | "local"
                    | "ip6-localhost" | "ip6-loopback"
            )
        })
        .map(|h| h.to_lowercase())
        .collect();

    if hostnames.is_empty() {
        return None;
    }

    Some(ParsedLine::Hosts { ip, hostnames })
}

/// Strictly parses one network rule. Used both by the list parser and for
/// standalone rules such as blocked-service entries.
pub(crate) fn parse_network_rule(text: &str) -> Result<NetworkRuleData, FilterError> {
    let invalid = |reason: &str| FilterError::InvalidRule {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let line = text.trim();
    let (line, allow) = match line.strip_prefix("@@") {
        Some(rest) => (rest, true),
        None => (line, false),
    };

    let (pattern, modifiers) = match line.find('$') {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    };

    let mut rule = NetworkRuleData {
        text: text.trim().to_string(),
        domain: String::new(),
        include_self: true,
        allow,
        dns_rewrite: None,
        clients: Vec::new(),
        ctags: Vec::new(),
    };

    let mut domain = pattern.strip_prefix("||").unwrap_or(pattern);
    if let Some(pos) = domain.find('^') {
        if pos != domain.len() - 1 {
            return Err(invalid("separator inside pattern"));
        }
        domain = &domain[..pos];
    }
    domain = domain.strip_prefix('|').unwrap_or(domain);
    domain = domain.strip_suffix('|').unwrap_or(domain);

    if let Some(suffix) = domain.strip_prefix("*.") {
        rule.include_self = false;
        domain = suffix;
    }

    if domain.is_empty()
        || domain.contains('/')
        || domain.contains('*')
        || domain.contains(char::is_whitespace)
        || !domain.contains('.')
    {
        return Err(invalid("unsupported pattern"));
    }
    rule.domain = domain.to_lowercase();

    if let Some(modifiers) = modifiers {
        for modifier in modifiers.split(',') {
            let (name, value) = match modifier.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (modifier, None),
            };

            match (name, value) {
                ("important", None) => {}
                ("client", Some(v)) => {
                    rule.clients = v.split('|').map(|c| c.to_lowercase()).collect();
                }
                ("ctag", Some(v)) => {
                    rule.ctags = v.split('|').map(|t| t.to_string()).collect();
                }
                ("dnsrewrite", Some(v)) => {
                    rule.dns_rewrite = Some(parse_dns_rewrite(v).ok_or_else(|| {
                        invalid("bad dnsrewrite value")
                    })?);
                }
                _ => return Err(invalid("unsupported modifier")),
            }
        }
    }

    Ok(rule)
}

/// Parses a `$dnsrewrite` value: a bare response-code keyword, an address or
/// CNAME shorthand, or the full `RCODE;RRTYPE;VALUE` form.
fn parse_dns_rewrite(value: &str) -> Option<DnsRewrite> {
    if value.is_empty() {
        return None;
    }

    if let Some(rcode) = ResponseCode::parse(value) {
        return Some(DnsRewrite::refusal(rcode));
    }

    let mut parts = value.splitn(3, ';');
    let first = parts.next()?;

    let Some(rcode) = ResponseCode::parse(first) else {
        // Shorthand form: an address or a CNAME target.
        return Some(match value.parse::<IpAddr>() {
            Ok(ip) => DnsRewrite::addr(ip),
            Err(_) => DnsRewrite::cname(value.to_lowercase()),
        });
    };

    if rcode != ResponseCode::NoError {
        return Some(DnsRewrite::refusal(rcode));
    }

    let rr_type: RecordType = parts.next()?.parse().ok()?;
    let val = parts.next()?;

    match rr_type {
        RecordType::A => {
            let ip: IpAddr = val.parse().ok().filter(IpAddr::is_ipv4)?;
            Some(DnsRewrite::addr(ip))
        }
        RecordType::AAAA => {
            let ip: IpAddr = val.parse().ok().filter(IpAddr::is_ipv6)?;
            Some(DnsRewrite::addr(ip))
        }
        RecordType::CNAME => Some(DnsRewrite::cname(val.to_lowercase())),
        _ => Some(DnsRewrite {
            rcode: ResponseCode::NoError,
            new_cname: None,
            rr_type: Some(rr_type),
            value: Some(RewriteValue::Text(val.to_string())),
        }),
    }
}
