use std::io::Write;
use std::sync::Arc;
use warden_dns_application::{DnsFilter, FilterConfig, Settings};
use warden_dns_domain::{
    CheckResult, FilterListSource, Reason, RecordType, ResponseCode,
};
use warden_dns_infrastructure::AdblockCompiler;

fn settings() -> Settings {
    Settings {
        filtering_enabled: true,
        protection_enabled: true,
        ..Settings::default()
    }
}

fn new_filter(block: &str, allow: &str) -> DnsFilter {
    let filter = DnsFilter::new(
        FilterConfig::default(),
        Arc::new(AdblockCompiler::new()),
        None,
    )
    .unwrap();

    filter
        .set_filters(
            vec![FilterListSource::from_data(1, block)],
            vec![FilterListSource::from_data(2, allow)],
            false,
        )
        .unwrap();

    filter
}

#[tokio::test]
async fn test_allow_list_overrides_block_list() {
    let filter = new_filter("||ads.com^", "@@||ads.com^");

    let res = filter
        .check_host("ads.com", RecordType::A, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::NotFilteredAllowList);
    assert!(!res.is_filtered);
    assert_eq!(res.rules[0].text, "@@||ads.com^");
    assert_eq!(res.rules[0].filter_list_id, 2);
}

#[tokio::test]
async fn test_subdomains_are_blocked_too() {
    let filter = new_filter("||ads.com^", "");

    for host in ["ads.com", "sub.ads.com", "deep.sub.ads.com"] {
        let res = filter
            .check_host(host, RecordType::A, &settings())
            .await
            .unwrap();
        assert_eq!(res.reason, Reason::FilteredBlockList, "host {host}");
    }

    let res = filter
        .check_host("notads.com", RecordType::A, &settings())
        .await
        .unwrap();
    assert_eq!(res, CheckResult::default());
}

#[tokio::test]
async fn test_exception_inside_block_list_allows() {
    let filter = new_filter("||ads.com^\n@@||good.ads.com^", "");

    let res = filter
        .check_host("good.ads.com", RecordType::A, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::NotFilteredAllowList);
    assert!(!res.is_filtered);
}

#[tokio::test]
async fn test_hosts_rule_with_matching_qtype() {
    let filter = new_filter("1.2.3.4 ads.com", "");

    let res = filter
        .check_host("ads.com", RecordType::A, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::FilteredBlockList);
    assert!(res.is_filtered);
    assert_eq!(res.rules[0].ip, Some("1.2.3.4".parse().unwrap()));
}

#[tokio::test]
async fn test_hosts_rule_with_mismatched_qtype_single_rule_no_ip() {
    let filter = new_filter("1.2.3.4 ads.com", "");

    let res = filter
        .check_host("ads.com", RecordType::AAAA, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::FilteredBlockList);
    assert_eq!(res.rules.len(), 1);
    assert_eq!(res.rules[0].ip, None);
}

#[tokio::test]
async fn test_dnsrewrite_cname() {
    let filter = new_filter("||tracker.example.com^$dnsrewrite=sinkhole.example.net", "");

    let res = filter
        .check_host("tracker.example.com", RecordType::A, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::RewrittenRule);
    assert_eq!(res.canon_name.as_deref(), Some("sinkhole.example.net"));
}

#[tokio::test]
async fn test_dnsrewrite_addresses_accumulate() {
    let filter = new_filter(
        "||pixel.example.com^$dnsrewrite=NOERROR;A;198.51.100.1\n\
         ||pixel.example.com^$dnsrewrite=NOERROR;A;198.51.100.2",
        "",
    );

    let res = filter
        .check_host("pixel.example.com", RecordType::A, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::RewrittenRule);
    assert_eq!(res.rules.len(), 2);

    let rewrite = res.dns_rewrite_result.unwrap();
    assert_eq!(rewrite.rcode, ResponseCode::NoError);
    assert_eq!(rewrite.response[&RecordType::A].len(), 2);
}

#[tokio::test]
async fn test_dnsrewrite_refusal_wins() {
    let filter = new_filter(
        "||drop.example.com^$dnsrewrite=NOERROR;A;198.51.100.1\n\
         ||drop.example.com^$dnsrewrite=REFUSED",
        "",
    );

    let res = filter
        .check_host("drop.example.com", RecordType::A, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::RewrittenRule);
    let rewrite = res.dns_rewrite_result.unwrap();
    assert_eq!(rewrite.rcode, ResponseCode::Refused);
    assert!(rewrite.response.is_empty());
}

#[tokio::test]
async fn test_dnsrewrite_applies_with_protection_disabled() {
    let filter = new_filter("||tracker.example.com^$dnsrewrite=0.0.0.0", "");

    let setts = Settings {
        protection_enabled: false,
        ..settings()
    };

    let res = filter
        .check_host("tracker.example.com", RecordType::A, &setts)
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::RewrittenRule);
}

#[tokio::test]
async fn test_self_dnsrewrite_is_discarded_and_matching_continues() {
    let filter = new_filter(
        "||self.example.com^$dnsrewrite=self.example.com\n||self.example.com^",
        "",
    );

    let res = filter
        .check_host("self.example.com", RecordType::A, &settings())
        .await
        .unwrap();

    // The self-rewrite must not short-circuit; the plain block rule wins.
    assert_eq!(res.reason, Reason::FilteredBlockList);
    assert_eq!(res.rules[0].text, "||self.example.com^");
}

#[tokio::test]
async fn test_client_tag_rules_only_match_tagged_clients() {
    let filter = new_filter("||games.example.com^$ctag=device_gameconsole", "");

    let plain = filter
        .check_host("games.example.com", RecordType::A, &settings())
        .await
        .unwrap();
    assert_eq!(plain, CheckResult::default());

    let mut tagged = settings();
    tagged.client_tags = vec!["device_gameconsole".to_string()];
    let res = filter
        .check_host("games.example.com", RecordType::A, &tagged)
        .await
        .unwrap();
    assert_eq!(res.reason, Reason::FilteredBlockList);
}

#[tokio::test]
async fn test_client_rules_match_name_or_ip() {
    let filter = new_filter("||video.example.com^$client=kids-tablet", "");

    let mut named = settings();
    named.client_name = Some("Kids-Tablet".to_string());
    let res = filter
        .check_host("video.example.com", RecordType::A, &named)
        .await
        .unwrap();
    assert_eq!(res.reason, Reason::FilteredBlockList);

    let res = filter
        .check_host("video.example.com", RecordType::A, &settings())
        .await
        .unwrap();
    assert_eq!(res, CheckResult::default());
}

#[tokio::test]
async fn test_file_backed_list_and_missing_file() {
    let mut list = tempfile::NamedTempFile::new().unwrap();
    writeln!(list, "# test list").unwrap();
    writeln!(list, "||filed.example.com^").unwrap();
    list.flush().unwrap();

    let filter = DnsFilter::new(
        FilterConfig::default(),
        Arc::new(AdblockCompiler::new()),
        None,
    )
    .unwrap();

    filter
        .set_filters(
            vec![
                FilterListSource::from_file(1, list.path()),
                // A missing file is silently skipped, not an error.
                FilterListSource::from_file(2, "/nonexistent/warden-test.txt"),
                FilterListSource::default(),
            ],
            vec![],
            false,
        )
        .unwrap();

    let res = filter
        .check_host("filed.example.com", RecordType::A, &settings())
        .await
        .unwrap();
    assert_eq!(res.reason, Reason::FilteredBlockList);
}

#[tokio::test]
async fn test_unreadable_list_aborts_build_and_keeps_engine() {
    let dir = tempfile::tempdir().unwrap();

    let filter = new_filter("||old.example.com^", "");

    // A path that exists but cannot be read as a list fails the build.
    let result = filter.set_filters(
        vec![FilterListSource::from_file(1, dir.path())],
        vec![],
        false,
    );
    assert!(result.is_err());

    let res = filter
        .check_host("old.example.com", RecordType::A, &settings())
        .await
        .unwrap();
    assert_eq!(res.reason, Reason::FilteredBlockList);
}

#[tokio::test]
async fn test_rewrite_pre_pass_beats_block_list() {
    let conf = FilterConfig {
        rewrites: vec![warden_dns_domain::RewriteEntry::new(
            "pinned.example.com",
            "10.0.0.5",
        )],
        ..FilterConfig::default()
    };

    let filter = DnsFilter::new(conf, Arc::new(AdblockCompiler::new()), None).unwrap();
    filter
        .set_filters(
            vec![FilterListSource::from_data(1, "||pinned.example.com^")],
            vec![],
            false,
        )
        .unwrap();

    let res = filter
        .check_host("pinned.example.com", RecordType::A, &settings())
        .await
        .unwrap();

    assert_eq!(res.reason, Reason::Rewritten);
    assert_eq!(res.ip_list, vec!["10.0.0.5".parse::<std::net::IpAddr>().unwrap()]);
}
