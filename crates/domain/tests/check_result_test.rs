use warden_dns_domain::{CheckResult, Reason, ResultRule};

#[test]
fn test_empty_result_serializes_to_empty_object() {
    let res = CheckResult::default();
    let json = serde_json::to_value(&res).unwrap();
    assert_eq!(json, serde_json::json!({}));
}

#[test]
fn test_block_result_omits_unset_fields() {
    let res = CheckResult::from_rules(
        vec![ResultRule::new("||ads.example.com^", 7)],
        Reason::FilteredBlockList,
    );

    let json = serde_json::to_value(&res).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "is_filtered": true,
            "reason": "FilteredBlackList",
            "rules": [{"text": "||ads.example.com^", "filter_list_id": 7}],
        })
    );
}

#[test]
fn test_from_rules_sets_is_filtered_only_for_block_list() {
    let block = CheckResult::from_rules(vec![], Reason::FilteredBlockList);
    assert!(block.is_filtered);

    let allow = CheckResult::from_rules(vec![], Reason::NotFilteredAllowList);
    assert!(!allow.is_filtered);

    let rewrite = CheckResult::from_rules(vec![], Reason::RewrittenRule);
    assert!(!rewrite.is_filtered);
}

#[test]
fn test_rewrite_result_carries_canon_name_and_ips() {
    let res = CheckResult {
        reason: Reason::Rewritten,
        canon_name: Some("target.example.com".into()),
        ip_list: vec!["1.2.3.4".parse().unwrap()],
        ..CheckResult::default()
    };

    let json = serde_json::to_value(&res).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "reason": "Rewrite",
            "ip_list": ["1.2.3.4"],
            "canon_name": "target.example.com",
        })
    );
}
