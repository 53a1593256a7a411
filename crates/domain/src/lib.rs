pub mod check_result;
pub mod dns_rewrite;
pub mod errors;
pub mod filter_list;
pub mod reason;
pub mod record_type;
pub mod rewrites;
pub mod service_catalog;

pub use check_result::{CheckResult, ResultRule};
pub use dns_rewrite::{DnsRewrite, DnsRewriteResult, ResponseCode, RewriteValue};
pub use errors::FilterError;
pub use filter_list::{
    FilterListSource, BLOCKED_SVCS_LIST_ID, CUSTOM_LIST_ID, PARENTAL_LIST_ID,
    SAFE_BROWSING_LIST_ID, SAFE_SEARCH_LIST_ID, SYS_HOSTS_LIST_ID,
};
pub use reason::Reason;
pub use record_type::RecordType;
pub use rewrites::{RewriteEntry, RewriteTable};
pub use service_catalog::ServiceDefinition;
