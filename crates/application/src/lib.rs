pub mod filter;
pub mod ports;

pub use filter::{DnsFilter, FilterConfig, ServiceEntry, Settings};
