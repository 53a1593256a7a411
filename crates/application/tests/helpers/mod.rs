mod mock_ports;

pub use mock_ports::{
    MockCompiler, MockHostsContainer, MockReputationChecker, MockRuleSet, MockSafeSearch,
    SimpleHostRule, SimpleNetworkRule,
};
