pub mod rulelist;

pub use rulelist::AdblockCompiler;
