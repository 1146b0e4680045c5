// Shared value types for the notary client

pub mod document;

pub use document::*;
