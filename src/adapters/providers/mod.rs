//! Generation providers. The mock terminates every fallback chain.

pub mod http;
pub mod mock;

pub use http::{HttpProvider, HttpProviderConfig};
pub use mock::{MockBehavior, MockProvider};
