//! Process-wide tracing setup shared by the store's hosts and tests.

/// Subscriber construction (filters, formats).
pub mod subscriber;

pub use subscriber::{DEFAULT_FILTER, init, init_for_tests};
