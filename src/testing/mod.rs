//! Test helpers: a scriptable chain endpoint.
//!
//! Available to this crate's own tests and, behind the `testing` feature,
//! to downstream integration tests.

mod mock_rpc;

pub use mock_rpc::MockChainRpc;
