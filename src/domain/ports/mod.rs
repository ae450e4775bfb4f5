//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interface that infrastructure
//! adapters implement:
//! - ResultStoreClient: search and export of invocations
//!
//! The trait keeps the sync pipeline independent of the transport, so the
//! same orchestrator runs against the REST client or an in-memory double.

pub mod result_store;

pub use result_store::{ResultStoreClient, ResultStoreError};
