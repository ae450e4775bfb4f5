//! ResultStore adapters
//!
//! - `HttpResultStoreClient`: REST v2 client used in production
//! - `InMemoryResultStoreClient`: canned answers for tests and dry runs

pub mod http_client;
pub mod memory_client;

pub use http_client::HttpResultStoreClient;
pub use memory_client::InMemoryResultStoreClient;
