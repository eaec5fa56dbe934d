//! Citescope sources — OpenAlex and Semantic Scholar fetchers.
//!
//! Collects, per input DOI, the paper's metadata, its outgoing references
//! and its incoming citations from both providers, merges the per-provider
//! lists through the core's identity rules, and materializes the citation
//! document the engine consumes. Rate limiting, pagination and retries
//! live here; the engine itself never touches the network.

pub mod config;
pub mod doi;
pub mod error;
pub mod harvest;
pub mod http;
pub mod openalex;
pub mod semantic_scholar;

pub use config::FetchConfig;
pub use error::{FetchError, Result};
pub use harvest::Harvester;
