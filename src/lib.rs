//! A normalized, queryable catalog of LLM model metadata.
//!
//! The registry is built from the first source that answers: the live
//! upstream API, then a snapshot bundled at build time, then a hardcoded
//! list. Loading never fails; consumers read [`catalog::SourceTag`] to learn
//! how fresh the data is.

pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod jobs;
#[cfg(feature = "cli")]
pub mod observability;
pub mod sources;

pub use catalog::{NormalizedModel, QueryOptions, Registry, SourceTag, find_model, query};
pub use client::{CatalogClient, CatalogState};
pub use config::RegistryConfig;

#[cfg(test)]
mod tests;
