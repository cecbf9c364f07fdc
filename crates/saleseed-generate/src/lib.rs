//! Dependency-ordered generation of synthetic reseller sales data.
//!
//! Stages run strictly in foreign-key order (accounts, resellers, categories,
//! products, product/category links, then sales with their items), each one
//! idempotent against the rows already in the store and written through the
//! chunked insert-if-absent writer.

pub mod engine;
pub mod errors;
pub mod facts;
pub mod model;
pub mod naming;
pub mod stages;

pub use engine::SeedEngine;
pub use errors::GenerationError;
pub use facts::ReferencePools;
pub use model::{SeedReport, StageReport};
pub use naming::SequenceNamer;
