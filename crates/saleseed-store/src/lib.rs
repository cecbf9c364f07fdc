//! SQLite storage for saleseed.
//!
//! Owns the fixed schema, the chunked insert-if-absent writer, the explicit
//! identifier allocator and the seed-marker queries used by the generator.

pub mod allocator;
pub mod bulk;
pub mod connect;
pub mod errors;
pub mod queries;
pub mod records;
pub mod schema;
pub mod timestamp;

pub use allocator::{ids_after, insert_and_allocate, max_id, verify_allocation};
pub use bulk::{InsertOutcome, Insertable, insert_chunked};
pub use connect::Store;
pub use errors::{StoreError, StoreResult};
pub use queries::{EntityCounts, ResetSummary};
pub use records::{AccountRef, CategoryRef, ProductRef, ResellerRef};
pub use timestamp::encode_timestamp;
