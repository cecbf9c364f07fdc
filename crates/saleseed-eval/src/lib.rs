//! Consistency checks over a seeded store.

pub mod checks;
pub mod errors;
pub mod model;
pub mod report;

pub use checks::evaluate;
pub use errors::EvalError;
pub use model::{CheckSummary, DatasetReport, Violation};
pub use report::render_report;
