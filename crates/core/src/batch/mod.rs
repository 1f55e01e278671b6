//! Batch execution
//!
//! [`BatchExecutor`] runs one operation per input item, serially or with
//! paced concurrent launches, and hands each settled result to
//! [`OutputRouter`] in input order.

pub mod executor;
pub mod router;

pub use executor::BatchExecutor;
pub use router::{OutputRouter, RouteOutcome};
