//! Opening-book continuations and trap classification

mod enrich;
mod traps;
mod types;

pub use enrich::{ContinuationEnricher, DEFAULT_ENRICH_CONCURRENCY};
pub use traps::{TrapClassifier, DEFAULT_TRAP_THRESHOLD};
pub use types::Continuation;
