//! CLI command implementations for lexirec

mod common;
mod due;
mod reindex;
mod seed;
mod serve;
mod similar;
mod stats;

pub use due::due;
pub use reindex::reindex;
pub use seed::seed;
pub use serve::serve;
pub use similar::similar;
pub use stats::stats;
