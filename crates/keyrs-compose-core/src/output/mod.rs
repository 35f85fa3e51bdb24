// Keyrs Compose Output Module
// Table emission and run statistics

pub mod format;
pub mod stats;

pub use format::{format_row, write_algorithmic, write_compact, write_flat, write_multi};
pub use stats::Statistics;
