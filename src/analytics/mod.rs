//! Score analytics: history storage, trend statistics, comparisons, export.

pub mod comparison;
pub mod export;
pub mod history;
pub mod reporter;
pub mod trend;
