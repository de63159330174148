//! Folds the unified event stream into per-symbol bars with their attached
//! feature set, and composes the per-bar `Snapshot` fed to the analyzers.

pub mod atr;
pub mod engine;
pub mod price_tracker;
pub mod snapshot_builder;
pub mod vva_history;

pub use atr::WilderAtr;
pub use engine::FeatureEngine;
pub use price_tracker::PriceTracker;
pub use snapshot_builder::SnapshotBuilder;
pub use vva_history::VvaHistory;
