//! File input and output around the engine.

/// CSV export of state timelines and loaded peaks.
pub mod export;
/// JSON import of peak event feeds.
pub mod import;
