//! Winter peak event time-window engine.
//!
//! Classifies any instant against the published winter peaks of a
//! demand-response rate: regular period, pre-heat, peak or critical peak.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod io;
pub mod opendata;
/// Peak model, derived windows and the query handler.
pub mod peak;
pub mod reporting;
