/// Clock capability used by every time-relative query.
pub mod clock;
/// Errors raised while building peak events.
pub mod error;
/// Peak event value object and its criticality policy.
pub mod event;
/// Stateful query engine over the loaded peak events of one rate.
pub mod handler;
/// Derived pre-heat and anchor windows.
pub mod period;
/// Offer code to internal rate mapping.
pub mod rates;
/// Raw record normalization at the ingestion boundary.
pub mod record;
/// Regular winter peak schedule generation.
pub mod schedule;
/// Peak state labels and timeline samples.
pub mod state;
/// America/Toronto time handling and date parsing.
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::PeakError;
pub use event::{Criticality, PeakEvent, Sector, TimeSlot};
pub use handler::{LoadSummary, PeakHandler, PeakSnapshot, RecordFailure};
pub use period::{AnchorPeriod, PreHeatPeriod};
pub use rates::{RateCodeEntry, RateCodeMap, RateOption, RateTable};
pub use record::PeakRecord;
pub use schedule::WinterSchedule;
pub use state::{PeakState, StateSample};
