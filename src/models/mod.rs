pub mod ledger;
pub mod observation;
pub mod station;

pub use ledger::{ledger_timestamp, ProcessedFile};
pub use observation::{scale_raw_value, Observation};
pub use station::{Station, StationKey};
