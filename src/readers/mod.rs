pub mod filename;
pub mod observation_reader;

pub use filename::resolve_station;
pub use observation_reader::{
    LineOutcome, ObservationIterator, ObservationReader, SkipReason, SkippedLine,
};
