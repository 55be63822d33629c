pub mod schema;
pub mod weather_store;

pub use weather_store::{FileTransaction, InsertOutcome, StationSummary, StoreStats, WeatherStore};
