pub mod importer;
pub mod report;

pub use importer::{DiscoveredFiles, Importer};
pub use report::{FileReport, ImportReport};
