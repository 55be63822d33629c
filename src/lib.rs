pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod processors;
pub mod readers;
pub mod store;
pub mod utils;

pub use error::{ImportError, Result};
