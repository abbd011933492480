pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod platform;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
