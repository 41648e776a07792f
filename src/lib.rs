#[cfg(feature = "cli")]
pub mod cli;
pub mod engine;
pub mod model;
pub mod notify;
pub mod output;
pub mod report;
pub mod util;
