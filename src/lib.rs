//! ATS resume checker library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;
pub mod profiles;

pub use config::Config;
pub use error::{AtsCheckerError, Result};
pub use output::report::AnalysisReport;
pub use processing::analyzer::AnalysisPipeline;
pub use processing::capabilities::Capabilities;
pub use profiles::ProfileTable;
