pub mod analyzer;
pub mod churn;
pub mod cli;
pub mod error;
pub mod fleet;
pub mod git;
pub mod loc;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod report;
pub mod summary;
pub mod workdir;
