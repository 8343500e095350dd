pub mod network_report;
pub mod run_config;
pub mod summary;
