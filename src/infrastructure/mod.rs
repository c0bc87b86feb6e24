// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_catalogue;
pub mod csv_sink;
pub mod json_sink;
pub mod latest_run_sink;
pub mod webdriver;
