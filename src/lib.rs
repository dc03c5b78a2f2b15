pub mod cli;
pub mod config;
pub mod logging;
pub mod update;
pub mod version;
