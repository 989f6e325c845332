pub mod analysis;
pub mod commands;
pub mod config;
pub mod error;
pub mod geography;
pub mod log;
pub mod prompt;
pub mod render;
pub mod report;
pub mod species;
