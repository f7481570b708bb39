//! Core infrastructure: errors, configuration, project detection

pub mod config;
pub mod error;
pub mod project;
