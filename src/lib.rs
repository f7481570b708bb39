//! codeindex - cross-file code index
//!
//! Discovers source files, extracts declarations with per-language
//! strategies, names every symbol `path:name`, links calls, instantiations
//! and imports across files, and persists the result as one JSON document.

pub mod cli;
pub mod core;
pub mod index;
pub mod output;
pub mod scan;
pub mod strategy;
pub mod watch;

pub use core::config::Config;
pub use core::error::{Error, Result};
pub use core::project::Project;
pub use index::{build_index, CodeIndex, IndexManager, IndexState};
pub use strategy::StrategyRegistry;
