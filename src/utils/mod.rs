//! Utility modules for common functionality
//!
//! Logging setup, batch progress, output naming and previews.

pub mod logger;
pub mod progress;
pub mod path_utils;
pub mod preview;

pub use logger::{init_logging, Logger};
pub use progress::ProgressTracker;
