pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use core::{engine::MergeEngine, normalizer::normalize, pipeline::MergePipeline};
pub use utils::error::{MergeError, Result};
