pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "rulemerge")]
#[command(about = "Fetches ad-block filter lists and merges them into one canonical ruleset")]
pub struct CliConfig {
    /// Newline-delimited list of source URLs ('!' starts a comment)
    #[arg(long, default_value = "urls.txt")]
    pub urls_file: String,

    /// Root directory for the tmp/ and dist/ artifacts
    #[arg(long, default_value = ".")]
    pub output_path: String,

    /// Per-source download timeout in seconds
    #[arg(long, default_value = "20")]
    pub timeout_seconds: u64,

    /// Keep duplicate rules in the merged output
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Keep insertion order instead of sorting the merged output
    #[arg(long)]
    pub no_sort: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn urls_file(&self) -> &str {
        &self.urls_file
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn dedupe(&self) -> bool {
        !self.keep_duplicates
    }

    fn sort_output(&self) -> bool {
        !self.no_sort
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("urls_file", &self.urls_file)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}
