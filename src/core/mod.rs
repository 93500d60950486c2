pub mod engine;
pub mod normalizer;
pub mod pipeline;
pub mod sources;

pub use crate::domain::model::{
    MergeResult, Normalization, RunSummary, SourceDocument, SourceRules, SourceSummary,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
