use crate::domain::model::{MergeResult, SourceDocument};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn urls_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn dedupe(&self) -> bool;
    fn sort_output(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceDocument>>;
    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<MergeResult>;
    async fn load(&self, result: MergeResult) -> Result<String>;
}
