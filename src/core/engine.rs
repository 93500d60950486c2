use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct MergeEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> MergeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        println!("Starting filter list merge...");

        // Extract
        println!("Fetching sources...");
        let documents = self.pipeline.extract().await?;
        println!("Fetched {} sources", documents.len());
        self.monitor.log_stats("extract");

        // Transform
        println!("Normalizing rules...");
        let result = self.pipeline.transform(documents).await?;
        println!(
            "Collected {} rules from {} sources",
            result.merged.len(),
            result.per_source.len()
        );
        self.monitor.log_stats("transform");

        // Load
        println!("Writing artifacts...");
        let output_path = self.pipeline.load(result).await?;
        println!("Merged rules saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
