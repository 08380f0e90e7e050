use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs extract → transform → load and reports progress.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting report generation");
        self.monitor.log_stats("Start");

        tracing::info!("📥 Extracting sales records...");
        let records = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", records.len());
        self.monitor.log_stats("Extract");

        tracing::info!("🧮 Pivoting and rendering reports...");
        let result = self.pipeline.transform(records).await?;
        tracing::info!(
            "Rendered {} documents for {} sellers",
            result.document_count,
            result.reports.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("📦 Bundling archive...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Archive saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
