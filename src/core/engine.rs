use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct ExtractEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ExtractEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn run(&self) -> Result<Vec<String>> {
        let started = Instant::now();
        tracing::info!("🚀 Starting extraction...");

        // Extract
        let raw_data = self.pipeline.extract()?;
        tracing::info!("📥 Extracted {} records", raw_data.len());

        // Transform
        let result = self.pipeline.transform(raw_data)?;
        tracing::info!(
            "🔄 Transformed {} records ({} rejected)",
            result.records.len(),
            result.rejected
        );

        // Load
        let outputs = self.pipeline.load(result)?;
        tracing::info!(
            "✅ Wrote {} files in {} ms",
            outputs.len(),
            started.elapsed().as_millis()
        );

        Ok(outputs)
    }
}
