use crate::config::render::RenderConfig;
use crate::domain::model::{SalesRecord, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Local `.csv`/`.json` path (relative to storage) or an http(s) URL.
    fn input_source(&self) -> &str;
    fn output_path(&self) -> &str;
    fn archive_name(&self) -> String;
    fn concurrent_renders(&self) -> usize;
    fn max_records(&self) -> Option<usize>;
    /// source column name → canonical field name
    fn field_mapping(&self) -> HashMap<String, String>;
    fn render_config(&self) -> RenderConfig;

    fn request_headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        None
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SalesRecord>>;
    async fn transform(&self, records: Vec<SalesRecord>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
