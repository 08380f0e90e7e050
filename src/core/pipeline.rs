use crate::adapters::source::{self, FieldResolver, SourceFormat};
use crate::core::aggregator;
use crate::core::archive;
use crate::core::renderer::GridRenderer;
use crate::core::{ConfigProvider, Pipeline, SalesRecord, Storage, TransformResult};
use crate::domain::model::{GroupKey, ReportSet};
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::is_remote_source;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of rendering one (seller, category) group.
struct RenderedGroup {
    key: GroupKey,
    document: Vec<u8>,
    truncated_rows: usize,
}

pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    async fn fetch_remote(&self, url: &str, resolver: &FieldResolver) -> Result<Vec<SalesRecord>> {
        let mut request = self.client.get(url);

        for (key, value) in self.config.request_headers() {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.config.request_timeout_seconds() {
            request = request.timeout(Duration::from_secs(timeout));
        }

        tracing::debug!("Making request to: {}", url);
        let response = request.send().await?.error_for_status()?;
        tracing::debug!("Response status: {}", response.status());

        let body: serde_json::Value = response.json().await?;
        source::decode_json_value(body, resolver)
    }

    async fn read_local(&self, path: &str, resolver: &FieldResolver) -> Result<Vec<SalesRecord>> {
        let format = SourceFormat::from_path(path)?;
        let data = self.storage.read_file(path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), path);
        source::decode(format, &data, resolver)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SalesRecord>> {
        let input = self.config.input_source();
        let resolver = FieldResolver::new(&self.config.field_mapping());

        let mut records = if is_remote_source(input) {
            self.fetch_remote(input, &resolver).await?
        } else {
            self.read_local(input, &resolver).await?
        };

        if let Some(max) = self.config.max_records() {
            if records.len() > max {
                tracing::warn!(
                    "Input has {} records, keeping the first {}",
                    records.len(),
                    max
                );
                records.truncate(max);
            }
        }

        Ok(records)
    }

    async fn transform(&self, records: Vec<SalesRecord>) -> Result<TransformResult> {
        let record_count = records.len();
        let grouped = aggregator::group(&records);
        drop(records);

        let renderer = Arc::new(GridRenderer::new(self.config.render_config()));
        let permits = Arc::new(Semaphore::new(self.config.concurrent_renders().max(1)));
        let mut tasks = JoinSet::new();

        for (seller, categories) in grouped {
            for (category, bucket) in categories {
                let key = GroupKey {
                    seller_code: seller.clone(),
                    category_code: category,
                };
                let renderer = Arc::clone(&renderer);
                let permit = Arc::clone(&permits)
                    .acquire_owned()
                    .await
                    .map_err(|e| ReportError::ProcessingError {
                        message: format!("render pool closed: {}", e),
                    })?;

                tasks.spawn_blocking(move || {
                    let _permit = permit;
                    tracing::debug!(
                        "Rendering report for seller {}, category {} ({} records)",
                        key.seller_code,
                        key.category_code,
                        bucket.len()
                    );
                    let rows = aggregator::pivot(&bucket);
                    let layout =
                        renderer.render_layout(&key.seller_code, &key.category_code, &rows);
                    let document =
                        renderer.encode(&key.seller_code, &key.category_code, &layout)?;
                    Ok::<_, ReportError>(RenderedGroup {
                        key,
                        document,
                        truncated_rows: layout.truncated_rows,
                    })
                });
            }
        }

        let mut reports = ReportSet::new();
        let mut document_count = 0;
        let mut truncated_rows = 0;

        while let Some(joined) = tasks.join_next().await {
            let rendered = joined??;
            document_count += 1;
            truncated_rows += rendered.truncated_rows;
            reports
                .entry(rendered.key.seller_code)
                .or_default()
                .insert(rendered.key.category_code, rendered.document);
        }

        if truncated_rows > 0 {
            tracing::warn!(
                "{} customer rows did not fit on a single page and were left out",
                truncated_rows
            );
        }

        Ok(TransformResult {
            reports,
            record_count,
            document_count,
            truncated_rows,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let archive_name = self.config.archive_name();

        tracing::debug!(
            "Creating ZIP file with {} documents for {} sellers",
            result.document_count,
            result.reports.len()
        );
        let zip_data = archive::bundle(&result.reports)?;

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(&archive_name, &zip_data).await?;

        let output_path = Path::new(self.config.output_path()).join(&archive_name);
        Ok(output_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::render::RenderConfig;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::io::Read;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ReportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.put(path, data).await;
            Ok(())
        }
    }

    struct MockConfig {
        input: String,
        max_records: Option<usize>,
        render: RenderConfig,
        headers: HashMap<String, String>,
    }

    impl MockConfig {
        fn new(input: impl Into<String>) -> Self {
            Self {
                input: input.into(),
                max_records: None,
                render: RenderConfig::default(),
                headers: HashMap::new(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_source(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn archive_name(&self) -> String {
            "reports.zip".to_string()
        }

        fn concurrent_renders(&self) -> usize {
            2
        }

        fn max_records(&self) -> Option<usize> {
            self.max_records
        }

        fn field_mapping(&self) -> HashMap<String, String> {
            HashMap::new()
        }

        fn render_config(&self) -> RenderConfig {
            self.render.clone()
        }

        fn request_headers(&self) -> HashMap<String, String> {
            self.headers.clone()
        }
    }

    const SAMPLE_CSV: &str = "seller_code,category_code,customer_code,customer_name,product_code,product_name,quantity_sold\n\
S1,C1,CustA,Ana,P1,Widget,3\n\
S1,C1,CustA,Ana,P1,Widget,2\n\
S1,C1,CustB,Bea,P2,Gadget,0\n\
S1,C2,CustA,Ana,P3,Bolt,1\n\
S2,C1,CustC,Cid,P1,Widget,4\n";

    #[tokio::test]
    async fn test_extract_from_local_csv() {
        let storage = MockStorage::default();
        storage.put("sales.csv", SAMPLE_CSV.as_bytes()).await;
        let pipeline = ReportPipeline::new(storage, MockConfig::new("sales.csv"));

        let records = pipeline.extract().await.unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[4].seller_code, "S2");
    }

    #[tokio::test]
    async fn test_extract_respects_max_records() {
        let storage = MockStorage::default();
        storage.put("sales.csv", SAMPLE_CSV.as_bytes()).await;
        let mut config = MockConfig::new("sales.csv");
        config.max_records = Some(2);
        let pipeline = ReportPipeline::new(storage, config);

        assert_eq!(pipeline.extract().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_missing_file_fails() {
        let pipeline = ReportPipeline::new(MockStorage::default(), MockConfig::new("nope.json"));
        assert!(matches!(
            pipeline.extract().await,
            Err(ReportError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_from_remote_json() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/sales")
                .header("authorization", "Bearer token");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {"codVendedor": "V1", "classeProduto": "K1", "codCliente": "1",
                     "nomeCliente": "Ana", "codProduto": "P1", "nomeProduto": "Widget",
                     "qtVendida": 3}
                ]));
        });

        let mut config = MockConfig::new(server.url("/sales"));
        config
            .headers
            .insert("Authorization".to_string(), "Bearer token".to_string());
        let pipeline = ReportPipeline::new(MockStorage::default(), config);

        let records = pipeline.extract().await.unwrap();
        api_mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].seller_code, "V1");
        assert_eq!(records[0].quantity_sold, 3.0);
    }

    #[tokio::test]
    async fn test_extract_remote_server_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(500);
        });

        let pipeline =
            ReportPipeline::new(MockStorage::default(), MockConfig::new(server.url("/broken")));
        assert!(matches!(
            pipeline.extract().await,
            Err(ReportError::HttpError(_))
        ));
    }

    #[tokio::test]
    async fn test_transform_renders_one_document_per_group() {
        let storage = MockStorage::default();
        storage.put("sales.csv", SAMPLE_CSV.as_bytes()).await;
        let pipeline = ReportPipeline::new(storage, MockConfig::new("sales.csv"));

        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();

        assert_eq!(result.record_count, 5);
        assert_eq!(result.document_count, 3);
        assert_eq!(result.truncated_rows, 0);
        assert_eq!(result.reports["S1"].len(), 2);
        assert!(result.reports["S2"]["C1"].starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_transform_seller_with_many_categories() {
        let records: Vec<SalesRecord> = ["C1", "C2", "C3", "C4"]
            .iter()
            .map(|category| SalesRecord {
                seller_code: "S1".to_string(),
                category_code: category.to_string(),
                customer_code: "1".to_string(),
                customer_name: "Ana".to_string(),
                product_code: "P1".to_string(),
                product_name: "Widget".to_string(),
                quantity_sold: 1.0,
            })
            .collect();

        let pipeline = ReportPipeline::new(MockStorage::default(), MockConfig::new("x.csv"));
        let result = pipeline.transform(records).await.unwrap();

        assert_eq!(result.document_count, 4);
        assert_eq!(result.reports.len(), 1);
        let categories: Vec<&String> = result.reports["S1"].keys().collect();
        assert_eq!(categories, ["C1", "C2", "C3", "C4"]);
    }

    #[tokio::test]
    async fn test_transform_empty_input() {
        let pipeline = ReportPipeline::new(MockStorage::default(), MockConfig::new("x.csv"));
        let result = pipeline.transform(Vec::new()).await.unwrap();
        assert_eq!(result.document_count, 0);
        assert!(result.reports.is_empty());
    }

    #[tokio::test]
    async fn test_load_writes_archive() {
        let storage = MockStorage::default();
        storage.put("sales.csv", SAMPLE_CSV.as_bytes()).await;
        let pipeline = ReportPipeline::new(storage.clone(), MockConfig::new("sales.csv"));

        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();
        let output = pipeline.load(result).await.unwrap();

        assert!(output.ends_with("reports.zip"));
        let zip_data = storage.get_file("reports.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();

        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"S1/S1_C1.pdf".to_string()));
        assert!(names.contains(&"S1/S1_C2.pdf".to_string()));
        assert!(names.contains(&"S2/S2_C1.pdf".to_string()));

        let mut pdf = Vec::new();
        archive
            .by_name("S1/S1_C1.pdf")
            .unwrap()
            .read_to_end(&mut pdf)
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-1.7"));
    }
}
