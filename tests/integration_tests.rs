use httpmock::prelude::*;
use pivot_reports::core::Pipeline;
use pivot_reports::{
    CliConfig, ColumnSet, LocalStorage, OverflowMode, ReportEngine, ReportPipeline, TomlConfig,
};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

const SALES_CSV: &str = "codVendedor,classeProduto,codCliente,nomeCliente,codProduto,nomeProduto,qtVendida\n\
S1,C1,CustA,Ana,P1,Widget,3\n\
S1,C1,CustA,Ana,P1,Widget,2\n\
S1,C1,CustB,Bea,P2,Gadget,0\n\
S1,C2,CustA,Ana,P3,Bolt,n/a\n\
S2,C1,CustC,Cid,P1,Widget,4\n";

fn cli_config(input: String, output_path: String) -> CliConfig {
    CliConfig {
        input,
        output_path,
        archive_name: "sales_reports.zip".to_string(),
        title: "Sales Report".to_string(),
        column_set: ColumnSet::FirstRow,
        overflow: OverflowMode::Truncate,
        concurrent_renders: 2,
        max_records: None,
        field_mapping: vec![],
        verbose: false,
        monitor: false,
        json_logs: false,
    }
}

fn archive_entries(path: &Path) -> (Vec<String>, zip::ZipArchive<std::io::Cursor<Vec<u8>>>) {
    let zip_data = std::fs::read(path).unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let names = archive.file_names().map(str::to_string).collect();
    (names, archive)
}

#[tokio::test]
async fn test_end_to_end_from_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("sales.csv");
    std::fs::write(&input, SALES_CSV).unwrap();
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let config = cli_config(input.to_str().unwrap().to_string(), output_path.clone());
    let pipeline = ReportPipeline::new(LocalStorage::new(output_path.clone()), config);
    let engine = ReportEngine::new_with_monitoring(pipeline, false);

    let result = engine.run().await.unwrap();
    assert!(result.ends_with("sales_reports.zip"));

    let full_path = Path::new(&output_path).join("sales_reports.zip");
    assert!(full_path.exists());

    let (names, mut archive) = archive_entries(&full_path);
    let pdfs: Vec<&String> = names.iter().filter(|n| n.ends_with(".pdf")).collect();
    assert_eq!(pdfs.len(), 3);
    assert!(names.contains(&"S1/S1_C1.pdf".to_string()));
    assert!(names.contains(&"S1/S1_C2.pdf".to_string()));
    assert!(names.contains(&"S2/S2_C1.pdf".to_string()));

    let mut pdf = Vec::new();
    archive
        .by_name("S1/S1_C1.pdf")
        .unwrap()
        .read_to_end(&mut pdf)
        .unwrap();
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);

    let content = doc.get_page_content(*pages.get(&1).unwrap()).unwrap();
    let content = String::from_utf8_lossy(&content);
    assert!(content.contains("SELLER: S1"));
    assert!(content.contains("P1 - Widget"));
    // 第一列決定欄位，Bea 的 P2 不會出現
    assert!(!content.contains("P2 - Gadget"));
}

#[tokio::test]
async fn test_end_to_end_from_remote_json() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/sales");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"seller_code": "V9", "category_code": "K1", "customer_code": "1",
                 "customer_name": "Ana", "product_code": "P1", "product_name": "Widget",
                 "quantity_sold": 1},
                {"seller_code": "V9", "category_code": "K2", "customer_code": "2",
                 "customer_name": "Bea", "product_code": "P2", "product_name": "Gadget",
                 "quantity_sold": "2"}
            ]));
    });

    let config = cli_config(server.url("/sales"), output_path.clone());
    let pipeline = ReportPipeline::new(LocalStorage::new(output_path.clone()), config);
    let result = ReportEngine::new(pipeline).run().await;

    assert!(result.is_ok());
    api_mock.assert();

    let (names, _) = archive_entries(&Path::new(&output_path).join("sales_reports.zip"));
    assert!(names.contains(&"V9/V9_K1.pdf".to_string()));
    assert!(names.contains(&"V9/V9_K2.pdf".to_string()));
}

#[tokio::test]
async fn test_end_to_end_with_remote_failure() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/failed");
        then.status(503);
    });

    let config = cli_config(server.url("/failed"), output_path.clone());
    let pipeline = ReportPipeline::new(LocalStorage::new(output_path.clone()), config);
    let err = ReportEngine::new(pipeline).run().await.unwrap_err();

    api_mock.assert();
    assert_eq!(err.exit_code(), 2);
    assert!(!Path::new(&output_path).join("sales_reports.zip").exists());
}

#[tokio::test]
async fn test_toml_config_with_pagination() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("big.json");

    let records: Vec<serde_json::Value> = (0..200)
        .map(|i| {
            serde_json::json!({
                "seller_code": "S1", "category_code": "C1",
                "customer_code": format!("{}", i), "customer_name": format!("Customer {}", i),
                "product_code": "P1", "product_name": "Widget", "quantity_sold": i % 2
            })
        })
        .collect();
    std::fs::write(&input, serde_json::to_vec(&records).unwrap()).unwrap();

    let toml_content = format!(
        r#"
[report]
name = "paginated"

[source]
input = "{}"

[render]
overflow = "paginate"

[output]
path = "{}"
archive_name = "paged.zip"
"#,
        input.to_str().unwrap(),
        temp_dir.path().to_str().unwrap()
    );
    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    let pipeline = ReportPipeline::new(LocalStorage::new(temp_dir.path()), config);

    let records = pipeline.extract().await.unwrap();
    let result = pipeline.transform(records).await.unwrap();
    assert_eq!(result.truncated_rows, 0);

    let pdf = &result.reports["S1"]["C1"];
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    // 73 rows per page → 200 rows need 3 pages
    assert_eq!(doc.get_pages().len(), 3);

    let output = pipeline.load(result).await.unwrap();
    assert!(Path::new(&output).exists());
}

#[tokio::test]
async fn test_truncation_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("big.csv");

    let mut csv = String::from(
        "seller_code,category_code,customer_code,customer_name,product_code,product_name,quantity_sold\n",
    );
    for i in 0..100 {
        csv.push_str(&format!("S1,C1,{},Customer {},P1,Widget,1\n", i, i));
    }
    std::fs::write(&input, csv).unwrap();

    let config = cli_config(
        input.to_str().unwrap().to_string(),
        temp_dir.path().to_str().unwrap().to_string(),
    );
    let pipeline = ReportPipeline::new(LocalStorage::new(temp_dir.path()), config);

    let records = pipeline.extract().await.unwrap();
    let result = pipeline.transform(records).await.unwrap();
    assert_eq!(result.truncated_rows, 100 - 73);

    let doc = lopdf::Document::load_mem(&result.reports["S1"]["C1"]).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}
