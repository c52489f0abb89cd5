//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the search API, the detail pages
//! and the image host, and run full category sessions end-to-end.

use reddot_folio::config::{
    ApiConfig, CategoryConfig, Config, CrawlConfig, OutputConfig, RetryConfig,
};
use reddot_folio::crawler::Coordinator;
use reddot_folio::output::{SessionOutcome, NO_DESCRIPTION, PAGE_SEPARATOR};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, root: &Path, categories: &[(&str, &str)]) -> Config {
    Config {
        api: ApiConfig {
            base_url: format!("{}/search.json", base_url),
            site_base_url: base_url.to_string(),
            user_agent: "TestFolio/1.0".to_string(),
        },
        retry: RetryConfig {
            max_attempts: 3,
            delay_ms: 5, // Very short for testing
            timeout_secs: 5,
        },
        crawl: CrawlConfig {
            max_workers: 4,
            keyword: None,
            max_pages: 0,
            stop_on_repeated_page: true,
        },
        output: OutputConfig {
            root_dir: root.display().to_string(),
            artifact_prefix: "designs".to_string(),
            document_title: "Test Collection".to_string(),
            attribution: "folio-test".to_string(),
            page_width: 40,
        },
        categories: categories
            .iter()
            .map(|(name, filter)| CategoryConfig {
                name: name.to_string(),
                filters: vec![filter.to_string()],
            })
            .collect(),
    }
}

fn search_body(base_url: &str, ids: &[&str]) -> String {
    let docs: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "title": format!("Design {}", id),
                "data": {"category": "Furniture", "year": "2024"},
                "image": {"large": format!("{}/img/{}.jpg", base_url, id)},
                "meta_second": "Api Studio",
                "url": format!("/project/{}", id),
            })
        })
        .collect();
    json!({"result": {"docs": docs}}).to_string()
}

async fn mount_search_page(server: &MockServer, filter: &str, page: u32, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("solr[filter][]", filter))
        .and(query_param("solr[page]", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_body(&server.uri(), ids)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, description: &str, credits: &[&str]) {
    let values: String = credits
        .iter()
        .map(|c| format!(r#"<li><span class="label">Credit</span><span class="value">{}</span></li>"#, c))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/project/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><div class="description">{}</div><ul class="credits">{}</ul></body></html>"#,
            description, values
        )))
        .mount(server)
        .await;
}

async fn mount_images(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/.+\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"jpeg bytes".to_vec(), "image/jpeg"))
        .mount(server)
        .await;
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("row store readable");
    let header = reader
        .headers()
        .expect("header")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("row").iter().map(String::from).collect())
        .collect();
    (header, rows)
}

#[tokio::test]
async fn test_full_crawl_single_category() {
    let server = MockServer::start().await;
    let filter = "meta_categories:/10/";

    mount_search_page(&server, filter, 1, &["a", "b"]).await;
    mount_search_page(&server, filter, 2, &["b", "c"]).await;
    mount_search_page(&server, filter, 3, &[]).await;
    mount_detail(&server, "a", "Folding chair", &["Acme", "Jane Doe"]).await;
    mount_detail(&server, "b", "Oak table", &["Nord"]).await;
    mount_detail(&server, "c", "Desk lamp", &[]).await;
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &[("product_design", filter)]);

    let coordinator = Coordinator::new(config).expect("coordinator");
    let stats = coordinator.run().await.expect("crawl");

    assert_eq!(stats.len(), 1);
    let stats = &stats[0];
    assert_eq!(stats.outcome, SessionOutcome::EndOfResults);
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.records_received, 4);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.records_enriched, 3);
    assert_eq!(stats.rows_persisted, 3);
    assert_eq!(stats.images_missing, 0);

    // Row store holds every record exactly once, in page order
    let category_root = dir.path().join("product_design");
    let (header, rows) = read_csv(&category_root.join("records.csv"));
    assert_eq!(header[0], "id");
    assert_eq!(&header[9..], ["sequence", "source_page"]);
    let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["/project/a", "/project/b", "/project/c"]);

    let a = &rows[0];
    assert_eq!(a[3], "Acme, Jane Doe");
    assert_eq!(a[5], "Folding chair");
    assert_eq!(a[9], "1-1");
    // Credits block without values keeps the API author
    assert_eq!(rows[2][3], "Api Studio");
    assert_eq!(rows[2][9], "2-1");
    assert_eq!(rows[2][10], "2");

    // One asset per distinct image
    let assets = std::fs::read_dir(category_root.join("assets")).unwrap().count();
    assert_eq!(assets, 3);

    // Cover plus one page per record, numbered from 2
    let artifact = stats.artifact.as_ref().expect("artifact written");
    assert!(artifact.starts_with(&category_root));
    let name = artifact.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("designs_product_design_") && name.ends_with(".md"));

    let text = std::fs::read_to_string(artifact).unwrap();
    let pages: Vec<&str> = text.split(PAGE_SEPARATOR).collect();
    assert_eq!(pages.len(), 4);
    assert!(pages[0].contains("Test Collection"));
    assert!(!pages[0].contains("folio-test "));
    for (i, page) in pages[1..].iter().enumerate() {
        let footer = page.trim_end().lines().last().unwrap();
        assert!(footer.starts_with("folio-test"));
        assert!(footer.ends_with(&(i + 2).to_string()));
    }
    assert!(pages[1].contains("## 1-1 Design a"));
    assert!(pages[3].contains("## 2-1 Design c"));
}

#[tokio::test]
async fn test_fatal_category_does_not_stop_next() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("solr[filter][]", "meta_categories:/11/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    mount_search_page(&server, "meta_categories:/12/", 1, &["x"]).await;
    mount_search_page(&server, "meta_categories:/12/", 2, &[]).await;
    mount_detail(&server, "x", "Concept car", &["Studio X"]).await;
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &server.uri(),
        dir.path(),
        &[
            ("brand_communication_design", "meta_categories:/11/"),
            ("design_concept", "meta_categories:/12/"),
        ],
    );

    let stats = Coordinator::new(config).unwrap().run().await.unwrap();
    assert_eq!(stats.len(), 2);

    assert!(matches!(stats[0].outcome, SessionOutcome::FatalError(_)));
    assert_eq!(stats[0].pages_fetched, 0);
    assert!(stats[0].artifact.is_none());

    assert_eq!(stats[1].outcome, SessionOutcome::EndOfResults);
    assert_eq!(stats[1].records_enriched, 1);
    assert!(stats[1].artifact.as_ref().unwrap().exists());
}

#[tokio::test]
async fn test_detail_failure_keeps_api_values() {
    let server = MockServer::start().await;
    let filter = "meta_categories:/10/";

    mount_search_page(&server, filter, 1, &["broken"]).await;
    mount_search_page(&server, filter, 2, &[]).await;
    mount_images(&server).await;

    Mock::given(method("GET"))
        .and(path("/project/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &[("product_design", filter)]);

    let stats = Coordinator::new(config).unwrap().run().await.unwrap();
    let stats = &stats[0];
    assert_eq!(stats.records_enriched, 1);
    assert_eq!(stats.details_degraded, 1);

    let (_, rows) = read_csv(&dir.path().join("product_design").join("records.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][3], "Api Studio");
    assert_eq!(rows[0][5], "");

    let text = std::fs::read_to_string(stats.artifact.as_ref().unwrap()).unwrap();
    assert!(text.contains(NO_DESCRIPTION));
}

#[tokio::test]
async fn test_transient_page_failure_recovers() {
    let server = MockServer::start().await;
    let filter = "meta_categories:/10/";

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("solr[page]", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .with_priority(1)
        .mount(&server)
        .await;

    mount_search_page(&server, filter, 1, &["a"]).await;
    mount_search_page(&server, filter, 2, &[]).await;
    mount_detail(&server, "a", "Chair", &["Acme"]).await;
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &[("product_design", filter)]);

    let stats = Coordinator::new(config).unwrap().run().await.unwrap();
    assert_eq!(stats[0].outcome, SessionOutcome::EndOfResults);
    assert_eq!(stats[0].rows_persisted, 1);
}

#[tokio::test]
async fn test_empty_category_writes_no_document() {
    let server = MockServer::start().await;
    let filter = "meta_categories:/10/";
    mount_search_page(&server, filter, 1, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), &[("product_design", filter)]);

    let stats = Coordinator::new(config).unwrap().run().await.unwrap();
    assert_eq!(stats[0].outcome, SessionOutcome::EndOfResults);
    assert!(stats[0].artifact.is_none());
    assert!(!dir.path().join("product_design").join("records.csv").exists());
}
