//! End-to-end pipeline tests against a mock portal
//!
//! Drives the whole flow the `fetch` command uses: listing fetch, extraction,
//! caching, type filtering, batch windowing, and orchestrated download
//! through the real HTTP client.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_fetcher::app::client::ClientConfig;
use portal_fetcher::app::{
    fetch_listing, BatchWindow, DownloadOrchestrator, EmbeddedModelExtractor, ExecutionMode,
    ListingCache, OrchestratorConfig, PortalClient,
};

const LISTING_PAGE: &str = r#"<html><head><script>
var model ={"Total": 4, "Rows": [
    {"Guid": "guid-a", "Doc_Ref2": "24/0001 comment A", "Doc_Type": "Planning Comments"},
    {"Guid": "guid-b", "Doc_Ref2": "24/0001 comment B", "Doc_Type": "Planning Comments"},
    {"Guid": "guid-c", "Doc_Ref2": "24/0001 decision", "Doc_Type": "Decision Notice"},
    {"Guid": "guid-d", "Doc_Ref2": "24/0001 comment D", "Doc_Type": "Planning Comments"}
]};
</script></head><body></body></html>"#;

async fn mock_portal() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/SearchResult/RunThirdPartySearch"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .mount(&server)
        .await;

    for id in ["guid-a", "guid-b", "guid-d"] {
        Mock::given(method("GET"))
            .and(path("/Document/ViewDocument"))
            .and(query_param("id", id))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/pdf")
                    .set_body_bytes(format!("%PDF {}", id).into_bytes()),
            )
            .mount(&server)
            .await;
    }

    server
}

fn portal_client(server: &MockServer) -> Arc<PortalClient> {
    let config = ClientConfig {
        retry_base_delay: Duration::ZERO,
        ..Default::default()
    };
    Arc::new(
        PortalClient::new(
            &config,
            format!("{}/Document/ViewDocument?id=", server.uri()),
            "application/pdf",
        )
        .unwrap(),
    )
}

fn orchestrator_config(dir: &TempDir) -> OrchestratorConfig {
    OrchestratorConfig {
        destination: dir.path().to_path_buf(),
        request_delay: Duration::ZERO,
        worker_count: 4,
        ..Default::default()
    }
}

#[tokio::test]
async fn full_pipeline_downloads_filtered_documents() {
    let server = mock_portal().await;
    let client = portal_client(&server);
    let dir = TempDir::new().unwrap();

    // Listing and extraction.
    let listing_url = format!("{}/SearchResult/RunThirdPartySearch?FOLDER1_REF=1", server.uri());
    let documents = fetch_listing(&client, &listing_url, &EmbeddedModelExtractor::default())
        .await
        .unwrap();
    assert_eq!(documents.len(), 4);

    // Write-through cache.
    let cache = ListingCache::new(
        dir.path().join("document_cache.json"),
        Duration::from_secs(3600),
        true,
    );
    cache.save(&documents);
    assert_eq!(cache.load().as_deref(), Some(&documents[..]));

    // Type filter and batch window over the filtered sequence.
    let filtered: Vec<_> = documents
        .into_iter()
        .filter(|d| d.matches_type("Planning Comments"))
        .collect();
    assert_eq!(filtered.len(), 3);
    let range = BatchWindow::default().resolve(filtered.len(), 0).unwrap();
    let selection = &filtered[range];

    // Concurrent download.
    let orchestrator = DownloadOrchestrator::new(client, orchestrator_config(&dir));
    let report = orchestrator
        .run(selection, ExecutionMode::Concurrent, None)
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 3);
    assert!(report.failed_references().is_empty());

    let downloaded = std::fs::read(dir.path().join("24_0001 comment A.pdf")).unwrap();
    assert_eq!(downloaded, b"%PDF guid-a");
}

#[tokio::test]
async fn rerun_skips_existing_files_without_network_calls() {
    let server = mock_portal().await;
    let client = portal_client(&server);
    let dir = TempDir::new().unwrap();

    let documents = vec![
        portal_fetcher::app::DocumentDescriptor::new(
            "guid-a",
            "24/0001 comment A",
            "Planning Comments",
        ),
        portal_fetcher::app::DocumentDescriptor::new(
            "guid-b",
            "24/0001 comment B",
            "Planning Comments",
        ),
    ];

    let orchestrator = DownloadOrchestrator::new(client, orchestrator_config(&dir));
    let first = orchestrator
        .run(&documents, ExecutionMode::Sequential, None)
        .await
        .unwrap();
    assert_eq!(first.succeeded(), 2);
    assert_eq!(first.skipped_existing(), 0);

    let second = orchestrator
        .run(&documents, ExecutionMode::Sequential, None)
        .await
        .unwrap();
    assert_eq!(second.succeeded(), 2);
    assert_eq!(second.skipped_existing(), 2);

    // One request per document across both runs: the second run was served
    // entirely from disk.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn failing_document_does_not_abort_the_batch() {
    let server = mock_portal().await;
    let client = portal_client(&server);
    let dir = TempDir::new().unwrap();

    // guid-missing has no mock, so the server answers 404 and the client
    // retries until its attempts are spent.
    let documents = vec![
        portal_fetcher::app::DocumentDescriptor::new(
            "guid-a",
            "24/0001 comment A",
            "Planning Comments",
        ),
        portal_fetcher::app::DocumentDescriptor::new(
            "guid-missing",
            "24/0001 vanished",
            "Planning Comments",
        ),
        portal_fetcher::app::DocumentDescriptor::new(
            "guid-b",
            "24/0001 comment B",
            "Planning Comments",
        ),
    ];

    let orchestrator = DownloadOrchestrator::new(client, orchestrator_config(&dir));
    let report = orchestrator
        .run(&documents, ExecutionMode::Concurrent, None)
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed_references(), vec!["24/0001 vanished"]);

    assert!(dir.path().join("24_0001 comment A.pdf").exists());
    assert!(dir.path().join("24_0001 comment B.pdf").exists());
    assert!(!dir.path().join("24_0001 vanished.pdf").exists());
}

#[tokio::test]
async fn unreachable_listing_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/SearchResult/RunThirdPartySearch"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = portal_client(&server);
    let listing_url = format!("{}/SearchResult/RunThirdPartySearch", server.uri());
    let result = fetch_listing(&client, &listing_url, &EmbeddedModelExtractor::default()).await;
    assert!(result.is_err());
}
