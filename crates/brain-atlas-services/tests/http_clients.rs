// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! HTTP contract tests for the catalog and atlas clients against a mock server

use std::time::Duration;

use brain_atlas_config::{CatalogConfig, GeometryConfig, OntologyConfig, RetryConfig};
use brain_atlas_services::{
    collect_all_datasets, collect_assets, dataset_has_species, AllenAtlasClient, CatalogService,
    DandiCatalogClient, GeometrySource, OntologySource, RetryPolicy, ServiceError,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_step: Duration::from_millis(1),
    }
}

fn catalog(server: &MockServer) -> DandiCatalogClient {
    let config = CatalogConfig {
        api_url: format!("{}/api", server.uri()),
        ..CatalogConfig::default()
    };
    DandiCatalogClient::new(&config, &RetryConfig::default())
        .unwrap()
        .with_retry_policy(fast_retry())
}

fn atlas(server: &MockServer) -> AllenAtlasClient {
    let ontology = OntologyConfig {
        structure_graph_url: format!("{}/structure_graph.json", server.uri()),
        ..OntologyConfig::default()
    };
    let geometry = GeometryConfig {
        mesh_url_template: format!("{}/meshes/{{structure_id}}.obj", server.uri()),
        ..GeometryConfig::default()
    };
    AllenAtlasClient::new(&ontology, &geometry, &RetryConfig::default())
        .unwrap()
        .with_retry_policy(fast_retry())
}

#[tokio::test]
async fn dataset_listing_follows_next_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/"))
        .and(query_param("ordering", "-modified"))
        .and(query_param("page_size", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"identifier": "000409", "modified": "2025-05-01T10:00:00.000000Z"}
            ],
            "next": format!("{}/api/dandisets/page2", server.uri())
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"identifier": "000017", "modified": "2024-01-01T00:00:00Z"}
            ],
            "next": null
        })))
        .mount(&server)
        .await;

    let datasets = collect_all_datasets(&catalog(&server)).await.unwrap();
    let ids: Vec<_> = datasets.iter().map(|d| d.identifier.as_str()).collect();
    assert_eq!(ids, vec!["000409", "000017"]);
}

#[tokio::test]
async fn asset_listing_keeps_only_recording_files() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/000409/versions/draft/assets/"))
        .and(query_param("glob", "*.nwb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"asset_id": "a1", "path": "sub-1/sub-1_ecephys.nwb", "size": 10},
                {"asset_id": "a2", "path": "sub-1/sub-1_ecephys.nwb.json"}
            ],
            "next": null
        })))
        .mount(&server)
        .await;

    let assets = collect_assets(&catalog(&server), "000409").await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].asset_id, "a1");
}

#[tokio::test]
async fn rate_limited_request_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/000001/versions/draft/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/000001/versions/draft/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {"assetsSummary": {"species": [
                {"identifier": "http://purl.obolibrary.org/obo/NCBITaxon_10090", "name": "Mus musculus"}
            ]}}
        })))
        .mount(&server)
        .await;

    assert!(dataset_has_species(&catalog(&server), "000001", "10090").await.unwrap());
}

#[tokio::test]
async fn server_errors_exhaust_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/000002/versions/draft/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = catalog(&server).dataset_metadata("000002").await.unwrap_err();
    assert!(matches!(err, ServiceError::Http { status: 502, .. }));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/000003/versions/draft/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = catalog(&server).dataset_metadata("000003").await.unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn malformed_listing_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/dandisets/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = catalog(&server).dataset_page(None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn structure_graph_download() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/structure_graph.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "msg": [{"id": 997, "acronym": "root", "name": "root", "children": []}]
        })))
        .mount(&server)
        .await;

    let payload = atlas(&server).fetch_structure_graph().await.unwrap();
    assert_eq!(payload["msg"][0]["id"], 997);
}

#[tokio::test]
async fn structure_graph_failure_flag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/structure_graph.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "msg": "db down"})))
        .mount(&server)
        .await;

    let err = atlas(&server).fetch_structure_graph().await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn mesh_download_sends_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/meshes/385.obj"))
        .and(header("user-agent", "brain-atlas-viewer/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"v 0 0 0\n".to_vec()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/meshes/1.obj"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = atlas(&server);
    assert_eq!(client.fetch_geometry(385).await.unwrap(), b"v 0 0 0\n".to_vec());
    assert!(matches!(
        client.fetch_geometry(1).await,
        Err(ServiceError::NotFound { .. })
    ));
}
