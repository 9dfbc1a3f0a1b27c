//! Integration tests for the DTS client against an in-process fake service
//!
//! These tests drive a real `DtsClient` over HTTP through connect, search,
//! metadata lookup, and the submit / poll / cancel transfer lifecycle.

mod support;

use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use dts_client::app::{
    ApiKey, DtsClient, MetadataRequest, Query, Recover, SearchRequest, TransferHandle,
    TransferRequest, TransferStatus,
};
use dts_client::cli::{watch_transfer, ProgressConfig};
use dts_client::errors::{AppError, ServiceError, UsageError, ValueError};

use support::{expected_bearer, FakeDts, StubServer, API_KEY, ORCID};

async fn connected(server: &StubServer) -> DtsClient {
    let mut client = DtsClient::new();
    let key = ApiKey::new(API_KEY).unwrap();
    client.connect(&key, &server.url(), None).await.unwrap();
    client
}

fn jdp_ids() -> Vec<String> {
    vec![
        "JDP:57f9e03f7ded5e3135bc069e".to_string(),
        "JDP:57f9bd4b7ded5e3135bc0619".to_string(),
        "JDP:57f9e1047ded5e3135bc06a0".to_string(),
    ]
}

#[tokio::test]
async fn test_connect_and_disconnect() {
    let (server, _) = FakeDts::start().await;
    let mut client = DtsClient::new();
    let key = ApiKey::new(API_KEY).unwrap();

    let context = client.connect(&key, &format!("{}/", server.url()), None).await.unwrap();
    assert_eq!(context.service_uri().as_str(), format!("{}/api/v1", server.url()));
    assert_eq!(context.service_name(), support::SERVICE_NAME);
    assert_eq!(context.protocol_version(), support::SERVICE_VERSION);

    assert!(client.is_connected());
    assert!(client.to_string().starts_with("dts.Client(uri = "));

    let handshake = server.requests_to("/");
    assert_eq!(handshake.len(), 1);
    assert_eq!(handshake[0].method, "GET");

    client.disconnect();
    assert!(!client.is_connected());
    assert!(client.context().is_none());
    assert_eq!(client.to_string(), "dts.Client(disconnected)");

    let err = client.list_databases().await.unwrap_err();
    assert!(matches!(err, AppError::Usage(UsageError::NotConnected)));
}

#[tokio::test]
async fn test_connect_with_explicit_port() {
    let (server, _) = FakeDts::start().await;
    let key = ApiKey::new(API_KEY).unwrap();

    let client = DtsClient::connect_with(
        Default::default(),
        &key,
        "http://127.0.0.1",
        Some(server.port()),
    )
    .await
    .unwrap();

    let uri = client.context().unwrap().service_uri();
    assert_eq!(uri.port(), Some(server.port()));
}

#[tokio::test]
async fn test_reconnect_replaces_context() {
    let (first, _) = FakeDts::start().await;
    let (second, _) = FakeDts::start().await;

    let mut client = connected(&first).await;
    let key = ApiKey::new(API_KEY).unwrap();
    client.connect(&key, &second.url(), None).await.unwrap();

    assert_eq!(
        client.context().unwrap().service_uri().as_str(),
        format!("{}/api/v1", second.url())
    );
}

#[tokio::test]
async fn test_failed_handshake_leaves_client_disconnected() {
    let server = StubServer::fixed(503, json!({"error": "maintenance"})).await;
    let mut client = DtsClient::new();
    let key = ApiKey::new(API_KEY).unwrap();

    let err = client.connect(&key, &server.url(), None).await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_handshake_with_numeric_version() {
    let server = StubServer::fixed(200, json!({"name": "DTS", "version": 1})).await;
    let client = connected(&server).await;
    assert_eq!(client.context().unwrap().protocol_version(), "1");
}

#[tokio::test]
async fn test_every_request_carries_bearer_token() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    assert_ok!(client.list_databases().await);
    assert_ok!(client.search(&SearchRequest::new("jdp", ORCID, "coli")).await);

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert_eq!(
            request.header("authorization"),
            Some(expected_bearer().as_str())
        );
    }
}

#[tokio::test]
async fn test_list_databases() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let databases = client.list_databases().await.unwrap();
    let ids: Vec<&str> = databases.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["jdp", "kbase"]);
    assert_eq!(databases[0].organization, "Joint Genome Institute");
}

#[tokio::test]
async fn test_rejected_key_is_a_service_error() {
    let (server, _) = FakeDts::start().await;
    let mut client = connected(&server).await;

    let wrong = ApiKey::new("not-the-right-token").unwrap();
    let err = client.connect(&wrong, &server.url(), None).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Service(ServiceError::Http { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_search_returns_resources() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let request = SearchRequest::new("jdp", ORCID, 2708742931_u64)
        .specific(json!({"f": "img_taxon_oid", "extra": "project_id"}));
    let files = client.search(&request).await.unwrap();

    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.database_prefix() == Some("JDP")));
    assert_eq!(files[0].field("format"), Some(&json!("fasta")));
    assert!(files[0].extra().is_some());

    let body = server.requests_to("/api/v1/files")[0].json();
    assert_eq!(body["database"], "jdp");
    assert_eq!(body["orcid"], ORCID);
    assert_eq!(body["query"], "2708742931");
    assert_eq!(body["specific"]["f"], "img_taxon_oid");
}

#[tokio::test]
async fn test_numeric_and_text_queries_are_identical_on_the_wire() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let numeric = SearchRequest::new("jdp", ORCID, 2708742931_u64);
    let text = SearchRequest::new("jdp", ORCID, "2708742931");
    client.search(&numeric).await.unwrap();
    client.search(&text).await.unwrap();

    let bodies: Vec<_> = server
        .requests_to("/api/v1/files")
        .iter()
        .map(|r| r.body.clone())
        .collect();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn test_search_pagination_parameters() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let explicit = SearchRequest::new("jdp", ORCID, "coli").offset(0).limit(2);
    let files = client.search(&explicit).await.unwrap();
    assert_eq!(files.len(), 2);

    client.search(&SearchRequest::new("jdp", ORCID, "coli")).await.unwrap();

    let bodies: Vec<_> = server
        .requests_to("/api/v1/files")
        .iter()
        .map(|r| r.json())
        .collect();
    assert_eq!(bodies[0]["offset"], 0);
    assert_eq!(bodies[0]["limit"], 2);
    assert!(bodies[1].get("offset").is_none());
    assert!(bodies[1].get("limit").is_none());
}

#[tokio::test]
async fn test_invalid_search_arguments_never_reach_the_server() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let negative = SearchRequest::new("jdp", ORCID, "coli").offset(-1);
    let err = client.search(&negative).await.unwrap_err();
    assert!(matches!(err, AppError::Value(ValueError::NegativeOffset { .. })));

    let zero_limit = SearchRequest::new("jdp", ORCID, "coli").limit(0);
    let err = client.search(&zero_limit).await.unwrap_err();
    assert!(matches!(err, AppError::Value(ValueError::LimitTooSmall { .. })));

    let bad_status = SearchRequest::new("jdp", ORCID, "coli").status("archived");
    let err = client.search(&bad_status).await.unwrap_err();
    assert!(matches!(err, AppError::Usage(UsageError::InvalidStatus { .. })));

    let bad_specific = SearchRequest::new("jdp", ORCID, "coli").specific(json!(["f"]));
    let err = client.search(&bad_specific).await.unwrap_err();
    assert!(matches!(err, AppError::Usage(UsageError::NotAnObject { .. })));

    assert_err!(Query::from_value(json!(true)));
    assert!(server.requests_to("/api/v1/files").is_empty());
}

#[tokio::test]
async fn test_status_filter_is_sent() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let request = SearchRequest::new("jdp", ORCID, "coli").status("staged");
    client.search(&request).await.unwrap();

    assert_eq!(server.requests_to("/api/v1/files")[0].json()["status"], "staged");
}

#[tokio::test]
async fn test_service_failures_can_be_softened() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let request = SearchRequest::new("broken", ORCID, "coli");
    let err = client.search(&request).await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(err.status_code(), Some(500));

    let files = client.search(&request).await.or_empty("search").unwrap();
    assert!(files.is_empty());

    let missing: TransferHandle = "3f0c8a6e-2b7d-4c2e-9a55-5b1d0e6f7a11".parse().unwrap();
    let status = client.poll_status(missing).await.or_absent("poll_status").unwrap();
    assert!(status.is_none());

    // caller misuse still propagates through the lenient adapters
    let invalid = SearchRequest::new("jdp", ORCID, "coli").offset(-5);
    assert!(client.search(&invalid).await.or_empty("search").is_err());
}

#[tokio::test]
async fn test_fetch_metadata_returns_one_resource_per_id() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let request = MetadataRequest::new("jdp", ORCID, jdp_ids());
    let files = client.fetch_metadata(&request).await.unwrap();
    assert_eq!(files.len(), 3);

    let returned: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
    for id in jdp_ids() {
        assert!(returned.contains(&id.as_str()));
    }

    let recorded = &server.requests_to("/api/v1/files/by-id")[0];
    assert_eq!(recorded.method, "GET");
    assert_eq!(recorded.query_param("ids"), Some(jdp_ids().join(",")));
    assert_eq!(recorded.query_param("orcid").as_deref(), Some(ORCID));
    assert!(recorded.query_param("offset").is_none());
}

#[tokio::test]
async fn test_fetch_metadata_validation() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let none: Vec<String> = Vec::new();
    let err = client
        .fetch_metadata(&MetadataRequest::new("jdp", ORCID, none))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Usage(UsageError::EmptyFileIds { .. })));

    let err = client
        .fetch_metadata(&MetadataRequest::new("jdp", ORCID, jdp_ids()).limit(0))
        .await
        .unwrap_err();
    assert!(err.is_caller_misuse());

    assert!(server.requests_to("/api/v1/files/by-id").is_empty());
}

#[tokio::test]
async fn test_submit_transfer_returns_fresh_handles() {
    let (server, state) = FakeDts::start().await;
    let client = connected(&server).await;

    let request = TransferRequest::new(ORCID, jdp_ids(), "jdp", "kbase")
        .description("genomes for the workshop")
        .instructions(json!({"protocol": "KBase narrative"}));

    let first = client.submit_transfer(&request).await.unwrap();
    let second = client.submit_transfer(&request).await.unwrap();
    assert_ne!(first, second);
    assert_eq!(state.transfer_count(), 2);

    let body = server.requests_to("/api/v1/transfers")[0].json();
    assert_eq!(body["orcid"], ORCID);
    assert_eq!(body["source"], "jdp");
    assert_eq!(body["destination"], "kbase");
    assert_eq!(body["file_ids"].as_array().unwrap().len(), 3);
    assert_eq!(body["description"], "genomes for the workshop");
    assert_eq!(body["instructions"]["protocol"], "KBase narrative");
}

#[tokio::test]
async fn test_submit_transfer_omits_empty_description() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let request = TransferRequest::new(ORCID, jdp_ids(), "jdp", "kbase").description("");
    client.submit_transfer(&request).await.unwrap();

    let body = server.requests_to("/api/v1/transfers")[0].json();
    assert!(body.get("description").is_none());
}

#[tokio::test]
async fn test_submit_timeout_bounds_the_request() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let slow = TransferRequest::new(ORCID, jdp_ids(), "jdp", "kbase")
        .description("slow")
        .timeout(Duration::from_millis(200));
    let err = client.submit_transfer(&slow).await.unwrap_err();
    assert!(matches!(err, AppError::Service(ServiceError::Transport(_))));

    let zero = TransferRequest::new(ORCID, jdp_ids(), "jdp", "kbase").timeout(Duration::ZERO);
    let err = client.submit_transfer(&zero).await.unwrap_err();
    assert!(matches!(err, AppError::Value(ValueError::ZeroTimeout { .. })));
}

#[tokio::test]
async fn test_poll_status_reports_progress() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let handle = client
        .submit_transfer(&TransferRequest::new(ORCID, jdp_ids(), "jdp", "kbase"))
        .await
        .unwrap();

    for _ in 0..3 {
        let record = client.poll_status(handle).await.unwrap();
        assert!(record.status.is_known());
        assert_eq!(record.num_files, 3);
        assert!(record.num_files_transferred <= record.num_files);
        assert_eq!(record.id, handle.to_string());
    }

    let path = format!("/api/v1/transfers/{}", handle);
    assert_eq!(server.requests_to(&path).len(), 3);
}

#[tokio::test]
async fn test_cancelled_transfer_remains_pollable() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let handle = client
        .submit_transfer(&TransferRequest::new(ORCID, jdp_ids(), "jdp", "kbase"))
        .await
        .unwrap();

    assert_ok!(client.cancel_transfer(handle).await);
    let record = client.poll_status(handle).await.unwrap();
    assert_eq!(record.status, TransferStatus::Inactive);
    assert!(record.should_stop_polling());

    let path = format!("/api/v1/transfers/{}", handle);
    let methods: Vec<String> = server
        .requests_to(&path)
        .into_iter()
        .map(|r| r.method)
        .collect();
    assert_eq!(methods, ["DELETE", "GET"]);
}

#[tokio::test]
async fn test_cancel_unknown_transfer_fails() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let unknown = TransferHandle::new(uuid::Uuid::new_v4());
    let err = client.cancel_transfer(unknown).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_watch_transfer_until_complete() {
    let (server, _) = FakeDts::start().await;
    let client = connected(&server).await;

    let two_files = vec!["JDP:a".to_string(), "JDP:b".to_string()];
    let handle = client
        .submit_transfer(&TransferRequest::new(ORCID, two_files, "jdp", "kbase"))
        .await
        .unwrap();

    let config = ProgressConfig {
        enable_progress_bar: false,
        poll_interval: Duration::from_millis(1),
    };
    let last = watch_transfer(&client, handle, config).await.unwrap();

    assert_eq!(last.status, TransferStatus::Finalizing);
    assert!(last.is_complete());

    let path = format!("/api/v1/transfers/{}", handle);
    assert_eq!(server.requests_to(&path).len(), 4);
}
