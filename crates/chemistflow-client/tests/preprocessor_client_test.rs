//! Preprocessor client tests against a mock upstream.

mod support;

use std::sync::Arc;

use chemistflow_client::{build_http_client, PreprocessorClient};
use chemistflow_common::config::ClientConfig;
use chemistflow_common::domain::Reaction;
use chemistflow_common::error::ResourceError;
use hyper::StatusCode;
use serde_json::json;
use support::MockUpstream;

fn details_body(id: i64) -> String {
    json!({
        "reaction": {"reactionId": id, "reactionName": "R"},
        "inboundReagents": [],
        "outboundProducts": [],
        "conditions": []
    })
    .to_string()
}

fn client_for(upstream: &MockUpstream, retries: u32) -> PreprocessorClient {
    let config = ClientConfig {
        retries,
        ..ClientConfig::for_base_uri(format!("{}/api", upstream.base_uri))
    };
    let http = build_http_client(&config).unwrap();
    PreprocessorClient::new(http, &config)
}

#[tokio::test]
async fn fetch_reaction_decodes_details() {
    let upstream = MockUpstream::start(Arc::new(|method, path, _| {
        assert_eq!(method, "GET");
        assert_eq!(path, "/api/reaction/42");
        (StatusCode::OK, details_body(42))
    }))
    .await;

    let client = client_for(&upstream, 0);
    let details = client.fetch_reaction(42).await.unwrap();
    assert_eq!(details.reaction.reaction_id, 42);
    assert_eq!(upstream.hit_count(), 1);
}

#[tokio::test]
async fn fetch_404_maps_to_not_found() {
    let upstream = MockUpstream::start(Arc::new(|_, _, _| {
        (StatusCode::NOT_FOUND, String::new())
    }))
    .await;

    let client = client_for(&upstream, 3);
    let result = client.fetch_reaction(9).await;
    assert_eq!(result, Err(ResourceError::NotFound(9)));
    // NotFound is a permanent answer: no retries
    assert_eq!(upstream.hit_count(), 1);
}

#[tokio::test]
async fn fetch_undecodable_body_maps_to_decoding_error() {
    let upstream = MockUpstream::start(Arc::new(|_, _, _| {
        (StatusCode::OK, "{\"not\": \"a reaction\"}".to_string())
    }))
    .await;

    let client = client_for(&upstream, 0);
    let result = client.fetch_reaction(1).await;
    assert!(matches!(result, Err(ResourceError::Decoding(_))));
}

#[tokio::test]
async fn fetch_other_status_maps_to_http_error() {
    let upstream = MockUpstream::start(Arc::new(|_, _, _| {
        (StatusCode::CONFLICT, "busy".to_string())
    }))
    .await;

    let client = client_for(&upstream, 0);
    let result = client.fetch_reaction(1).await;
    assert_eq!(
        result,
        Err(ResourceError::Http {
            status: 409,
            reason: "busy".to_string()
        })
    );
}

#[tokio::test]
async fn fetch_retries_on_5xx_until_success() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    let attempts = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&attempts);

    let upstream = MockUpstream::start(Arc::new(move |_, _, _| {
        if counted.fetch_add(1, Ordering::SeqCst) < 2 {
            (StatusCode::SERVICE_UNAVAILABLE, String::new())
        } else {
            (StatusCode::OK, details_body(5))
        }
    }))
    .await;

    let client = client_for(&upstream, 3);
    let details = client.fetch_reaction(5).await.unwrap();
    assert_eq!(details.reaction.reaction_id, 5);
    assert_eq!(upstream.hit_count(), 3);
}

#[tokio::test]
async fn create_reaction_round_trips_created_object() {
    let upstream = MockUpstream::start(Arc::new(|method, path, body| {
        assert_eq!(method, "POST");
        assert_eq!(path, "/api/reaction");
        let sent: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent["reactionName"], "X");
        (
            StatusCode::CREATED,
            json!({"reactionId": 7, "reactionName": "X"}).to_string(),
        )
    }))
    .await;

    let client = client_for(&upstream, 0);
    let created = client.create_reaction(&Reaction::new(0, "X")).await.unwrap();
    assert_eq!(created.reaction_id, 7);
}

#[tokio::test]
async fn create_failure_maps_to_creation_error() {
    let upstream = MockUpstream::start(Arc::new(|_, _, _| {
        (StatusCode::UNPROCESSABLE_ENTITY, "bad name".to_string())
    }))
    .await;

    let client = client_for(&upstream, 0);
    let result = client.create_reaction(&Reaction::new(0, "")).await;
    assert_eq!(
        result,
        Err(ResourceError::Creation {
            status: 422,
            reason: "bad name".to_string()
        })
    );
}

#[tokio::test]
async fn create_is_never_retried() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    let attempts = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&attempts);

    let upstream = MockUpstream::start(Arc::new(move |_, _, _| {
        counted.fetch_add(1, Ordering::SeqCst);
        (StatusCode::INTERNAL_SERVER_ERROR, String::new())
    }))
    .await;

    let client = client_for(&upstream, 3);
    let result = client.create_reaction(&Reaction::new(0, "X")).await;
    assert!(result.is_err());
    assert_eq!(upstream.hit_count(), 1);
}

#[tokio::test]
async fn delete_204_succeeds() {
    let upstream = MockUpstream::start(Arc::new(|method, path, _| {
        assert_eq!(method, "DELETE");
        assert_eq!(path, "/api/reaction/7");
        (StatusCode::NO_CONTENT, String::new())
    }))
    .await;

    let client = client_for(&upstream, 0);
    assert!(client.delete_reaction(7).await.is_ok());
}

#[tokio::test]
async fn delete_other_status_maps_to_deletion_error() {
    let upstream = MockUpstream::start(Arc::new(|_, _, _| {
        (StatusCode::OK, String::new())
    }))
    .await;

    let client = client_for(&upstream, 0);
    let result = client.delete_reaction(7).await;
    assert!(matches!(
        result,
        Err(ResourceError::Deletion { status: 200, .. })
    ));
}

#[tokio::test]
async fn fetch_mechanism_decodes_details() {
    let upstream = MockUpstream::start(Arc::new(|_, path, _| {
        assert_eq!(path, "/api/mechanism/3");
        (
            StatusCode::OK,
            json!({
                "mechanismContext": [
                    {
                        "mechanismId": 3,
                        "mechanismName": "SN2",
                        "mechanismType": "substitution",
                        "activationEnergy": 83.2
                    },
                    {"description": "backside attack"}
                ],
                "stageInteractants": [
                    [
                        {"stageId": 1, "stageName": "approach", "stageDescription": "d"},
                        [{"tag": "IReagentIn", "contents": {"amount": 1.0}}]
                    ]
                ]
            })
            .to_string(),
        )
    }))
    .await;

    let client = client_for(&upstream, 0);
    let details = client.fetch_mechanism(3).await.unwrap();
    assert_eq!(details.mechanism_context.0.mechanism_id, 3);
    assert_eq!(details.stage_interactants.len(), 1);
}

#[tokio::test]
async fn fetch_mechanism_unknown_interactant_tag_is_decoding_error() {
    let upstream = MockUpstream::start(Arc::new(|_, _, _| {
        (
            StatusCode::OK,
            json!({
                "mechanismContext": [
                    {
                        "mechanismId": 3,
                        "mechanismName": "SN2",
                        "mechanismType": "substitution",
                        "activationEnergy": 83.2
                    },
                    {"description": "d"}
                ],
                "stageInteractants": [
                    [
                        {"stageId": 1, "stageName": "s", "stageDescription": "d"},
                        [{"tag": "IMystery", "contents": {}}]
                    ]
                ]
            })
            .to_string(),
        )
    }))
    .await;

    let client = client_for(&upstream, 0);
    let result = client.fetch_mechanism(3).await;
    assert!(matches!(result, Err(ResourceError::Decoding(_))));
}
