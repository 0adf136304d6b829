// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::IntoResponse;
use quotagate::error::GatewayError;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        GatewayError::QuotaExceeded {
            identifier: "u1".to_string(),
        },
        GatewayError::upstream("openai returned HTTP 500: boom", Some(500)),
        GatewayError::LockTimeout("u1".to_string()),
        GatewayError::Config("missing api key".to_string()),
        GatewayError::InvalidRequest("Bad request".to_string()),
        GatewayError::Internal("oops".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_quota_exceeded_is_429() {
    let error = GatewayError::QuotaExceeded {
        identifier: "10.0.0.1".to_string(),
    };
    assert!(format!("{}", error).contains("10.0.0.1"));
    assert_eq!(error.classify(), (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error"));
}

#[test]
fn test_upstream_is_502() {
    let error = GatewayError::upstream("Connection refused", None);
    assert!(format!("{}", error).contains("Connection refused"));
    assert_eq!(error.classify(), (StatusCode::BAD_GATEWAY, "api_error"));
}

#[test]
fn test_invalid_request_is_400() {
    let error = GatewayError::InvalidRequest("messages must not be empty".to_string());
    assert_eq!(error.classify().0, StatusCode::BAD_REQUEST);
}

#[test]
fn test_lock_timeout_is_503() {
    let error = GatewayError::LockTimeout("u1".to_string());
    assert_eq!(error.classify(), (StatusCode::SERVICE_UNAVAILABLE, "overloaded_error"));
}

#[test]
fn test_into_upstream_keeps_existing_status() {
    let error = GatewayError::upstream("rate limited", Some(429)).into_upstream();
    match error {
        GatewayError::Upstream { status, source, .. } => {
            assert_eq!(status, Some(429));
            assert!(source.is_none());
        }
        other => panic!("expected upstream, got {:?}", other),
    }
}

#[test]
fn test_into_upstream_wraps_cause() {
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
    let error = GatewayError::from(io).into_upstream();

    assert!(matches!(error, GatewayError::Upstream { status: None, .. }));
    let source = std::error::Error::source(&error).expect("cause is kept");
    assert!(source.to_string().contains("reset by peer"));
}

#[tokio::test]
async fn test_error_response_body() {
    let response = GatewayError::QuotaExceeded {
        identifier: "u1".to_string(),
    }
    .into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "rate_limit_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("u1"));
}
