//! HTTP backend tests against a local mock server.
//!
//! These tests verify the `{"sql": ...}` wire format, credential headers,
//! and that every failure mode resolves into a `QueryError` value.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

#[cfg(feature = "http")]
mod http_integration {
    use madatdata_core::{
        Backend, ClientOptions, QueryErrorKind, create_client, security::CredentialOptions,
    };
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn zero_row_select() -> serde_json::Value {
        json!({
            "success": true,
            "command": "SELECT",
            "fields": [],
            "rowCount": 0,
            "rows": [],
            "executionTime": "11ms",
            "executionTimeHighRes": "0s 11.2ms"
        })
    }

    fn options_for(server: &MockServer, route: &str) -> ClientOptions {
        // Empty proxy keeps a developer's MITM variable out of the tests
        ClientOptions::new()
            .with_endpoint(format!("{}{}", server.uri(), route))
            .with_proxy("")
    }

    #[tokio::test]
    async fn test_http_splitgraph_zero_row_select() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sql/query/ddn"))
            .and(body_json(json!({"sql": "SELECT 1 WHERE false"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(zero_row_select()))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            create_client(Backend::Splitgraph, options_for(&server, "/sql/query/ddn")).unwrap();
        let result = client.execute("SELECT 1 WHERE false").await.unwrap();

        assert!(result.success);
        assert_eq!(result.command, "SELECT");
        assert_eq!(result.row_count, 0);
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn test_http_splitgraph_sends_api_key_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "my-key"))
            .and(header("x-api-secret", "my-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zero_row_select()))
            .expect(1)
            .mount(&server)
            .await;

        let options = options_for(&server, "/sql/query/ddn").with_credential(
            CredentialOptions::api_key("my-key".to_string(), "my-secret".to_string()),
        );
        let client = create_client(Backend::Splitgraph, options).unwrap();

        assert!(client.execute("SELECT 1").await.is_ok());
    }

    #[tokio::test]
    async fn test_http_seafowl_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/q"))
            .and(header("authorization", "Bearer write-password"))
            .and(body_json(json!({"sql": "CREATE TABLE t (x INT)"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "command": "CREATE",
                "rowCount": 0,
                "rows": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = options_for(&server, "/q")
            .with_credential(CredentialOptions::token("write-password".to_string()));
        let client = create_client(Backend::Seafowl, options).unwrap();
        let result = client.execute("CREATE TABLE t (x INT)").await.unwrap();

        assert_eq!(result.command, "CREATE");
        assert_eq!(result.execution_time, "");
    }

    #[tokio::test]
    async fn test_http_body_without_success_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "command": "SELECT",
                "fields": [],
                "rowCount": 0,
                "rows": []
            })))
            .mount(&server)
            .await;

        let client = create_client(Backend::Seafowl, options_for(&server, "/q")).unwrap();
        let result = client.execute("SELECT 1 WHERE false").await.unwrap();

        assert!(result.success);
        assert_eq!(result.row_count, 0);
    }

    #[tokio::test]
    async fn test_http_null_error_member_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": null,
                "message": "internal failure"
            })))
            .mount(&server)
            .await;

        let client = create_client(Backend::Splitgraph, options_for(&server, "/")).unwrap();
        let error = client.execute("SELECT 1").await.unwrap_err();

        assert_eq!(error.kind, QueryErrorKind::Backend);
        assert_eq!(error.message(), "internal failure");
        assert!(error.trace.unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_http_rows_are_returned_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "command": "SELECT",
                "fields": [{"name": "name"}, {"name": "count"}],
                "rowCount": 2,
                "rows": [{"name": "a", "count": 3}, {"name": "b", "count": 5}],
                "executionTime": "5ms",
                "executionTimeHighRes": "0s 5.0ms"
            })))
            .mount(&server)
            .await;

        let client = create_client(Backend::Splitgraph, options_for(&server, "/")).unwrap();
        let result = client.execute("SELECT name, count FROM t").await.unwrap();

        assert_eq!(result.column_names(), vec!["name", "count"]);
        assert_eq!(result.rows[1]["name"], "b");
        assert_eq!(result.rows[1]["count"], 5);
    }

    #[tokio::test]
    async fn test_http_backend_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "error": "syntax error at or near \"SELEC\""
            })))
            .mount(&server)
            .await;

        let client = create_client(Backend::Splitgraph, options_for(&server, "/")).unwrap();
        let error = client.execute("SELEC 1").await.unwrap_err();

        assert!(!error.success);
        assert_eq!(error.kind, QueryErrorKind::Backend);
        assert_eq!(error.message(), "syntax error at or near \"SELEC\"");
        assert_eq!(error.trace.as_deref(), Some("HTTP 400 Bad Request"));
    }

    #[tokio::test]
    async fn test_http_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = create_client(Backend::Seafowl, options_for(&server, "/q")).unwrap();
        let error = client.execute("SELECT 1").await.unwrap_err();

        assert_eq!(error.kind, QueryErrorKind::Backend);
        assert_eq!(error.message(), "maintenance");
        assert!(error.trace.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_http_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = create_client(Backend::Splitgraph, options_for(&server, "/")).unwrap();
        let error = client.execute("SELECT 1").await.unwrap_err();

        assert_eq!(error.kind, QueryErrorKind::Decode);
        assert!(error.trace.is_some());
    }

    #[tokio::test]
    async fn test_http_dns_failure_is_transport_error() {
        let options = ClientOptions::new()
            .with_endpoint("http://madatdata-does-not-exist.invalid/sql/query/ddn")
            .with_proxy("")
            .with_timeout(Duration::from_secs(5));
        let client = create_client(Backend::Splitgraph, options).unwrap();

        let outcome = client.execute("SELECT 1").await;
        let error = outcome.unwrap_err();

        assert!(!error.success);
        assert_eq!(error.kind, QueryErrorKind::Transport);
        assert!(error.trace.is_some());
    }

    #[tokio::test]
    async fn test_http_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(zero_row_select())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let options = options_for(&server, "/").with_timeout(Duration::from_millis(100));
        let client = create_client(Backend::Splitgraph, options).unwrap();
        let error = client.execute("SELECT pg_sleep(2)").await.unwrap_err();

        assert_eq!(error.kind, QueryErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_http_outcome_is_exactly_one_side() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zero_row_select()))
            .mount(&server)
            .await;

        let client = create_client(Backend::Splitgraph, options_for(&server, "/")).unwrap();
        let envelope = madatdata_core::OutcomeEnvelope::from(client.execute("SELECT 1").await);

        assert!(envelope.response().is_some());
        assert!(envelope.error().is_none());
    }

    #[test]
    fn test_proxy_from_environment_is_validated() {
        temp_env::with_var("MITM", Some("not a proxy address"), || {
            let result = create_client(Backend::Splitgraph, ClientOptions::new());
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_proxy_from_environment_is_used() {
        temp_env::with_var("MITM", Some("http://127.0.0.1:8080"), || {
            let result = create_client(Backend::Seafowl, ClientOptions::new());
            assert!(result.is_ok());
        });
    }

    #[test]
    fn test_credential_rejected_by_seafowl() {
        let options = ClientOptions::new()
            .with_proxy("")
            .with_credential(CredentialOptions::api_key("k".to_string(), "s".to_string()));
        assert!(create_client(Backend::Seafowl, options).is_err());
    }
}
