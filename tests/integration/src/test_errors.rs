//! Error status integration tests.

#[cfg(test)]
mod tests {
    use crawlspace_storage::{FetchError, MemoryBackend};

    use crate::{TestServer, client, scenario_registry};

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_object("somebucket", "some/image.jpg", "image")
            .with_failure("somebucket", "private.png", FetchError::AccessDenied)
            .with_failure(
                "somebucket",
                "flaky.png",
                FetchError::backend("operation timed out after 30s on 10.1.2.3"),
            )
    }

    async fn error_of(server: &TestServer, method: reqwest::Method, path: &str) -> (u16, serde_json::Value) {
        let resp = client()
            .request(method, server.url(path))
            .send()
            .await
            .expect("request");
        let status = resp.status().as_u16();
        assert_eq!(resp.headers()["content-type"], "application/json");
        (status, resp.json().await.expect("json error body"))
    }

    #[tokio::test]
    async fn test_should_list_datasets_for_unknown_key() {
        let server = TestServer::start(scenario_registry(Some("ds2")), backend()).await;

        let (status, body) = error_of(&server, reqwest::Method::GET, "/api/hips/v2/nope/a.png").await;
        assert_eq!(status, 404);
        assert_eq!(body["code"], "unknown_dataset");
        let detail = body["detail"].as_str().expect("detail");
        assert!(detail.contains("ds1"));
        assert!(detail.contains("ds2"));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_fail_legacy_path_without_default_dataset() {
        let server = TestServer::start(scenario_registry(None), backend()).await;

        let (status, body) = error_of(&server, reqwest::Method::GET, "/api/hips/some/image.jpg").await;
        assert_eq!(status, 500);
        assert_eq!(body["code"], "no_default_dataset");

        // The explicit shape still works.
        let resp = client()
            .get(server.url("/api/hips/v2/ds1/some/image.jpg"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_traversal_with_400() {
        let server = TestServer::start(scenario_registry(Some("ds1")), backend()).await;

        // Slashes are encoded so the client does not normalize the dot
        // segments away before sending.
        for path in [
            "/api/hips/v2/ds2/..%2Fsecret.png",
            "/api/hips/a%2F..%2F..%2Fetc/passwd",
            "/api/hips/v2/ds1/a/b%2F..%2F..%2F..%2Fc",
        ] {
            let (status, body) = error_of(&server, reqwest::Method::GET, path).await;
            assert_eq!(status, 400, "{path}");
            assert_eq!(body["code"], "path_traversal");
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_distinguish_missing_denied_and_failing_objects() {
        let server = TestServer::start(scenario_registry(Some("ds1")), backend()).await;

        let cases = [
            ("/api/hips/missing.png", 404, "not_found"),
            ("/api/hips/private.png", 403, "access_denied"),
            ("/api/hips/flaky.png", 502, "backend_error"),
        ];
        for (path, expected, code) in cases {
            let (status, body) = error_of(&server, reqwest::Method::GET, path).await;
            assert_eq!(status, expected, "{path}");
            assert_eq!(body["code"], code);
            assert!(!body.to_string().contains("10.1.2.3"));
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_return_404_for_unroutable_paths() {
        let server = TestServer::start(scenario_registry(Some("ds1")), backend()).await;

        for path in ["/favicon.ico", "/api/hips", "/api/hips/", "/api/hips/v2/ds1", "/api/hipsters/a.png"] {
            let (status, body) = error_of(&server, reqwest::Method::GET, path).await;
            assert_eq!(status, 404, "{path}");
            assert_eq!(body["code"], "bad_path");
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_writes_with_405() {
        let server = TestServer::start(scenario_registry(Some("ds1")), backend()).await;

        for method in [reqwest::Method::POST, reqwest::Method::PUT, reqwest::Method::DELETE] {
            let resp = client()
                .request(method.clone(), server.url("/api/hips/some/image.jpg"))
                .send()
                .await
                .expect("request");
            assert_eq!(resp.status(), 405, "{method}");
            assert_eq!(resp.headers()["allow"], "GET, HEAD");
        }

        server.stop().await;
    }
}
