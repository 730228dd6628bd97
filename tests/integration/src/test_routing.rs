//! Path routing integration tests.

#[cfg(test)]
mod tests {
    use crawlspace_storage::MemoryBackend;

    use crate::{TestServer, client, scenario_registry};

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_object("someotherbucket", "someprefix/some/image.jpg", "prefixed image")
            .with_object("somebucket", "some/image.jpg", "unprefixed image")
            .with_object("somebucket", "Norder3/Allsky.fits", "SIMPLE  =  T")
            .with_object("somebucket", "properties", "hips_order = 3")
    }

    #[tokio::test]
    async fn test_should_serve_versioned_path_under_prefix() {
        let server = TestServer::start(scenario_registry(Some("ds2")), backend()).await;

        let resp = client()
            .get(server.url("/api/hips/v2/ds2/some/image.jpg"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "image/jpeg");
        assert_eq!(resp.text().await.expect("body"), "prefixed image");

        let resp = client()
            .get(server.url("/api/hips/v2/ds1/some/image.jpg"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "unprefixed image");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_serve_legacy_path_from_default_dataset() {
        let server = TestServer::start(scenario_registry(Some("ds2")), backend()).await;
        let http = client();

        let legacy = http
            .get(server.url("/api/hips/some/image.jpg"))
            .send()
            .await
            .expect("request");
        let explicit = http
            .get(server.url("/api/hips/v2/ds2/some/image.jpg"))
            .send()
            .await
            .expect("request");
        assert_eq!(legacy.status(), 200);
        assert_eq!(legacy.headers()["etag"], explicit.headers()["etag"]);
        assert_eq!(
            legacy.bytes().await.expect("body"),
            explicit.bytes().await.expect("body")
        );

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_collapse_duplicate_slashes_and_decode_paths() {
        let server = TestServer::start(scenario_registry(Some("ds1")), backend()).await;

        for path in [
            "/api/hips//some///image.jpg",
            "/api/hips/v2/ds1//some/image.jpg",
            "/api/hips/v2/ds1/some/%69mage.jpg",
        ] {
            let resp = client().get(server.url(path)).send().await.expect("request");
            assert_eq!(resp.status(), 200, "{path}");
            assert_eq!(resp.text().await.expect("body"), "unprefixed image");
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_set_media_types_and_cache_headers() {
        let server = TestServer::start(scenario_registry(Some("ds1")), backend()).await;

        let resp = client()
            .get(server.url("/api/hips/Norder3/Allsky.fits"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "application/fits");
        assert_eq!(resp.headers()["cache-control"], "private, max-age=3600");
        assert!(resp.headers()["etag"].to_str().expect("ascii").starts_with('"'));
        assert!(resp.headers().contains_key("x-request-id"));

        let resp = client()
            .get(server.url("/api/hips/properties"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(resp.headers()["content-length"], "14");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_answer_head_without_body() {
        let server = TestServer::start(scenario_registry(Some("ds1")), backend()).await;

        let resp = client()
            .head(server.url("/api/hips/properties"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
        assert!(resp.headers().contains_key("etag"));
        assert!(resp.bytes().await.expect("body").is_empty());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_report_metadata_and_health() {
        let server = TestServer::start(scenario_registry(None), MemoryBackend::new()).await;

        let json: serde_json::Value = client()
            .get(server.url("/"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(json["name"], "crawlspace-test");
        for field in ["version", "description", "repository_url", "documentation_url"] {
            assert!(json[field].is_string(), "{field}");
        }

        let json: serde_json::Value = client()
            .get(server.url("/health"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(json["status"], "running");

        server.stop().await;
    }
}
