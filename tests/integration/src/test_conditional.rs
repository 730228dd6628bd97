//! Conditional request integration tests (If-None-Match).

#[cfg(test)]
mod tests {
    use crawlspace_storage::MemoryBackend;

    use crate::{TestServer, client, scenario_registry};

    #[tokio::test]
    async fn test_should_answer_not_modified_for_matching_etag() {
        let backend = MemoryBackend::new().with_object("somebucket", "Norder3/Allsky.png", "pixels");
        let server = TestServer::start(scenario_registry(Some("ds1")), backend.clone()).await;
        let url = server.url("/api/hips/Norder3/Allsky.png");

        let first = client().get(&url).send().await.expect("request");
        assert_eq!(first.status(), 200);
        let etag = first.headers()["etag"].to_str().expect("ascii").to_owned();
        first.bytes().await.expect("body");

        for header in [etag.clone(), format!("W/{etag}"), format!("\"other\", {etag}")] {
            let resp = client()
                .get(&url)
                .header("If-None-Match", &header)
                .send()
                .await
                .expect("request");
            assert_eq!(resp.status(), 304, "{header}");
            assert_eq!(resp.headers()["etag"], etag.as_str());
            assert_eq!(resp.headers()["cache-control"], "private, max-age=3600");
            assert!(resp.bytes().await.expect("body").is_empty());
        }

        assert_eq!(backend.live_streams(), 0);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_send_body_for_stale_or_invalid_etag() {
        let backend = MemoryBackend::new().with_object("somebucket", "properties", "hips_order = 3");
        let server = TestServer::start(scenario_registry(Some("ds1")), backend).await;
        let url = server.url("/api/hips/properties");

        for header in ["\"stale\"", "not-a-tag", ""] {
            let resp = client()
                .get(&url)
                .header("If-None-Match", header)
                .send()
                .await
                .expect("request");
            assert_eq!(resp.status(), 200, "{header:?}");
            assert_eq!(resp.text().await.expect("body"), "hips_order = 3");
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_apply_condition_to_head() {
        let backend = MemoryBackend::new().with_object("someotherbucket", "someprefix/a.jpg", "jpeg");
        let server = TestServer::start(scenario_registry(Some("ds2")), backend).await;
        let url = server.url("/api/hips/v2/ds2/a.jpg");

        let head = client().head(&url).send().await.expect("request");
        let etag = head.headers()["etag"].clone();

        let resp = client()
            .head(&url)
            .header("If-None-Match", etag)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 304);

        server.stop().await;
    }
}
