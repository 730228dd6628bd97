//! Filesystem backend integration tests.

#[cfg(test)]
mod tests {
    use crawlspace_storage::FilesystemBackend;

    use crate::{TestServer, client, scenario_registry};

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::create_dir_all(root.join("somebucket/Norder3")).expect("mkdir");
        std::fs::create_dir_all(root.join("someotherbucket/someprefix/some")).expect("mkdir");
        std::fs::write(root.join("somebucket/Norder3/Allsky.fits"), b"SIMPLE  =  T").expect("write");
        std::fs::write(root.join("somebucket/metadata.xml"), b"<VOTABLE/>").expect("write");
        std::fs::write(
            root.join("someotherbucket/someprefix/some/image.jpg"),
            vec![0xFF_u8; 300_000],
        )
        .expect("write");
        dir
    }

    #[tokio::test]
    async fn test_should_serve_files_with_validators() {
        let dir = data_dir();
        let backend = FilesystemBackend::new(dir.path());
        let server = TestServer::start(scenario_registry(Some("ds2")), backend).await;

        let resp = client()
            .get(server.url("/api/hips/some/image.jpg"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "image/jpeg");
        assert_eq!(resp.headers()["content-length"], "300000");
        assert!(resp.headers().contains_key("last-modified"));
        let etag = resp.headers()["etag"].clone();
        assert_eq!(resp.bytes().await.expect("body").len(), 300_000);

        let resp = client()
            .get(server.url("/api/hips/v2/ds2/some/image.jpg"))
            .header("If-None-Match", etag)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 304);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_apply_astronomy_media_types() {
        let dir = data_dir();
        let backend = FilesystemBackend::new(dir.path());
        let server = TestServer::start(scenario_registry(Some("ds1")), backend).await;

        let resp = client()
            .get(server.url("/api/hips/v2/ds1/Norder3/Allsky.fits"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.headers()["content-type"], "application/fits");

        let resp = client()
            .get(server.url("/api/hips/v2/ds1/metadata.xml"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.headers()["content-type"], "application/x-votable+xml");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_not_serve_directories_or_escape_root() {
        let dir = data_dir();
        std::fs::write(dir.path().join("outside.txt"), b"secret").expect("write");
        let backend = FilesystemBackend::new(dir.path());
        let server = TestServer::start(scenario_registry(Some("ds1")), backend).await;

        let resp = client()
            .get(server.url("/api/hips/Norder3"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 404);

        let resp = client()
            .get(server.url("/api/hips/..%2Foutside.txt"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 400);

        server.stop().await;
    }
}
