//! Streaming and stream-release integration tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crawlspace_storage::MemoryBackend;
    use futures::StreamExt;

    use crate::{TestServer, client, eventually, scenario_registry};

    #[tokio::test]
    async fn test_should_stream_large_object_in_chunks() {
        let data: Vec<u8> = (0..2_000_000u32).map(|i| (i % 251) as u8).collect();
        let backend = MemoryBackend::new()
            .with_chunk_size(64 * 1024)
            .with_object("somebucket", "Norder9/big.fits", data.clone());
        let server = TestServer::start(scenario_registry(Some("ds1")), backend.clone()).await;

        let resp = client()
            .get(server.url("/api/hips/Norder9/big.fits"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "2000000");

        let mut received = Vec::with_capacity(data.len());
        let mut chunks = 0;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            received.extend_from_slice(&chunk.expect("chunk"));
            chunks += 1;
        }
        assert!(chunks > 1);
        assert_eq!(received, data);
        assert!(eventually(Duration::from_secs(5), || backend.live_streams() == 0).await);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_release_stream_when_client_disconnects() {
        let backend = MemoryBackend::new().with_endless_object("somebucket", "endless.bin");
        let server = TestServer::start(scenario_registry(Some("ds1")), backend.clone()).await;

        let resp = client()
            .get(server.url("/api/hips/endless.bin"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);

        let mut body = resp.bytes_stream();
        for _ in 0..4 {
            body.next().await.expect("chunk").expect("chunk bytes");
        }
        assert_eq!(backend.live_streams(), 1);

        // Hang up mid-body.
        drop(body);

        assert!(
            eventually(Duration::from_secs(5), || backend.live_streams() == 0).await,
            "storage stream still open after client disconnect"
        );
        assert_eq!(backend.reads(), 1);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_release_streams_under_concurrent_abandonment() {
        let backend = MemoryBackend::new().with_endless_object("somebucket", "endless.bin");
        let server = TestServer::start(scenario_registry(Some("ds1")), backend.clone()).await;
        let url = server.url("/api/hips/endless.bin");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let url = url.clone();
                tokio::spawn(async move {
                    let resp = client().get(url).send().await.expect("request");
                    let mut body = resp.bytes_stream();
                    body.next().await.expect("chunk").expect("chunk bytes");
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("client task");
        }

        assert!(eventually(Duration::from_secs(5), || backend.live_streams() == 0).await);
        assert_eq!(backend.reads(), 8);

        server.stop().await;
    }
}
