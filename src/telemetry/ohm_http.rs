//! OpenHardwareMonitor web server client (`GET /data.json`).

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::config::types::TelemetrySettings;
use crate::error::TelemetryError;
use crate::telemetry::types::SensorNode;
use crate::telemetry::TelemetrySource;

pub struct OhmHttpSource {
    client: reqwest::Client,
    url: String,
}

impl OhmHttpSource {
    pub fn new(settings: &TelemetrySettings) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: settings.url.clone(),
        })
    }
}

#[async_trait]
impl TelemetrySource for OhmHttpSource {
    async fn fetch_snapshot(&self) -> Result<SensorNode, TelemetryError> {
        trace!("GET {}", self.url);

        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        serde_json::from_slice(&body).map_err(|e| TelemetryError::Decode(e.to_string()))
    }

    fn describe(&self) -> String {
        format!("OpenHardwareMonitor ({})", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `response` to the first connection and return the feed settings for it.
    async fn serve_once(response: &'static str) -> TelemetrySettings {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        TelemetrySettings {
            url: format!("http://{}/data.json", addr),
            timeout_secs: 2.0,
            ..TelemetrySettings::default()
        }
    }

    #[tokio::test]
    async fn server_error_status_is_transport_error() {
        let settings = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let source = OhmHttpSource::new(&settings).unwrap();

        let err = source.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, TelemetryError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let settings = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 10\r\nConnection: close\r\n\r\n{ not json",
        )
        .await;
        let source = OhmHttpSource::new(&settings).unwrap();

        let err = source.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, TelemetryError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn well_formed_document_is_parsed() {
        let settings = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 31\r\nConnection: close\r\n\r\n{\"Text\":\"Sensor\",\"Children\":[]}",
        )
        .await;
        let source = OhmHttpSource::new(&settings).unwrap();

        let root = source.fetch_snapshot().await.unwrap();
        assert_eq!(root.text, "Sensor");
        assert!(root.children.is_empty());
    }

    #[tokio::test]
    async fn unreachable_feed_is_transport_error() {
        // Port 1 on loopback is not listening; the connect is refused immediately.
        let source = OhmHttpSource::new(&TelemetrySettings {
            url: "http://127.0.0.1:1/data.json".to_string(),
            timeout_secs: 2.0,
            ..TelemetrySettings::default()
        })
        .unwrap();

        let err = source.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, TelemetryError::Transport(_)), "got {err:?}");
    }
}
