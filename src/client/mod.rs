//! HTTP client for the dashboard server - dataset fetch and CSV upload

pub mod csv_format;

use std::path::Path;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::dataset::ExerciseDataset;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server answered {0}")]
    Status(u16),
    #[error("invalid dataset: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("user identifier is empty")]
    EmptyUser,
    #[error("cannot read {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("upload aborted after {0:?} without a response")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
}

/// What the server's status code means for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadVerdict {
    Accepted,
    /// Missing user or file
    Rejected,
    /// Server refuses new users once its storage quota is reached
    StorageFull,
    Unexpected,
}

impl UploadVerdict {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => UploadVerdict::Accepted,
            400 => UploadVerdict::Rejected,
            507 => UploadVerdict::StorageFull,
            _ => UploadVerdict::Unexpected,
        }
    }

    pub fn is_accepted(&self) -> bool {
        *self == UploadVerdict::Accepted
    }

    pub fn describe(&self) -> &'static str {
        match self {
            UploadVerdict::Accepted => "accepted",
            UploadVerdict::Rejected => "rejected (missing user or file)",
            UploadVerdict::StorageFull => "rejected (server storage full)",
            UploadVerdict::Unexpected => "unexpected response",
        }
    }
}

/// Any HTTP answer to an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub status: u16,
    pub verdict: UploadVerdict,
}

impl UploadOutcome {
    pub fn from_status(status: u16) -> Self {
        Self {
            status,
            verdict: UploadVerdict::from_status(status),
        }
    }
}

/// Dashboard server client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    data_url: String,
    upload_url: String,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            client: Client::new(),
            data_url: config.data_url(),
            upload_url: config.upload_url(),
            upload_timeout: config.upload_timeout,
        }
    }

    /// GET the whole dataset. No retries.
    pub async fn fetch_dataset(&self) -> Result<ExerciseDataset, FetchError> {
        debug!("Fetching dataset from {}", self.data_url);

        let response = self
            .client
            .get(&self.data_url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let dataset =
            ExerciseDataset::from_json(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        info!("Dataset loaded: {} users", dataset.user_count());
        Ok(dataset)
    }

    /// POST `user` and the file as multipart form data.
    ///
    /// The request is dropped (and its connection closed) if no response
    /// arrives within the upload timeout.
    pub async fn upload(&self, user: &str, file: &Path) -> Result<UploadOutcome, UploadError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(UploadError::EmptyUser);
        }

        let contents = tokio::fs::read(file).await.map_err(|e| UploadError::ReadFile {
            path: file.display().to_string(),
            message: e.to_string(),
        })?;

        match csv_format::sniff(&contents) {
            Some(format) => debug!(
                "Uploading {} export ('{}' separated) for {}",
                format.name(),
                format.delimiter(),
                user
            ),
            None => warn!("{} has an unrecognised header, uploading anyway", file.display()),
        }

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(|e| UploadError::Network(e.to_string()))?;
        let form = Form::new().text("user", user.to_string()).part("file", part);

        let request = self.client.post(&self.upload_url).multipart(form).send();
        let response = match tokio::time::timeout(self.upload_timeout, request).await {
            Ok(sent) => sent.map_err(|e| UploadError::Network(e.to_string()))?,
            Err(_) => return Err(UploadError::Timeout(self.upload_timeout)),
        };

        let outcome = UploadOutcome::from_status(response.status().as_u16());
        info!("Upload for {} finished: {} {}", user, outcome.status, outcome.verdict.describe());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Read one HTTP request (headers + body) from the socket
    async fn read_request(socket: &mut tokio::net::TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return buf;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok());

            match content_length {
                Some(len) if buf.len() >= header_end + 4 + len => return buf,
                Some(_) => continue,
                None if !headers.contains("transfer-encoding: chunked") => return buf,
                None if buf.ends_with(b"0\r\n\r\n") => return buf,
                None => continue,
            }
        }
    }

    /// Serve exactly one request with a canned response
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (DashboardConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\
                 connection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        let config = DashboardConfig::default().with_server(&format!("http://{}", addr));
        (config, handle)
    }

    fn csv_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "Date,Workout Name,Duration,Exercise Name,Set Order,Weight,Reps,\
             Distance,Seconds,Notes,Workout Notes,RPE"
        )
        .unwrap();
        writeln!(file, "2024-01-01 07:00:00,Legs,1h,Squat (Barbell),1,100,5,,,,,").unwrap();
        file
    }

    #[tokio::test]
    async fn test_fetch_dataset() {
        let (config, server) = serve_once(
            "200 OK",
            r#"{"alice": {"Squat (Barbell)": [{"timestamp": "2024-01-01", "maxOneRepMax": 100}]}}"#,
        )
        .await;

        let dataset = ApiClient::new(&config).fetch_dataset().await.unwrap();
        assert_eq!(dataset.user_count(), 1);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/data "), "{}", request);
        assert!(request.to_lowercase().contains("accept: application/json"), "{}", request);
    }

    #[tokio::test]
    async fn test_fetch_dataset_bad_status() {
        let (config, _server) = serve_once("500 Internal Server Error", "").await;
        let err = ApiClient::new(&config).fetch_dataset().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_dataset_bad_body() {
        let (config, _server) = serve_once("200 OK", "<html>not json</html>").await;
        let err = ApiClient::new(&config).fetch_dataset().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_dataset_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = DashboardConfig::default().with_server(&format!("http://{}", addr));
        let err = ApiClient::new(&config).fetch_dataset().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_upload_sends_user_and_file() {
        let (config, server) = serve_once("200 OK", "").await;
        let file = csv_file();

        let outcome = ApiClient::new(&config).upload("bob", file.path()).await.unwrap();
        assert_eq!(outcome, UploadOutcome { status: 200, verdict: UploadVerdict::Accepted });

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/upload "), "{}", request);
        assert!(request.contains("multipart/form-data"), "{}", request);
        assert!(request.contains("name=\"user\""), "{}", request);
        assert!(request.contains("bob"), "{}", request);
        assert!(request.contains("name=\"file\""), "{}", request);
        assert!(request.contains("Squat (Barbell),1,100,5"), "{}", request);
    }

    #[tokio::test]
    async fn test_upload_storage_full() {
        let (config, _server) = serve_once("507 Insufficient Storage", "").await;
        let file = csv_file();

        let outcome = ApiClient::new(&config).upload("bob", file.path()).await.unwrap();
        assert_eq!(outcome.status, 507);
        assert_eq!(outcome.verdict, UploadVerdict::StorageFull);
    }

    #[tokio::test]
    async fn test_upload_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept, read, never answer. Reports whether the client hung up.
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut socket).await;
            let mut buf = [0u8; 64];
            match tokio::time::timeout(Duration::from_secs(3), socket.read(&mut buf)).await {
                Ok(Ok(0)) | Ok(Err(_)) => true,
                Ok(Ok(_)) | Err(_) => false,
            }
        });

        let config = DashboardConfig::default()
            .with_server(&format!("http://{}", addr))
            .with_upload_timeout(Duration::from_millis(200));
        let file = csv_file();

        let started = std::time::Instant::now();
        let err = ApiClient::new(&config).upload("bob", file.path()).await.unwrap_err();
        assert!(
            matches!(err, UploadError::Timeout(d) if d == Duration::from_millis(200)),
            "{:?}",
            err
        );
        assert!(started.elapsed() < Duration::from_secs(5));

        // The request was cancelled, so the server sees the connection close
        assert!(server.await.unwrap(), "connection still open after the timeout");
    }

    #[tokio::test]
    async fn test_upload_empty_user_skips_network() {
        // Nothing listens here; an attempted request would surface as Network
        let config = DashboardConfig::default().with_server("http://127.0.0.1:1");
        let file = csv_file();

        let err = ApiClient::new(&config).upload("  ", file.path()).await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyUser));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let config = DashboardConfig::default().with_server("http://127.0.0.1:1");
        let err = ApiClient::new(&config)
            .upload("bob", Path::new("/definitely/not/here.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::ReadFile { .. }), "{:?}", err);
    }

    #[test]
    fn test_verdict_from_status() {
        assert_eq!(UploadVerdict::from_status(200), UploadVerdict::Accepted);
        assert_eq!(UploadVerdict::from_status(400), UploadVerdict::Rejected);
        assert_eq!(UploadVerdict::from_status(507), UploadVerdict::StorageFull);
        assert_eq!(UploadVerdict::from_status(502), UploadVerdict::Unexpected);
    }
}
