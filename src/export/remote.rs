//! Remote PDF conversion service client
//!
//! Posts the flattened PNG as a multipart form and returns the response body
//! as the PDF.

use reqwest::multipart::{Form, Part};

use crate::error::{EditorError, Result};

pub const CREATE_PDF_PATH: &str = "/api/create-pdf";
pub const IMAGE_FIELD: &str = "image";
pub const IMAGE_FILE_NAME: &str = "canvas.png";

/// Full endpoint URL for a service base URL
pub fn endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), CREATE_PDF_PATH)
}

/// Convert a PNG into a PDF through the service at `base_url`
pub async fn convert(client: &reqwest::Client, base_url: &str, png: Vec<u8>) -> Result<Vec<u8>> {
    let url = endpoint(base_url);
    let part = Part::bytes(png)
        .file_name(IMAGE_FILE_NAME)
        .mime_str("image/png")?;
    let form = Form::new().part(IMAGE_FIELD, part);

    log::info!("Requesting PDF conversion from {}", url);
    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|err| {
            log::warn!("Conversion request to {} failed: {}", url, err);
            EditorError::Conversion {
                detail: "request failed".to_string(),
                status: err.status().map(|s| s.as_u16()),
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(EditorError::Conversion {
            detail: "request failed".to_string(),
            status: Some(status.as_u16()),
        });
    }

    let body = response.bytes().await?;
    log::info!("Received {} byte PDF", body.len());
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one request, capture it, and answer with `status` and `body`
    async fn serve_once(status: &'static str, body: &'static [u8]) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        (base, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(split) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&request[..split]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= split + 4 + length
    }

    #[test]
    fn test_endpoint_joins_path() {
        assert_eq!(endpoint("http://localhost:5000"), "http://localhost:5000/api/create-pdf");
        assert_eq!(endpoint("http://host/"), "http://host/api/create-pdf");
    }

    #[tokio::test]
    async fn test_posts_png_as_multipart() {
        let (base, server) = serve_once("200 OK", b"%PDF-1.4 fake").await;
        let client = reqwest::Client::new();
        let pdf = convert(&client, &base, b"\x89PNG fake".to_vec()).await.unwrap();
        assert_eq!(pdf, b"%PDF-1.4 fake");

        let request = String::from_utf8_lossy(&server.await.unwrap()).into_owned();
        assert!(request.starts_with("POST /api/create-pdf"));
        assert!(request.contains("name=\"image\""));
        assert!(request.contains("filename=\"canvas.png\""));
        assert!(request.contains("image/png"));
    }

    #[tokio::test]
    async fn test_error_status_is_conversion_failure() {
        let (base, server) = serve_once("500 Internal Server Error", b"oops").await;
        let client = reqwest::Client::new();
        let err = convert(&client, &base, vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(
            err,
            EditorError::Conversion {
                status: Some(500),
                ..
            }
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_service_is_conversion_failure() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = reqwest::Client::new();
        let err = convert(&client, &base, vec![1]).await.unwrap_err();
        assert!(matches!(err, EditorError::Conversion { status: None, .. }));
    }
}
