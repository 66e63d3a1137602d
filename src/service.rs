use crate::config::ServiceConfig;
use crate::error::{CompressionError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{info, warn};

/// One upload to the compression service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub k: u32,
}

/// Remote collaborator that turns an image into a compressed JPEG.
#[async_trait]
pub trait CompressionService: Send + Sync {
    /// Returns the compressed image bytes, or `Transport`/`Service` on failure.
    async fn compress(&self, request: UploadRequest) -> Result<Vec<u8>>;
}

/// `reqwest`-backed client for the HTTP compression service.
#[derive(Debug, Clone)]
pub struct HttpCompressionService {
    client: Client,
    config: ServiceConfig,
}

impl HttpCompressionService {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pca-squeeze/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CompressionError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Query the liveness endpoint and return its plain-text body.
    pub async fn health(&self) -> Result<String> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| CompressionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompressionError::Service {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| CompressionError::Transport(e.to_string()))
    }
}

fn build_form(request: UploadRequest) -> Result<Form> {
    let UploadRequest {
        file_name,
        content_type,
        bytes,
        k,
    } = request;

    let file_part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(&content_type)
        .map_err(|e| CompressionError::Client(format!("invalid content type: {}", e)))?;

    Ok(Form::new().part("file", file_part).text("k", k.to_string()))
}

#[async_trait]
impl CompressionService for HttpCompressionService {
    async fn compress(&self, request: UploadRequest) -> Result<Vec<u8>> {
        let url = self.config.compress_url();
        info!(
            "POST {} ({} bytes, k={})",
            url,
            request.bytes.len(),
            request.k
        );

        let form = build_form(request)?;
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("request to {} failed: {}", url, e);
                CompressionError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("compression service answered {}", status);
            return Err(CompressionError::Service {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CompressionError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }
}
