use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use wayfarer_domain::DomainResult;
use wayfarer_domain::error::DomainError;
use wayfarer_domain::ports::BoxFuture;
use wayfarer_domain::ports::media::BannerStore;

use crate::config::AppConfig;

const UPLOAD_TIMEOUT_SECS: u64 = 15;

/// Banner storage backed by an S3-compatible object store (MinIO in dev).
/// Objects land at `{endpoint}/{bucket}/{key}` and that URL is the stored
/// reference.
#[derive(Clone)]
pub struct ObjectStoreBannerStore {
    http: Client,
    endpoint: String,
    bucket: String,
}

impl ObjectStoreBannerStore {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.s3_endpoint.trim_end_matches('/').to_string(),
            bucket: config.s3_bucket.clone(),
        })
    }
}

impl BannerStore for ObjectStoreBannerStore {
    fn store_banner(
        &self,
        object_key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, DomainResult<String>> {
        let object_key = object_key.to_string();
        let content_type = content_type.to_string();
        let http = self.http.clone();
        let url = format!("{}/{}/{}", self.endpoint, self.bucket, object_key);
        Box::pin(async move {
            if object_key.trim().is_empty() {
                return Err(DomainError::Validation(
                    "banner object key is required".into(),
                ));
            }
            if bytes.is_empty() {
                return Err(DomainError::Validation("banner file is empty".into()));
            }

            let response = http
                .put(&url)
                .header(CONTENT_TYPE, content_type)
                .body(bytes)
                .send()
                .await
                .map_err(|err| DomainError::Upstream {
                    operation: "banner_upload",
                    detail: err.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(DomainError::Upstream {
                    operation: "banner_upload",
                    detail: format!("object store returned status {status}"),
                });
            }

            tracing::debug!(%url, "banner stored");
            Ok(url)
        })
    }
}
