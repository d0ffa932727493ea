use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::config::ApiConfig;
use crate::model::{FindingDraft, KnowledgeBaseTemplate, PersistedFinding, PersistedImage, Report};
use crate::remote::error::RemoteError;
use crate::remote::store::RemoteStore;
use crate::telemetry::generate_correlation_id;

/// reqwest-backed store speaking the report backend's REST routes.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to `RemoteError::Http` with the body as
    /// the message, otherwise hand the response back for decoding.
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, RemoteError> {
        let response = self
            .client
            .get(self.url(path))
            .header("x-correlation-id", generate_correlation_id())
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.json::<T>().await?))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get_report(&self, report_id: u64) -> Result<Option<Report>, RemoteError> {
        debug!(report_id, "fetching report");
        self.get_optional(&format!("/reports/{report_id}")).await
    }

    async fn get_finding(
        &self,
        finding_id: u64,
    ) -> Result<Option<PersistedFinding>, RemoteError> {
        debug!(finding_id, "fetching finding");
        self.get_optional(&format!("/findings/{finding_id}")).await
    }

    async fn create_finding(
        &self,
        draft: &FindingDraft,
    ) -> Result<PersistedFinding, RemoteError> {
        let response = self
            .client
            .post(self.url("/findings"))
            .header("x-correlation-id", generate_correlation_id())
            .json(draft)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn update_finding(
        &self,
        finding_id: u64,
        draft: &FindingDraft,
    ) -> Result<PersistedFinding, RemoteError> {
        let response = self
            .client
            .put(self.url(&format!("/findings/{finding_id}")))
            .header("x-correlation-id", generate_correlation_id())
            .json(draft)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_finding(&self, finding_id: u64) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.url(&format!("/findings/{finding_id}")))
            .header("x-correlation-id", generate_correlation_id())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn upload_finding_image(
        &self,
        finding_id: u64,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<PersistedImage, RemoteError> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(self.url(&format!("/findings/{finding_id}/poc-images")))
            .header("x-correlation-id", generate_correlation_id())
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_image(&self, image_id: u64) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.url(&format!("/poc-images/{image_id}")))
            .header("x-correlation-id", generate_correlation_id())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn reorder_findings(
        &self,
        report_id: u64,
        ordered_ids: &[u64],
    ) -> Result<(), RemoteError> {
        // The backend expects the complete order under the "orderedIds" key.
        let body = json!({
            "report_id": report_id,
            "orderedIds": ordered_ids,
        });
        let response = self
            .client
            .post(self.url("/findings/reorder"))
            .header("x-correlation-id", generate_correlation_id())
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn promote_to_template(
        &self,
        finding_id: u64,
    ) -> Result<KnowledgeBaseTemplate, RemoteError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/findings/{finding_id}/save-to-knowledge-base"
            )))
            .header("x-correlation-id", generate_correlation_id())
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}
