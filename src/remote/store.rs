use async_trait::async_trait;

use crate::model::{FindingDraft, KnowledgeBaseTemplate, PersistedFinding, PersistedImage, Report};
use crate::remote::error::RemoteError;

/// Remote operations consumed by the submission workflow and the reorder
/// coordinator. Implementations must not retry on their own; retry policy
/// belongs to the caller (and for image uploads there is none).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a report with all its findings. `None` when the backend
    /// reports it missing rather than failing.
    async fn get_report(&self, report_id: u64) -> Result<Option<Report>, RemoteError>;

    /// Fetch a single finding, `None` when missing.
    async fn get_finding(&self, finding_id: u64)
        -> Result<Option<PersistedFinding>, RemoteError>;

    /// Create a finding from a normalized draft.
    async fn create_finding(&self, draft: &FindingDraft)
        -> Result<PersistedFinding, RemoteError>;

    /// Update an existing finding from a normalized draft.
    async fn update_finding(
        &self,
        finding_id: u64,
        draft: &FindingDraft,
    ) -> Result<PersistedFinding, RemoteError>;

    /// Delete a finding. The backend cascades evidence image deletion.
    async fn delete_finding(&self, finding_id: u64) -> Result<(), RemoteError>;

    /// Upload one evidence image for a finding.
    async fn upload_finding_image(
        &self,
        finding_id: u64,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<PersistedImage, RemoteError>;

    /// Delete a persisted evidence image.
    async fn delete_image(&self, image_id: u64) -> Result<(), RemoteError>;

    /// Submit the complete new order of all findings in a report. The
    /// backend is assumed to apply the list atomically; the client has no
    /// compensating action for a partial apply.
    async fn reorder_findings(
        &self,
        report_id: u64,
        ordered_ids: &[u64],
    ) -> Result<(), RemoteError>;

    /// Promote a finding into a reusable knowledge-base template.
    async fn promote_to_template(
        &self,
        finding_id: u64,
    ) -> Result<KnowledgeBaseTemplate, RemoteError>;
}
