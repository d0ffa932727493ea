use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::cache::{Cache, CacheKey};
use crate::model::{FindingDraft, KnowledgeBaseTemplate, PendingImage};
use crate::remote::{RemoteError, RemoteStore};
use crate::workflow::navigator::Navigator;
use crate::workflow::state_machine::{SubmissionExit, SubmissionState, UploadReport};

/// Delay between closing the promotion dialog and navigating away, so the
/// dialog visibly closes first. A UX ordering contract, not a correctness
/// one.
const DIALOG_CLOSE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Local, field-scoped validation failure. Blocks submission before
    /// any network call.
    #[error("missing required field: {field}")]
    Validation { field: &'static str },
    #[error("report {0} not found")]
    ReportNotFound(u64),
    #[error("finding {0} not found")]
    FindingNotFound(u64),
    #[error("failed to load from backend")]
    Load(#[source] RemoteError),
    /// Finding create/update failed; the draft is retained for
    /// resubmission and the workflow state does not advance.
    #[error("failed to save finding")]
    Save(#[source] RemoteError),
    #[error("failed to promote finding {finding_id} to the knowledge base")]
    Promotion {
        finding_id: u64,
        #[source]
        source: RemoteError,
    },
    #[error("failed to delete image {image_id}")]
    ImageDelete {
        image_id: u64,
        #[source]
        source: RemoteError,
    },
    #[error("operation {operation} not valid in state {state}")]
    OutOfOrder {
        operation: &'static str,
        state: &'static str,
    },
}

/// Drives creation (or edit) of one finding: validate, submit the record,
/// upload queued evidence images as a jointly-awaited batch, then resolve
/// the promotion decision with one of three exit actions.
///
/// One instance per form mount; discarded after a terminal exit.
pub struct FindingSubmissionWorkflow {
    store: Arc<dyn RemoteStore>,
    cache: Arc<dyn Cache>,
    navigator: Arc<dyn Navigator>,
    report_id: u64,
    state: SubmissionState,
    pending_images: Vec<PendingImage>,
}

impl std::fmt::Debug for FindingSubmissionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindingSubmissionWorkflow")
            .field("report_id", &self.report_id)
            .field("state", &self.state)
            .field("pending_images", &self.pending_images)
            .finish_non_exhaustive()
    }
}

impl FindingSubmissionWorkflow {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        cache: Arc<dyn Cache>,
        navigator: Arc<dyn Navigator>,
        report_id: u64,
    ) -> Self {
        Self {
            store,
            cache,
            navigator,
            report_id,
            state: SubmissionState::Editing,
            pending_images: Vec::new(),
        }
    }

    /// Mount the create form for a report. A missing report yields a
    /// terminal not-found error; no partial workflow is entered.
    pub async fn for_report(
        store: Arc<dyn RemoteStore>,
        cache: Arc<dyn Cache>,
        navigator: Arc<dyn Navigator>,
        report_id: u64,
    ) -> Result<Self, WorkflowError> {
        match store.get_report(report_id).await {
            Ok(Some(_)) => Ok(Self::new(store, cache, navigator, report_id)),
            Ok(None) => Err(WorkflowError::ReportNotFound(report_id)),
            Err(err) => Err(WorkflowError::Load(err)),
        }
    }

    /// Mount the edit form for an existing finding, hydrating a draft from
    /// the persisted record.
    pub async fn for_finding(
        store: Arc<dyn RemoteStore>,
        cache: Arc<dyn Cache>,
        navigator: Arc<dyn Navigator>,
        finding_id: u64,
    ) -> Result<(Self, FindingDraft), WorkflowError> {
        let finding = match store.get_finding(finding_id).await {
            Ok(Some(finding)) => finding,
            Ok(None) => return Err(WorkflowError::FindingNotFound(finding_id)),
            Err(err) => return Err(WorkflowError::Load(err)),
        };
        let draft = FindingDraft::from_finding(&finding);
        let workflow = Self::new(store, cache, navigator, finding.report_id);
        Ok((workflow, draft))
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn report_id(&self) -> u64 {
        self.report_id
    }

    /// Queue an evidence image. Owned by the workflow until its upload
    /// settles or the user removes it.
    pub fn add_pending_image(&mut self, image: PendingImage) {
        self.pending_images.push(image);
    }

    /// Drop a queued image before submission.
    pub fn remove_pending_image(&mut self, index: usize) {
        if index < self.pending_images.len() {
            self.pending_images.remove(index);
        }
    }

    pub fn pending_images(&self) -> &[PendingImage] {
        &self.pending_images
    }

    fn transition(&mut self, next: SubmissionState) {
        info!(
            report_id = self.report_id,
            from = self.state.name(),
            to = next.name(),
            "submission state transition"
        );
        self.state = next;
    }

    fn require_editing(&self, operation: &'static str) -> Result<(), WorkflowError> {
        if self.state != SubmissionState::Editing {
            return Err(WorkflowError::OutOfOrder {
                operation,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    fn require_promotion_decision(
        &self,
        operation: &'static str,
    ) -> Result<u64, WorkflowError> {
        match &self.state {
            SubmissionState::AwaitingPromotionDecision { finding_id, .. } => Ok(*finding_id),
            other => Err(WorkflowError::OutOfOrder {
                operation,
                state: other.name(),
            }),
        }
    }

    fn validate(draft: &FindingDraft) -> Result<(), WorkflowError> {
        if draft.title.trim().is_empty() {
            return Err(WorkflowError::Validation { field: "title" });
        }
        if draft.description.trim().is_empty() {
            return Err(WorkflowError::Validation { field: "description" });
        }
        Ok(())
    }

    /// Create the finding, then upload all queued images as one
    /// jointly-awaited batch. Upload failures degrade the result but never
    /// roll the finding back; failed images are dropped, not retried. The
    /// report cache is invalidated exactly once after the batch settles,
    /// and only then does the promotion decision become reachable.
    pub async fn submit(&mut self, draft: &FindingDraft) -> Result<UploadReport, WorkflowError> {
        self.require_editing("submit")?;
        Self::validate(draft)?;

        self.transition(SubmissionState::Submitting);
        let normalized = draft.normalized();
        let finding = match self.store.create_finding(&normalized).await {
            Ok(finding) => finding,
            Err(err) => {
                warn!(report_id = self.report_id, error = %err, "finding create failed");
                self.transition(SubmissionState::Editing);
                return Err(WorkflowError::Save(err));
            }
        };
        info!(
            report_id = self.report_id,
            finding_id = finding.id,
            "finding created"
        );

        let images = std::mem::take(&mut self.pending_images);
        let upload = if images.is_empty() {
            UploadReport::default()
        } else {
            self.transition(SubmissionState::ImagesUploading {
                finding_id: finding.id,
            });
            self.upload_batch(finding.id, images).await
        };
        if upload.is_degraded() {
            warn!(
                finding_id = finding.id,
                attempted = upload.attempted,
                failed = upload.failed,
                "finding saved but some evidence images were not uploaded"
            );
        }

        // Server truth changed whether or not every upload made it; the
        // next report read must refetch before anything navigates.
        self.cache.invalidate(&CacheKey::Report(self.report_id)).await;

        self.transition(SubmissionState::AwaitingPromotionDecision {
            finding_id: finding.id,
            upload,
        });
        Ok(upload)
    }

    /// Update an existing finding. Same normalization and batch policy as
    /// `submit`; both the finding and report caches are invalidated on any
    /// outcome and the user is navigated back to the report. No promotion
    /// step in edit mode.
    pub async fn edit_submit(
        &mut self,
        finding_id: u64,
        draft: &FindingDraft,
    ) -> Result<UploadReport, WorkflowError> {
        self.require_editing("edit_submit")?;
        Self::validate(draft)?;

        self.transition(SubmissionState::Submitting);
        let normalized = draft.normalized();
        if let Err(err) = self.store.update_finding(finding_id, &normalized).await {
            warn!(finding_id, error = %err, "finding update failed");
            self.transition(SubmissionState::Editing);
            return Err(WorkflowError::Save(err));
        }

        let images = std::mem::take(&mut self.pending_images);
        let upload = if images.is_empty() {
            UploadReport::default()
        } else {
            self.transition(SubmissionState::ImagesUploading { finding_id });
            self.upload_batch(finding_id, images).await
        };
        if upload.is_degraded() {
            warn!(
                finding_id,
                attempted = upload.attempted,
                failed = upload.failed,
                "finding updated but some evidence images were not uploaded"
            );
        }

        self.cache.invalidate(&CacheKey::Finding(finding_id)).await;
        self.cache.invalidate(&CacheKey::Report(self.report_id)).await;
        self.transition(SubmissionState::Terminal(SubmissionExit::Saved {
            finding_id,
        }));
        self.navigator.to_report(self.report_id).await;
        Ok(upload)
    }

    /// Fan out every upload concurrently and wait for all of them to
    /// settle. Partial completion is acceptable; partial pending is not.
    async fn upload_batch(&self, finding_id: u64, images: Vec<PendingImage>) -> UploadReport {
        let attempted = images.len();
        let mut uploads = JoinSet::new();
        for image in images {
            let store = Arc::clone(&self.store);
            uploads.spawn(async move {
                store
                    .upload_finding_image(finding_id, image.bytes, &image.filename)
                    .await
                    .map_err(|err| (image.filename, err))
            });
        }

        let mut failed = 0;
        while let Some(settled) = uploads.join_next().await {
            match settled {
                Ok(Ok(image)) => {
                    info!(finding_id, image_id = image.id, "evidence image uploaded");
                }
                Ok(Err((filename, err))) => {
                    warn!(finding_id, filename = %filename, error = %err, "evidence image upload failed");
                    failed += 1;
                }
                Err(join_err) => {
                    warn!(finding_id, error = %join_err, "evidence image upload task failed");
                    failed += 1;
                }
            }
        }
        UploadReport { attempted, failed }
    }

    /// Promote the just-created finding into the knowledge base. On
    /// failure the dialog stays open: state is unchanged and the user may
    /// retry or pick a different exit.
    pub async fn promote(&mut self) -> Result<KnowledgeBaseTemplate, WorkflowError> {
        let finding_id = self.require_promotion_decision("promote")?;
        let template = match self.store.promote_to_template(finding_id).await {
            Ok(template) => template,
            Err(err) => {
                warn!(finding_id, error = %err, "knowledge base promotion failed");
                return Err(WorkflowError::Promotion {
                    finding_id,
                    source: err,
                });
            }
        };

        self.cache.invalidate(&CacheKey::Report(self.report_id)).await;
        self.cache.invalidate(&CacheKey::KnowledgeBaseTemplates).await;
        self.transition(SubmissionState::Terminal(SubmissionExit::Promoted {
            finding_id,
            template_id: template.id,
        }));

        tokio::time::sleep(DIALOG_CLOSE_DELAY).await;
        self.navigator.to_report(self.report_id).await;
        Ok(template)
    }

    /// Decline promotion and return to the report immediately.
    pub async fn skip(&mut self) -> Result<(), WorkflowError> {
        let finding_id = self.require_promotion_decision("skip")?;
        self.transition(SubmissionState::Terminal(SubmissionExit::Skipped {
            finding_id,
        }));
        self.navigator.to_report(self.report_id).await;
        Ok(())
    }

    /// Loop back to editing with a cleared draft: same report id, risk
    /// level back to medium, every other field empty, no queued images.
    pub fn add_another(&mut self) -> Result<FindingDraft, WorkflowError> {
        self.require_promotion_decision("add_another")?;
        self.pending_images.clear();
        self.transition(SubmissionState::Terminal(SubmissionExit::AddAnother));
        self.transition(SubmissionState::Editing);
        Ok(FindingDraft::for_report(self.report_id))
    }

    /// Delete a persisted evidence image. On success the caller drops it
    /// from view state; no report cache invalidation is required.
    pub async fn remove_existing_image(&self, image_id: u64) -> Result<(), WorkflowError> {
        self.store
            .delete_image(image_id)
            .await
            .map_err(|source| WorkflowError::ImageDelete { image_id, source })?;
        info!(image_id, "evidence image deleted");
        Ok(())
    }
}
