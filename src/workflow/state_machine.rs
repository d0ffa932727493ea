use serde::{Deserialize, Serialize};

/// Settlement summary for one image upload batch. The batch is a single
/// best-effort unit: failures degrade the submission but never roll back
/// the finding, and failed images are not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadReport {
    /// Uploads issued for this submission.
    pub attempted: usize,
    /// Uploads that settled with a failure.
    pub failed: usize,
}

impl UploadReport {
    pub fn is_degraded(&self) -> bool {
        self.failed > 0
    }
}

/// How a submission left the promotion dialog. `AddAnother` is not truly
/// terminal: the workflow loops back to `Editing` with a cleared draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionExit {
    Promoted { finding_id: u64, template_id: u64 },
    Skipped { finding_id: u64 },
    AddAnother,
    /// Edit mode completion; edits have no promotion step.
    Saved { finding_id: u64 },
}

/// Client-side lifecycle of one finding submission.
///
/// `Editing -> Submitting -> ImagesUploading -> AwaitingPromotionDecision
/// -> Terminal`. The promotion decision is unreachable until every upload
/// in the batch has settled, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    Editing,
    Submitting,
    ImagesUploading {
        finding_id: u64,
    },
    AwaitingPromotionDecision {
        finding_id: u64,
        upload: UploadReport,
    },
    Terminal(SubmissionExit),
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Editing => "editing",
            SubmissionState::Submitting => "submitting",
            SubmissionState::ImagesUploading { .. } => "images_uploading",
            SubmissionState::AwaitingPromotionDecision { .. } => "awaiting_promotion_decision",
            SubmissionState::Terminal(SubmissionExit::Promoted { .. }) => "promoted",
            SubmissionState::Terminal(SubmissionExit::Skipped { .. }) => "skipped",
            SubmissionState::Terminal(SubmissionExit::AddAnother) => "add_another",
            SubmissionState::Terminal(SubmissionExit::Saved { .. }) => "saved",
        }
    }

    /// The finding this submission produced, once one exists.
    pub fn finding_id(&self) -> Option<u64> {
        match self {
            SubmissionState::ImagesUploading { finding_id }
            | SubmissionState::AwaitingPromotionDecision { finding_id, .. }
            | SubmissionState::Terminal(SubmissionExit::Promoted { finding_id, .. })
            | SubmissionState::Terminal(SubmissionExit::Skipped { finding_id })
            | SubmissionState::Terminal(SubmissionExit::Saved { finding_id }) => Some(*finding_id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Terminal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_are_stable() {
        assert_eq!(SubmissionState::Editing.name(), "editing");
        assert_eq!(
            SubmissionState::AwaitingPromotionDecision {
                finding_id: 1,
                upload: UploadReport::default(),
            }
            .name(),
            "awaiting_promotion_decision"
        );
        assert_eq!(
            SubmissionState::Terminal(SubmissionExit::AddAnother).name(),
            "add_another"
        );
    }

    #[test]
    fn finding_id_is_exposed_from_post_create_states() {
        assert_eq!(SubmissionState::Editing.finding_id(), None);
        assert_eq!(
            SubmissionState::ImagesUploading { finding_id: 42 }.finding_id(),
            Some(42)
        );
        let terminal = SubmissionState::Terminal(SubmissionExit::Skipped { finding_id: 42 });
        assert_eq!(terminal.finding_id(), Some(42));
        assert!(terminal.is_terminal());
    }

    #[test]
    fn upload_report_flags_degraded_batches() {
        assert!(!UploadReport { attempted: 3, failed: 0 }.is_degraded());
        assert!(UploadReport { attempted: 3, failed: 1 }.is_degraded());
    }
}
