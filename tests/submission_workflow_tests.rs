// End-to-end submission workflow behavior against the recording fakes

use std::sync::Arc;
use std::time::Duration;

use pentest_findings::cache::{Cache, CacheKey};
use pentest_findings::model::{FindingDraft, PendingImage, RiskLevel};
use pentest_findings::remote::RemoteStore;
use pentest_findings::workflow::mocks::{
    sample_report, RecordingCache, RecordingNavigator, RecordingRemoteStore, RemoteCall,
};
use pentest_findings::workflow::{
    FindingSubmissionWorkflow, Navigator, SubmissionState, WorkflowError,
};

fn fakes() -> (
    Arc<RecordingRemoteStore>,
    Arc<RecordingCache>,
    Arc<RecordingNavigator>,
) {
    let store = Arc::new(RecordingRemoteStore::new());
    store.add_report(sample_report(7, vec![]));
    (
        store,
        Arc::new(RecordingCache::new()),
        Arc::new(RecordingNavigator::new()),
    )
}

fn workflow(
    store: &Arc<RecordingRemoteStore>,
    cache: &Arc<RecordingCache>,
    navigator: &Arc<RecordingNavigator>,
) -> FindingSubmissionWorkflow {
    FindingSubmissionWorkflow::new(
        Arc::clone(store) as Arc<dyn RemoteStore>,
        Arc::clone(cache) as Arc<dyn Cache>,
        Arc::clone(navigator) as Arc<dyn Navigator>,
        7,
    )
}

fn valid_draft() -> FindingDraft {
    let mut draft = FindingDraft::for_report(7);
    draft.title = "Stored XSS in comment field".to_string();
    draft.description = "Comments are rendered without output encoding".to_string();
    draft
}

#[tokio::test]
async fn blank_required_fields_block_submission_before_any_network_call() {
    let (store, cache, navigator) = fakes();
    let mut wf = workflow(&store, &cache, &navigator);

    let mut draft = valid_draft();
    draft.title = "   ".to_string();
    let err = wf.submit(&draft).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { field: "title" }));

    let mut draft = valid_draft();
    draft.description = String::new();
    let err = wf.submit(&draft).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation {
            field: "description"
        }
    ));

    assert!(store
        .calls_matching(|c| matches!(c, RemoteCall::CreateFinding { .. }))
        .is_empty());
    assert_eq!(*wf.state(), SubmissionState::Editing);
}

#[tokio::test]
async fn empty_optional_fields_are_omitted_from_the_create_payload() {
    let (store, cache, navigator) = fakes();
    let mut wf = workflow(&store, &cache, &navigator);

    let mut draft = valid_draft();
    draft.affected_area = Some(String::new());
    draft.solution = Some("encode on output".to_string());
    draft.cwe_id = Some(String::new());
    wf.submit(&draft).await.unwrap();

    let creates = store.calls_matching(|c| matches!(c, RemoteCall::CreateFinding { .. }));
    assert_eq!(creates.len(), 1);
    match &creates[0] {
        RemoteCall::CreateFinding { draft } => {
            assert_eq!(draft.affected_area, None);
            assert_eq!(draft.cwe_id, None);
            assert_eq!(draft.solution.as_deref(), Some("encode on output"));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn partial_upload_failures_still_reach_the_promotion_decision_once() {
    let (store, cache, navigator) = fakes();
    store.fail_upload("broken.png");
    let mut wf = workflow(&store, &cache, &navigator);
    wf.add_pending_image(PendingImage::new(vec![1], "a.png"));
    wf.add_pending_image(PendingImage::new(vec![2], "broken.png"));
    wf.add_pending_image(PendingImage::new(vec![3], "c.png"));

    let upload = wf.submit(&valid_draft()).await.unwrap();

    assert_eq!(upload.attempted, 3);
    assert_eq!(upload.failed, 1);
    assert!(upload.is_degraded());
    assert!(matches!(
        wf.state(),
        SubmissionState::AwaitingPromotionDecision { .. }
    ));
    // One settlement, one invalidation, regardless of the failure.
    assert_eq!(cache.count_for(&CacheKey::Report(7)), 1);
}

#[tokio::test]
async fn every_upload_settles_before_the_promotion_decision_opens() {
    let (store, cache, navigator) = fakes();
    store.set_upload_delay(Duration::from_millis(50));
    let mut wf = workflow(&store, &cache, &navigator);
    wf.add_pending_image(PendingImage::new(vec![1], "a.png"));
    wf.add_pending_image(PendingImage::new(vec![2], "b.png"));
    wf.add_pending_image(PendingImage::new(vec![3], "c.png"));

    wf.submit(&valid_draft()).await.unwrap();

    // submit() returning with the dialog open implies the whole batch is
    // settled; no upload may still be in flight.
    assert_eq!(store.uploads_settled(), 3);
    assert!(matches!(
        wf.state(),
        SubmissionState::AwaitingPromotionDecision { .. }
    ));
    assert_eq!(cache.count_for(&CacheKey::Report(7)), 1);
}

#[tokio::test]
async fn add_another_resets_the_draft_but_keeps_the_report() {
    let (store, cache, navigator) = fakes();
    let mut wf = workflow(&store, &cache, &navigator);
    wf.add_pending_image(PendingImage::new(vec![1], "a.png"));

    let mut draft = valid_draft();
    draft.risk_level = RiskLevel::Critical;
    draft.impact = Some("account takeover".to_string());
    wf.submit(&draft).await.unwrap();

    let fresh = wf.add_another().unwrap();

    assert_eq!(fresh.report_id, 7);
    assert!(fresh.title.is_empty());
    assert!(fresh.description.is_empty());
    assert_eq!(fresh.risk_level, RiskLevel::Medium);
    assert_eq!(fresh.impact, None);
    assert!(wf.pending_images().is_empty());
    assert_eq!(*wf.state(), SubmissionState::Editing);
    // The user stays on the form; nothing navigates.
    assert!(navigator.visits().is_empty());
}

#[tokio::test]
async fn promote_invalidates_report_and_template_caches_then_navigates() {
    let (store, cache, navigator) = fakes();
    let mut wf = workflow(&store, &cache, &navigator);
    wf.submit(&valid_draft()).await.unwrap();

    let template = wf.promote().await.unwrap();

    assert_eq!(template.finding_id, wf.state().finding_id());
    assert_eq!(cache.count_for(&CacheKey::Report(7)), 2);
    assert_eq!(cache.count_for(&CacheKey::KnowledgeBaseTemplates), 1);
    assert_eq!(
        store
            .calls_matching(|c| matches!(c, RemoteCall::PromoteToTemplate { .. }))
            .len(),
        1
    );
    assert!(!navigator.visits().is_empty());
}
