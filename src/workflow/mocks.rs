// Recording fakes for tests - no side effects, every remote call logged

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::cache::{Cache, CacheKey};
use crate::model::{FindingDraft, KnowledgeBaseTemplate, PersistedFinding, PersistedImage, Report};
use crate::remote::{RemoteError, RemoteStore};
use crate::workflow::navigator::Navigator;

/// One recorded remote operation, in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    GetReport { report_id: u64 },
    GetFinding { finding_id: u64 },
    CreateFinding { draft: FindingDraft },
    UpdateFinding { finding_id: u64, draft: FindingDraft },
    DeleteFinding { finding_id: u64 },
    UploadImage { finding_id: u64, filename: String },
    DeleteImage { image_id: u64 },
    ReorderFindings { report_id: u64, ordered_ids: Vec<u64> },
    PromoteToTemplate { finding_id: u64 },
}

/// In-memory store that records every call and can be told to fail
/// specific operations or hold a reorder open behind a gate.
#[derive(Default)]
pub struct RecordingRemoteStore {
    calls: Mutex<Vec<RemoteCall>>,
    reports: Mutex<HashMap<u64, Report>>,
    findings: Mutex<HashMap<u64, PersistedFinding>>,
    next_id: AtomicU64,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
    fail_reorder: AtomicBool,
    fail_promotion: AtomicBool,
    failing_uploads: Mutex<HashSet<String>>,
    upload_delay: Mutex<Option<Duration>>,
    uploads_settled: AtomicUsize,
    reorders_started: AtomicUsize,
    reorder_gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingRemoteStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Default::default()
        }
    }

    pub fn add_report(&self, report: Report) {
        for finding in &report.findings {
            self.findings
                .lock()
                .unwrap()
                .insert(finding.id, finding.clone());
        }
        self.reports.lock().unwrap().insert(report.id, report);
    }

    pub fn add_finding(&self, finding: PersistedFinding) {
        self.findings
            .lock()
            .unwrap()
            .insert(finding.id, finding);
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_update(&self) {
        self.fail_update.store(true, Ordering::SeqCst);
    }

    pub fn fail_reorder(&self) {
        self.fail_reorder.store(true, Ordering::SeqCst);
    }

    pub fn fail_promotion(&self) {
        self.fail_promotion.store(true, Ordering::SeqCst);
    }

    pub fn allow_promotion(&self) {
        self.fail_promotion.store(false, Ordering::SeqCst);
    }

    /// Make uploads of this filename settle with a failure.
    pub fn fail_upload(&self, filename: &str) {
        self.failing_uploads
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    /// Delay every upload before it settles, to make settlement ordering
    /// observable.
    pub fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    /// Uploads that have settled (success or failure) so far.
    pub fn uploads_settled(&self) -> usize {
        self.uploads_settled.load(Ordering::SeqCst)
    }

    /// Reorder calls that have been dispatched, including one currently
    /// parked on the gate.
    pub fn reorders_started(&self) -> usize {
        self.reorders_started.load(Ordering::SeqCst)
    }

    /// Park the next reorder call until the returned gate is notified.
    pub fn gate_reorders(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.reorder_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, predicate: impl Fn(&RemoteCall) -> bool) -> Vec<RemoteCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| predicate(call))
            .cloned()
            .collect()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn backend_error(what: &str) -> RemoteError {
        RemoteError::Http {
            status: 500,
            message: format!("{what} failed"),
        }
    }

    fn persist(&self, id: u64, draft: &FindingDraft) -> PersistedFinding {
        PersistedFinding {
            id,
            report_id: draft.report_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            risk_level: draft.risk_level,
            owasp_category: draft.owasp_category,
            affected_area: draft.affected_area.clone(),
            impact: draft.impact.clone(),
            solution: draft.solution.clone(),
            steps_to_reproduce: draft.steps_to_reproduce.clone(),
            request: draft.request.clone(),
            response: draft.response.clone(),
            cvss_score: draft.cvss_score.clone(),
            cwe_id: draft.cwe_id.clone(),
            refs: draft.refs.clone(),
            display_order: None,
            poc_images: Vec::new(),
            created_at: None,
        }
    }
}

#[async_trait]
impl RemoteStore for RecordingRemoteStore {
    async fn get_report(&self, report_id: u64) -> Result<Option<Report>, RemoteError> {
        self.record(RemoteCall::GetReport { report_id });
        Ok(self.reports.lock().unwrap().get(&report_id).cloned())
    }

    async fn get_finding(
        &self,
        finding_id: u64,
    ) -> Result<Option<PersistedFinding>, RemoteError> {
        self.record(RemoteCall::GetFinding { finding_id });
        Ok(self.findings.lock().unwrap().get(&finding_id).cloned())
    }

    async fn create_finding(
        &self,
        draft: &FindingDraft,
    ) -> Result<PersistedFinding, RemoteError> {
        self.record(RemoteCall::CreateFinding {
            draft: draft.clone(),
        });
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::backend_error("create"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let finding = self.persist(id, draft);
        self.findings.lock().unwrap().insert(id, finding.clone());
        Ok(finding)
    }

    async fn update_finding(
        &self,
        finding_id: u64,
        draft: &FindingDraft,
    ) -> Result<PersistedFinding, RemoteError> {
        self.record(RemoteCall::UpdateFinding {
            finding_id,
            draft: draft.clone(),
        });
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Self::backend_error("update"));
        }
        let finding = self.persist(finding_id, draft);
        self.findings
            .lock()
            .unwrap()
            .insert(finding_id, finding.clone());
        Ok(finding)
    }

    async fn delete_finding(&self, finding_id: u64) -> Result<(), RemoteError> {
        self.record(RemoteCall::DeleteFinding { finding_id });
        self.findings.lock().unwrap().remove(&finding_id);
        Ok(())
    }

    async fn upload_finding_image(
        &self,
        finding_id: u64,
        _bytes: Vec<u8>,
        filename: &str,
    ) -> Result<PersistedImage, RemoteError> {
        self.record(RemoteCall::UploadImage {
            finding_id,
            filename: filename.to_string(),
        });
        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let should_fail = self.failing_uploads.lock().unwrap().contains(filename);
        self.uploads_settled.fetch_add(1, Ordering::SeqCst);
        if should_fail {
            return Err(Self::backend_error("upload"));
        }
        Ok(PersistedImage {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            original_filename: filename.to_string(),
            file_path: None,
        })
    }

    async fn delete_image(&self, image_id: u64) -> Result<(), RemoteError> {
        self.record(RemoteCall::DeleteImage { image_id });
        Ok(())
    }

    async fn reorder_findings(
        &self,
        report_id: u64,
        ordered_ids: &[u64],
    ) -> Result<(), RemoteError> {
        self.record(RemoteCall::ReorderFindings {
            report_id,
            ordered_ids: ordered_ids.to_vec(),
        });
        self.reorders_started.fetch_add(1, Ordering::SeqCst);
        let gate = self.reorder_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_reorder.load(Ordering::SeqCst) {
            return Err(Self::backend_error("reorder"));
        }
        // Apply the permutation so a refetch reflects server truth.
        if let Some(report) = self.reports.lock().unwrap().get_mut(&report_id) {
            for (index, finding_id) in ordered_ids.iter().enumerate() {
                if let Some(finding) = report.findings.iter_mut().find(|f| f.id == *finding_id) {
                    finding.display_order = Some(index as i32);
                }
            }
        }
        Ok(())
    }

    async fn promote_to_template(
        &self,
        finding_id: u64,
    ) -> Result<KnowledgeBaseTemplate, RemoteError> {
        self.record(RemoteCall::PromoteToTemplate { finding_id });
        if self.fail_promotion.load(Ordering::SeqCst) {
            return Err(Self::backend_error("promotion"));
        }
        let finding = self.findings.lock().unwrap().get(&finding_id).cloned();
        let finding = finding.ok_or_else(|| RemoteError::Http {
            status: 404,
            message: "finding not found".to_string(),
        })?;
        Ok(KnowledgeBaseTemplate {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: finding.title,
            risk_level: finding.risk_level,
            finding_id: Some(finding_id),
        })
    }
}

/// Finding fixture with only the fields orchestration cares about set.
pub fn sample_finding(id: u64, report_id: u64, display_order: Option<i32>) -> PersistedFinding {
    PersistedFinding {
        id,
        report_id,
        title: format!("finding {id}"),
        description: "description".to_string(),
        risk_level: crate::model::RiskLevel::Medium,
        owasp_category: None,
        affected_area: None,
        impact: None,
        solution: None,
        steps_to_reproduce: None,
        request: None,
        response: None,
        cvss_score: None,
        cwe_id: None,
        refs: None,
        display_order,
        poc_images: Vec::new(),
        created_at: None,
    }
}

/// Report fixture wrapping a set of findings.
pub fn sample_report(id: u64, findings: Vec<PersistedFinding>) -> Report {
    Report {
        id,
        title: format!("report {id}"),
        description: None,
        client_name: None,
        tester_name: None,
        findings,
        created_at: None,
    }
}

/// Cache fake that records invalidations.
#[derive(Debug, Default)]
pub struct RecordingCache {
    invalidations: Mutex<Vec<CacheKey>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidations(&self) -> Vec<CacheKey> {
        self.invalidations.lock().unwrap().clone()
    }

    pub fn count_for(&self, key: &CacheKey) -> usize {
        self.invalidations
            .lock()
            .unwrap()
            .iter()
            .filter(|k| *k == key)
            .count()
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn invalidate(&self, key: &CacheKey) {
        self.invalidations.lock().unwrap().push(*key);
    }
}

/// Navigation target recorded by the fake navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Report(u64),
    ReportList,
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<NavTarget>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<NavTarget> {
        self.visits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn to_report(&self, report_id: u64) {
        self.visits.lock().unwrap().push(NavTarget::Report(report_id));
    }

    async fn to_report_list(&self) {
        self.visits.lock().unwrap().push(NavTarget::ReportList);
    }
}
