// Finding reorder protocol - whole-list position commits, one round-trip
// per move, at most one reorder in flight per report.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::{Cache, CacheKey};
use crate::model::{PersistedFinding, Report};
use crate::remote::{RemoteError, RemoteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Result of a move request that did not fail remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The permutation was committed; this is the exact order submitted.
    Committed { ordered_ids: Vec<u64> },
    /// The finding is already first (up) or last (down); no remote call.
    AtBoundary,
    /// A reorder for this report is still in flight; the request is
    /// rejected, not queued.
    Busy,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("report {0} not found")]
    ReportNotFound(u64),
    #[error("finding {finding_id} is not part of report {report_id}")]
    UnknownFinding { report_id: u64, finding_id: u64 },
    /// The reorder call failed; the previously rendered order stands and
    /// the view re-derives from the last successful fetch.
    #[error("failed to reorder findings")]
    Remote(#[source] RemoteError),
}

/// Presents findings in ascending display order and commits single-step
/// moves as whole-list position arrays.
///
/// Each move fetches the report fresh rather than holding a shared mutable
/// list, so a move never acts on ordering staled by an edit elsewhere.
pub struct FindingOrderCoordinator {
    store: Arc<dyn RemoteStore>,
    cache: Arc<dyn Cache>,
    report_id: u64,
    reorder_guard: Mutex<()>,
}

/// Stable ascending sort by display order; ties keep the collection order
/// the backend returned.
pub fn sorted_view(report: &Report) -> Vec<PersistedFinding> {
    let mut findings = report.findings.clone();
    findings.sort_by_key(PersistedFinding::order_key);
    findings
}

impl FindingOrderCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>, cache: Arc<dyn Cache>, report_id: u64) -> Self {
        Self {
            store,
            cache,
            report_id,
            reorder_guard: Mutex::new(()),
        }
    }

    pub fn report_id(&self) -> u64 {
        self.report_id
    }

    /// Move one finding a single position up or down and commit the
    /// resulting complete order. At most one reorder per report is in
    /// flight; concurrent requests return `Busy` without touching the
    /// store.
    pub async fn move_finding(
        &self,
        finding_id: u64,
        direction: MoveDirection,
    ) -> Result<MoveOutcome, OrderError> {
        let _guard = match self.reorder_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                info!(
                    report_id = self.report_id,
                    finding_id, "reorder already in flight, move rejected"
                );
                return Ok(MoveOutcome::Busy);
            }
        };

        let report = self
            .store
            .get_report(self.report_id)
            .await
            .map_err(OrderError::Remote)?
            .ok_or(OrderError::ReportNotFound(self.report_id))?;

        let view = sorted_view(&report);
        let current_index = view
            .iter()
            .position(|f| f.id == finding_id)
            .ok_or(OrderError::UnknownFinding {
                report_id: self.report_id,
                finding_id,
            })?;

        let at_boundary = match direction {
            MoveDirection::Up => current_index == 0,
            MoveDirection::Down => current_index == view.len() - 1,
        };
        if at_boundary {
            return Ok(MoveOutcome::AtBoundary);
        }

        let new_index = match direction {
            MoveDirection::Up => current_index - 1,
            MoveDirection::Down => current_index + 1,
        };
        let mut ordered_ids: Vec<u64> = view.iter().map(|f| f.id).collect();
        let moved = ordered_ids.remove(current_index);
        ordered_ids.insert(new_index, moved);

        if let Err(err) = self
            .store
            .reorder_findings(self.report_id, &ordered_ids)
            .await
        {
            warn!(
                report_id = self.report_id,
                finding_id,
                error = %err,
                "reorder failed, keeping last fetched order"
            );
            return Err(OrderError::Remote(err));
        }

        // The next render must reflect server truth, not the local
        // permutation.
        self.cache.invalidate(&CacheKey::Report(self.report_id)).await;
        info!(
            report_id = self.report_id,
            finding_id,
            ?ordered_ids,
            "findings reordered"
        );
        Ok(MoveOutcome::Committed { ordered_ids })
    }
}
