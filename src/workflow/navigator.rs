use async_trait::async_trait;
use tracing::info;

/// Navigation seam. The workflow schedules navigation; the host decides
/// what "navigating" means (page change in a UI, a no-op in the CLI).
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn to_report(&self, report_id: u64);
    async fn to_report_list(&self);
}

/// Navigator that only records intent in the log. Used by the CLI, where
/// there is no page to leave.
#[derive(Debug, Default)]
pub struct LogNavigator;

#[async_trait]
impl Navigator for LogNavigator {
    async fn to_report(&self, report_id: u64) {
        info!(report_id, "navigate to report");
    }

    async fn to_report_list(&self) {
        info!("navigate to report list");
    }
}
