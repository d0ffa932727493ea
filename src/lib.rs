// Pentest Findings - Finding Submission and Ordering Core
// This exposes the core components for testing and integration

pub mod cache;
pub mod cli;
pub mod config;
pub mod model;
pub mod ordering;
pub mod owasp;
pub mod remote;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use cache::{Cache, CacheKey, QueryCache};
pub use config::{ApiConfig, AppConfig, CacheConfig, ObservabilityConfig};
pub use model::{
    FindingDraft, KnowledgeBaseTemplate, OwaspCategory, PendingImage, PersistedFinding,
    PersistedImage, Report, RiskLevel,
};
pub use ordering::{sorted_view, FindingOrderCoordinator, MoveDirection, MoveOutcome, OrderError};
pub use owasp::{apply_owasp_autofill, reference_for, OwaspReference};
pub use remote::{HttpRemoteStore, RemoteError, RemoteStore};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{
    FindingSubmissionWorkflow, LogNavigator, Navigator, SubmissionExit, SubmissionState,
    UploadReport, WorkflowError,
};
