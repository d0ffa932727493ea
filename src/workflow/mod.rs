// Finding submission workflow - validation, create/update, concurrent
// evidence uploads, and the promotion decision, driven as a small
// client-side state machine over the remote store.

pub mod mocks;
pub mod navigator;
pub mod state_machine;
pub mod submission;


pub use navigator::{LogNavigator, Navigator};
pub use state_machine::{SubmissionExit, SubmissionState, UploadReport};
pub use submission::{FindingSubmissionWorkflow, WorkflowError};
