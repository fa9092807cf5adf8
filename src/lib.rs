// site-verifier - Google Site Verification API walkthrough
// This exposes the core components for testing and integration

pub mod config;
pub mod console;
pub mod telemetry;
pub mod verification;
pub mod workflows;

// Re-export key types for easy access
pub use config::{ApiConfig, ObservabilityConfig, SiteVerifierConfig};
pub use console::{is_affirmative, Console};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use verification::{SiteVerificationClient, SiteVerificationOps, VerificationError, WebResource};
pub use workflows::{
    CleanupOutcome, Session, VerificationWorkflow, WorkflowError, WorkflowEvent, WorkflowMachine, WorkflowOutcome,
    WorkflowState,
};
