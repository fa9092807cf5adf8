// Site verification workflow: pure state machine, session state and the interactive driver

pub mod runner;
pub mod session;
pub mod state_machine;

pub use runner::{CleanupOutcome, VerificationWorkflow, WorkflowError, WorkflowOutcome};
pub use session::Session;
pub use state_machine::{StateTransitionRecord, TransitionError, WorkflowEvent, WorkflowMachine, WorkflowState};
