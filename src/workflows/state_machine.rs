// Verification workflow state machine
// Pure transitions only: the driver performs prompts and API calls, then reports them here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::verification::WebResource;
use crate::workflows::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkflowState {
    Start,
    AwaitingSiteUrl,
    TokenIssued,
    AwaitingUserPlacement,
    Verified,
    DelegationOffered,
    Delegated,
    Listed,
    UnverifyOffered,
    Undelegated,
    Unverified,
    Done,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Start => "start",
            WorkflowState::AwaitingSiteUrl => "awaiting-site-url",
            WorkflowState::TokenIssued => "token-issued",
            WorkflowState::AwaitingUserPlacement => "awaiting-user-placement",
            WorkflowState::Verified => "verified",
            WorkflowState::DelegationOffered => "delegation-offered",
            WorkflowState::Delegated => "delegated",
            WorkflowState::Listed => "listed",
            WorkflowState::UnverifyOffered => "unverify-offered",
            WorkflowState::Undelegated => "undelegated",
            WorkflowState::Unverified => "unverified",
            WorkflowState::Done => "done",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completed steps reported by the workflow driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Begin,
    TokenIssued { site_url: String, token: String },
    TokenPresented,
    OwnershipVerified { resource: WebResource },
    DelegationOffered,
    OwnerDelegated { owner: String, resource: WebResource },
    SitesListed { count: usize },
    CleanupOffered,
    CleanupDeclined,
    OwnerUndelegated { resource: WebResource },
    SiteUnverified,
    CleanupRejected { reason: String },
    Finished,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Begin => "begin",
            WorkflowEvent::TokenIssued { .. } => "token-issued",
            WorkflowEvent::TokenPresented => "token-presented",
            WorkflowEvent::OwnershipVerified { .. } => "ownership-verified",
            WorkflowEvent::DelegationOffered => "delegation-offered",
            WorkflowEvent::OwnerDelegated { .. } => "owner-delegated",
            WorkflowEvent::SitesListed { .. } => "sites-listed",
            WorkflowEvent::CleanupOffered => "cleanup-offered",
            WorkflowEvent::CleanupDeclined => "cleanup-declined",
            WorkflowEvent::OwnerUndelegated { .. } => "owner-undelegated",
            WorkflowEvent::SiteUnverified => "site-unverified",
            WorkflowEvent::CleanupRejected { .. } => "cleanup-rejected",
            WorkflowEvent::Finished => "finished",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition: event '{event}' not allowed in state '{state}'")]
    InvalidTransition { state: WorkflowState, event: &'static str },
    #[error("Guard failed in state '{state}': {reason}")]
    GuardFailed { state: WorkflowState, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StateTransitionRecord {
    pub from_state: WorkflowState,
    pub to_state: WorkflowState,
    pub event: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Verification workflow machine: current state, session and audit trail
#[derive(Debug)]
pub struct WorkflowMachine {
    state: WorkflowState,
    session: Session,
    history: Vec<StateTransitionRecord>,
}

impl Default for WorkflowMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowMachine {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Start,
            session: Session::default(),
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn history(&self) -> &[StateTransitionRecord] {
        &self.history
    }

    /// Apply an event. Rejected events leave state and session untouched.
    pub fn handle_event(&mut self, event: WorkflowEvent) -> Result<WorkflowState, TransitionError> {
        use WorkflowEvent as E;
        use WorkflowState as S;

        let from = self.state;
        let event_name = event.name();

        let to = match (from, event) {
            (S::Start, E::Begin) => S::AwaitingSiteUrl,

            (S::AwaitingSiteUrl, E::TokenIssued { site_url, token }) => {
                self.session.site_url = site_url;
                self.session.verification_token = Some(token);
                S::TokenIssued
            }

            (S::TokenIssued, E::TokenPresented) => S::AwaitingUserPlacement,

            (S::AwaitingUserPlacement, E::OwnershipVerified { resource }) => {
                self.session.verified_resource = Some(resource);
                S::Verified
            }

            (S::Verified, E::DelegationOffered) => S::DelegationOffered,

            (S::DelegationOffered, E::OwnerDelegated { owner, resource }) => {
                if self
                    .session
                    .verified_resource
                    .as_ref()
                    .is_some_and(|current| current.has_owner(&owner))
                {
                    return Err(self.guard_failed(format!("{owner} was already an owner")));
                }
                if !resource.has_owner(&owner) {
                    return Err(self.guard_failed(format!(
                        "updated resource does not list delegated owner {owner}"
                    )));
                }
                self.session.verified_resource = Some(resource);
                self.session.delegated_owner = Some(owner);
                S::Delegated
            }

            (S::DelegationOffered | S::Delegated, E::SitesListed { count }) => {
                info!(count, "Owned sites listed");
                S::Listed
            }

            (S::Listed, E::CleanupOffered) => S::UnverifyOffered,

            (S::UnverifyOffered, E::CleanupDeclined) => S::Done,

            (S::UnverifyOffered, E::OwnerUndelegated { resource }) => {
                let Some(owner) = self.session.delegated_owner.as_deref() else {
                    return Err(self.guard_failed("no delegated owner to remove".to_string()));
                };
                if resource.has_owner(owner) {
                    return Err(self.guard_failed(format!(
                        "updated resource still lists delegated owner {owner}"
                    )));
                }
                self.session.verified_resource = Some(resource);
                S::Undelegated
            }

            (S::UnverifyOffered | S::Undelegated, E::SiteUnverified) => {
                if from == S::UnverifyOffered && self.session.delegated_owner.is_some() {
                    return Err(self.guard_failed(
                        "delegated owner must be removed before unverifying".to_string(),
                    ));
                }
                self.session.verified_resource = None;
                S::Unverified
            }

            (S::UnverifyOffered | S::Undelegated, E::CleanupRejected { reason }) => {
                info!(%reason, "Cleanup rejected by the API");
                S::Done
            }

            (S::Unverified, E::Finished) => S::Done,

            (state, event) => {
                return Err(TransitionError::InvalidTransition {
                    state,
                    event: event.name(),
                })
            }
        };

        self.record_transition(from, to, event_name);
        Ok(to)
    }

    fn guard_failed(&self, reason: String) -> TransitionError {
        TransitionError::GuardFailed {
            state: self.state,
            reason,
        }
    }

    fn record_transition(&mut self, from: WorkflowState, to: WorkflowState, event: &'static str) {
        let record = StateTransitionRecord {
            from_state: from,
            to_state: to,
            event,
            timestamp: Utc::now(),
        };

        info!(
            from_state = %record.from_state,
            to_state = %record.to_state,
            event = record.event,
            "Verification workflow state transition"
        );

        self.history.push(record);
        self.state = to;
    }
}
