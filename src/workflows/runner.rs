use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{info, warn};

use crate::console::Console;
use crate::verification::{SiteVerificationOps, VerificationError, WebResource};
use crate::workflows::session::Session;
use crate::workflows::state_machine::{TransitionError, WorkflowEvent, WorkflowMachine, WorkflowState};

const DISCLAIMER: &str = "This is a sample Rust-based client for the Google Site Verification API.\n\
Your data may be modified as a result of running this demonstration.\n\
We recommend that you run this sample with a test account\n\
to avoid any accidental losses of data. Use at your own risk.\n\n";

const UNVERIFY_REJECTED: &str =
    "Unverification failed, because you have not yet removed your verification tokens from the site.";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Api(#[from] VerificationError),
    #[error("Operator input failed: {0}")]
    Console(#[from] std::io::Error),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl WorkflowError {
    /// Transport, API and operator I/O failures, reported tersely.
    /// Anything else is a defect in the workflow itself.
    pub fn is_io_kind(&self) -> bool {
        matches!(self, WorkflowError::Api(_) | WorkflowError::Console(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Declined,
    Unverified,
    /// The API refused to unverify because the meta tag is still published
    Rejected,
    /// Any other HTTP status during cleanup. Not reported to the operator.
    Failed { status: u16 },
}

#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub session: Session,
    pub sites_listed: usize,
    pub cleanup: CleanupOutcome,
}

/// Drives the verification dialogue: prompts the operator, calls the API and
/// reports each completed step to the [`WorkflowMachine`].
pub struct VerificationWorkflow<C> {
    client: C,
    machine: WorkflowMachine,
}

impl<C: SiteVerificationOps> VerificationWorkflow<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            machine: WorkflowMachine::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn machine(&self) -> &WorkflowMachine {
        &self.machine
    }

    pub fn session(&self) -> &Session {
        self.machine.session()
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.state()
    }

    /// Run the whole dialogue. Any error leaves the machine in the last state it reached.
    pub async fn run<R, W, E>(&mut self, console: &mut Console<R, W, E>) -> Result<WorkflowOutcome, WorkflowError>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        console.say(DISCLAIMER)?;
        self.machine.handle_event(WorkflowEvent::Begin)?;

        let site_url = console.ask("Enter the URL of a site to be verified:")?;
        self.issue_token(console, site_url).await?;
        console.wait_for_enter()?;
        self.verify_ownership(console).await?;
        self.offer_delegation(console).await?;
        let sites_listed = self.list_sites(console).await?;
        let cleanup = self.offer_cleanup(console).await?;

        info!(cleanup = ?cleanup, "Verification workflow complete");
        Ok(WorkflowOutcome {
            session: self.machine.session().clone(),
            sites_listed,
            cleanup,
        })
    }

    async fn issue_token<R: BufRead, W: Write, E: Write>(
        &mut self,
        console: &mut Console<R, W, E>,
        site_url: String,
    ) -> Result<(), WorkflowError> {
        info!(site_url = %site_url, "Requesting meta tag verification token");
        let token = self.client.get_token(&site_url).await?;
        self.machine.handle_event(WorkflowEvent::TokenIssued {
            site_url,
            token: token.clone(),
        })?;

        console.say(&format!(
            "Place this META tag on your site:\n\t{token}\nWhen you are finished, press ENTER to proceed with verification."
        ))?;
        self.machine.handle_event(WorkflowEvent::TokenPresented)?;
        Ok(())
    }

    async fn verify_ownership<R: BufRead, W: Write, E: Write>(
        &mut self,
        console: &mut Console<R, W, E>,
    ) -> Result<(), WorkflowError> {
        let site_url = self.machine.session().site_url().to_string();
        info!(site_url = %site_url, "Verifying site ownership");

        let resource = self.client.verify(&site_url).await?;
        self.machine.handle_event(WorkflowEvent::OwnershipVerified { resource })?;
        console.say("✅ Verification successful.")?;
        Ok(())
    }

    async fn offer_delegation<R: BufRead, W: Write, E: Write>(
        &mut self,
        console: &mut Console<R, W, E>,
    ) -> Result<(), WorkflowError> {
        self.machine.handle_event(WorkflowEvent::DelegationOffered)?;
        let delegate = console.confirm(
            "Congratulations, you're now a verified owner of this site!\n\
             Do you also want to delegate ownership to another individual? (y/n)",
        )?;
        if !delegate {
            return Ok(());
        }

        let owner = console.ask("Enter the email address of a new co-owner: ")?;
        let site_url = self.machine.session().site_url().to_string();
        let mut resource = self.verified_resource()?;
        if !resource.add_owner(&owner) {
            // Nothing to undo later, so no delegation is recorded
            info!(site_url = %site_url, owner = %owner, "Owner already listed, skipping delegation");
            console.say(&format!("{owner} is already an owner of this site. Nothing to delegate."))?;
            return Ok(());
        }

        info!(site_url = %site_url, owner = %owner, "Delegating site ownership");
        self.client.update_owners(&site_url, &resource).await?;
        self.machine.handle_event(WorkflowEvent::OwnerDelegated { owner, resource })?;
        console.say("Delegation successful.")?;
        Ok(())
    }

    async fn list_sites<R: BufRead, W: Write, E: Write>(
        &mut self,
        console: &mut Console<R, W, E>,
    ) -> Result<usize, WorkflowError> {
        console.say("\n\nHere are all of the sites you own:")?;
        let sites = self.client.list_owned_sites().await?;

        if sites.is_empty() {
            console.say("You do not have any verified sites yet!")?;
        } else {
            for site in &sites {
                console.say(&site.to_string())?;
            }
        }

        self.machine.handle_event(WorkflowEvent::SitesListed { count: sites.len() })?;
        Ok(sites.len())
    }

    async fn offer_cleanup<R: BufRead, W: Write, E: Write>(
        &mut self,
        console: &mut Console<R, W, E>,
    ) -> Result<CleanupOutcome, WorkflowError> {
        self.machine.handle_event(WorkflowEvent::CleanupOffered)?;
        let cleanup = console.confirm(
            "\n\nLet's clean up. Do you want to unverify the site that you have just verified? (y/n)\n\
             Remember that you will need to remove your token prior to unverification.",
        )?;
        if !cleanup {
            self.machine.handle_event(WorkflowEvent::CleanupDeclined)?;
            return Ok(CleanupOutcome::Declined);
        }

        // Undelegation and unverify share one handler: any API status ends the run normally
        match self.undelegate_and_unverify(console).await {
            Ok(()) => {
                self.machine.handle_event(WorkflowEvent::Finished)?;
                Ok(CleanupOutcome::Unverified)
            }
            Err(WorkflowError::Api(VerificationError::BadRequest { message })) => {
                warn!(reason = %message, "Site Verification API rejected cleanup");
                console.say("failed.")?;
                console.warn(UNVERIFY_REJECTED)?;
                self.machine
                    .handle_event(WorkflowEvent::CleanupRejected { reason: message })?;
                Ok(CleanupOutcome::Rejected)
            }
            Err(WorkflowError::Api(VerificationError::Api { status, message })) => {
                info!(status, reason = %message, "Cleanup failed, leaving the site as it is");
                self.machine.handle_event(WorkflowEvent::CleanupRejected {
                    reason: format!("HTTP {status}: {message}"),
                })?;
                Ok(CleanupOutcome::Failed { status })
            }
            Err(e) => Err(e),
        }
    }

    async fn undelegate_and_unverify<R: BufRead, W: Write, E: Write>(
        &mut self,
        console: &mut Console<R, W, E>,
    ) -> Result<(), WorkflowError> {
        let site_url = self.machine.session().site_url().to_string();

        if let Some(owner) = self.machine.session().delegated_owner().map(str::to_string) {
            console.progress("Undelegating co-owner prior to unverifying yourself... ")?;
            let mut resource = self.verified_resource()?;
            resource.remove_owner(&owner);

            info!(site_url = %site_url, owner = %owner, "Removing delegated owner");
            self.client.update_owners(&site_url, &resource).await?;
            self.machine.handle_event(WorkflowEvent::OwnerUndelegated { resource })?;
            console.say("done.")?;
        }

        console.progress("Unverifying your site... ")?;
        info!(site_url = %site_url, "Unverifying site");
        self.client.unverify(&site_url).await?;
        self.machine.handle_event(WorkflowEvent::SiteUnverified)?;
        console.say("done.")?;
        Ok(())
    }

    fn verified_resource(&self) -> Result<WebResource, WorkflowError> {
        self.machine.session().verified_resource().cloned().ok_or_else(|| {
            TransitionError::GuardFailed {
                state: self.machine.state(),
                reason: "no verified resource in session".to_string(),
            }
            .into()
        })
    }
}
