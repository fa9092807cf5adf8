//! Scripted Site Verification client and console helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use site_verifier::verification::{SiteVerificationOps, VerificationError, WebResource};
use site_verifier::Console;
use std::io::Cursor;
use std::sync::Mutex;

pub const SITE: &str = "https://example.com/";

/// One recorded call against the scripted client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GetToken(String),
    Verify(String),
    Unverify(String),
    UpdateOwners { site_url: String, owners: Vec<String> },
    ListOwnedSites,
}

/// Returns canned answers and records every call in order
pub struct ScriptedSiteVerification {
    pub token: String,
    pub verified: WebResource,
    pub owned_sites: Vec<WebResource>,
    pub unverify_failure: Option<u16>,
    pub undelegation_failure: Option<u16>,
    calls: Mutex<Vec<ApiCall>>,
}

impl ScriptedSiteVerification {
    pub fn new(token: &str, owners: &[&str]) -> Self {
        Self {
            token: token.to_string(),
            verified: resource(SITE, owners),
            owned_sites: Vec::new(),
            unverify_failure: None,
            undelegation_failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_owned_sites(mut self, sites: Vec<WebResource>) -> Self {
        self.owned_sites = sites;
        self
    }

    pub fn failing_unverify(mut self, status: u16) -> Self {
        self.unverify_failure = Some(status);
        self
    }

    /// Fails every owner update after the first one with `status`
    pub fn failing_undelegation(mut self, status: u16) -> Self {
        self.undelegation_failure = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn owner_updates(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::UpdateOwners { owners, .. } => Some(owners),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SiteVerificationOps for ScriptedSiteVerification {
    async fn get_token(&self, site_url: &str) -> Result<String, VerificationError> {
        self.record(ApiCall::GetToken(site_url.to_string()));
        Ok(self.token.clone())
    }

    async fn verify(&self, site_url: &str) -> Result<WebResource, VerificationError> {
        self.record(ApiCall::Verify(site_url.to_string()));
        let mut verified = self.verified.clone();
        verified.site.identifier = site_url.to_string();
        Ok(verified)
    }

    async fn unverify(&self, site_url: &str) -> Result<(), VerificationError> {
        self.record(ApiCall::Unverify(site_url.to_string()));
        match self.unverify_failure {
            Some(status) => Err(VerificationError::from_status(
                status,
                "The verification token is still present on the site".to_string(),
            )),
            None => Ok(()),
        }
    }

    async fn update_owners(&self, site_url: &str, resource: &WebResource) -> Result<(), VerificationError> {
        self.record(ApiCall::UpdateOwners {
            site_url: site_url.to_string(),
            owners: resource.owners.clone(),
        });
        match self.undelegation_failure {
            Some(status) if self.owner_updates().len() > 1 => Err(VerificationError::from_status(
                status,
                "The owner update was rejected".to_string(),
            )),
            _ => Ok(()),
        }
    }

    async fn list_owned_sites(&self) -> Result<Vec<WebResource>, VerificationError> {
        self.record(ApiCall::ListOwnedSites);
        Ok(self.owned_sites.clone())
    }
}

pub fn resource(site_url: &str, owners: &[&str]) -> WebResource {
    let mut resource = WebResource::for_site(site_url);
    resource.id = Some(site_url.replace(':', "%3A").replace('/', "%2F"));
    resource.owners = owners.iter().map(|o| o.to_string()).collect();
    resource
}

pub type ScriptedConsole = Console<Cursor<Vec<u8>>, Vec<u8>, Vec<u8>>;

/// Console fed from `lines`, one operator answer per entry
pub fn scripted_console(lines: &[&str]) -> ScriptedConsole {
    let mut input = lines.join("\n");
    input.push('\n');
    Console::new(Cursor::new(input.into_bytes()), Vec::new(), Vec::new())
}

/// (stdout, stderr) captured by a scripted console
pub fn captured(console: ScriptedConsole) -> (String, String) {
    let (_, out, err) = console.into_parts();
    (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}
