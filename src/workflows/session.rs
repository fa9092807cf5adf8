use serde::Serialize;

use crate::verification::WebResource;

/// Transient state of one verification run.
///
/// Owned by the workflow machine, which is the only writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub(crate) site_url: String,
    pub(crate) verification_token: Option<String>,
    /// Present only after a successful verify and until a successful unverify
    pub(crate) verified_resource: Option<WebResource>,
    /// Present only after the operator delegated and the update succeeded
    pub(crate) delegated_owner: Option<String>,
}

impl Session {
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn verification_token(&self) -> Option<&str> {
        self.verification_token.as_deref()
    }

    pub fn verified_resource(&self) -> Option<&WebResource> {
        self.verified_resource.as_ref()
    }

    pub fn delegated_owner(&self) -> Option<&str> {
        self.delegated_owner.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.verified_resource.is_some()
    }
}
