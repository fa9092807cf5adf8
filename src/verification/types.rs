use serde::{Deserialize, Serialize};
use std::fmt;

/// Verification method used for every token and verify request
pub const META_VERIFICATION_METHOD: &str = "meta";

/// Resource type for web sites (as opposed to INET_DOMAIN)
pub const SITE_TYPE: &str = "SITE";

/// Identifies the thing being verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub identifier: String,
    #[serde(rename = "type")]
    pub site_type: String,
}

impl SiteDescriptor {
    pub fn site(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            site_type: SITE_TYPE.to_string(),
        }
    }
}

/// A verified web resource and the principals that own it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub site: SiteDescriptor,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

impl WebResource {
    /// Unverified resource used as the body of a verify request
    pub fn for_site(site_url: &str) -> Self {
        Self {
            id: None,
            site: SiteDescriptor::site(site_url),
            owners: Vec::new(),
        }
    }

    /// Adds an owner unless it is already present. Returns whether the set changed.
    pub fn add_owner(&mut self, email: &str) -> bool {
        if self.has_owner(email) {
            return false;
        }
        self.owners.push(email.to_string());
        true
    }

    /// Removes every occurrence of an owner. Returns whether the set changed.
    pub fn remove_owner(&mut self, email: &str) -> bool {
        let before = self.owners.len();
        self.owners.retain(|owner| owner != email);
        self.owners.len() != before
    }

    pub fn has_owner(&self, email: &str) -> bool {
        self.owners.iter().any(|owner| owner == email)
    }
}

impl fmt::Display for WebResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🌐 {} [{}]", self.site.identifier, self.site.site_type)?;
        if let Some(id) = &self.id {
            writeln!(f, "   id: {id}")?;
        }
        if self.owners.is_empty() {
            write!(f, "   owners: (none reported)")
        } else {
            write!(f, "   owners: {}", self.owners.join(", "))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTokenRequest {
    pub verification_method: String,
    pub site: SiteDescriptor,
}

impl GetTokenRequest {
    pub fn meta_tag_for(site_url: &str) -> Self {
        Self {
            verification_method: META_VERIFICATION_METHOD.to_string(),
            site: SiteDescriptor::site(site_url),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetTokenResponse {
    #[serde(default)]
    pub method: Option<String>,
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebResourceList {
    #[serde(default)]
    pub items: Vec<WebResource>,
}

/// Error envelope returned by Google APIs
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
}
