use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;
use crate::verification::errors::VerificationError;
use crate::verification::types::{
    GetTokenRequest, GetTokenResponse, GoogleErrorEnvelope, WebResource, WebResourceList,
    META_VERIFICATION_METHOD,
};

/// Trait for Site Verification operations to enable testing with mocks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SiteVerificationOps: Send + Sync {
    /// Issues a meta-tag verification token for the site
    async fn get_token(&self, site_url: &str) -> Result<String, VerificationError>;
    /// Asks the server to check the meta tag and record ownership
    async fn verify(&self, site_url: &str) -> Result<WebResource, VerificationError>;
    /// Relinquishes ownership. Fails with a bad request while the token is still published.
    async fn unverify(&self, site_url: &str) -> Result<(), VerificationError>;
    /// Replaces the owner set of a verified site with the owners of `resource`
    async fn update_owners(&self, site_url: &str, resource: &WebResource) -> Result<(), VerificationError>;
    async fn list_owned_sites(&self) -> Result<Vec<WebResource>, VerificationError>;
}

/// Site Verification API v1 client over HTTPS
#[derive(Debug, Clone)]
pub struct SiteVerificationClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
    application_name: String,
    pretty_print: bool,
}

impl SiteVerificationClient {
    pub fn new(settings: &ApiConfig, access_token: String) -> Result<Self, VerificationError> {
        let http = reqwest::Client::builder().build()?;
        Self::with_http_client(http, settings, access_token)
    }

    /// Build on an existing transport, e.g. one shared with other clients or pointed at a mock server
    pub fn with_http_client(
        http: reqwest::Client,
        settings: &ApiConfig,
        access_token: String,
    ) -> Result<Self, VerificationError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            VerificationError::Configuration(format!("Invalid API base URL '{}': {e}", settings.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VerificationError::Configuration(format!(
                "API base URL '{}' cannot carry a path",
                settings.base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            access_token,
            application_name: settings.application_name.clone(),
            pretty_print: settings.pretty_print,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, VerificationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                VerificationError::Configuration(format!("API base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, VerificationError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "Preparing Site Verification API request");

        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(USER_AGENT, &self.application_name);
        if self.pretty_print {
            builder = builder.query(&[("prettyPrint", "true")]);
        }
        Ok(builder)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, VerificationError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    trimmed.to_string()
                }
            });

        debug!(status = status.as_u16(), %message, "Site Verification API request failed");
        Err(VerificationError::from_status(status.as_u16(), message))
    }

    async fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, VerificationError> {
        let response = self.execute(builder).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SiteVerificationOps for SiteVerificationClient {
    async fn get_token(&self, site_url: &str) -> Result<String, VerificationError> {
        debug!(site_url, "Requesting verification token");
        let builder = self
            .request(Method::POST, &["token"])?
            .json(&GetTokenRequest::meta_tag_for(site_url));
        let response: GetTokenResponse = self.execute_json(builder).await?;
        debug!(site_url, method = ?response.method, "Verification token issued");
        Ok(response.token)
    }

    async fn verify(&self, site_url: &str) -> Result<WebResource, VerificationError> {
        debug!(site_url, "Requesting ownership verification");
        let builder = self
            .request(Method::POST, &["webResource"])?
            .query(&[("verificationMethod", META_VERIFICATION_METHOD)])
            .json(&WebResource::for_site(site_url));
        self.execute_json(builder).await
    }

    async fn unverify(&self, site_url: &str) -> Result<(), VerificationError> {
        debug!(site_url, "Requesting unverification");
        let builder = self.request(Method::DELETE, &["webResource", site_url])?;
        self.execute(builder).await?;
        Ok(())
    }

    async fn update_owners(&self, site_url: &str, resource: &WebResource) -> Result<(), VerificationError> {
        debug!(site_url, owners = ?resource.owners, "Updating site owners");
        let builder = self
            .request(Method::PUT, &["webResource", site_url])?
            .json(resource);
        let updated: WebResource = self.execute_json(builder).await?;
        debug!(site_url, owners = ?updated.owners, "Site owners updated");
        Ok(())
    }

    async fn list_owned_sites(&self) -> Result<Vec<WebResource>, VerificationError> {
        debug!("Listing owned sites");
        let builder = self.request(Method::GET, &["webResource"])?;
        let list: WebResourceList = self.execute_json(builder).await?;
        Ok(list.items)
    }
}
