pub mod client;
pub mod errors;
pub mod types;

pub use client::{SiteVerificationClient, SiteVerificationOps};
pub use errors::VerificationError;
pub use types::{SiteDescriptor, WebResource, META_VERIFICATION_METHOD, SITE_TYPE};
