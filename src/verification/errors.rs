use reqwest::Error as ReqwestError;

#[derive(Debug)]
pub enum VerificationError {
    TokenNotFound(String),
    Configuration(String),
    /// HTTP 400. On unverify this means the meta tag is still on the site.
    BadRequest {
        message: String,
    },
    Api {
        status: u16,
        message: String,
    },
    Http(ReqwestError),
    Decode(String),
}

impl VerificationError {
    pub fn is_bad_request(&self) -> bool {
        matches!(self, VerificationError::BadRequest { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            VerificationError::BadRequest { .. } => Some(400),
            VerificationError::Api { status, .. } => Some(*status),
            VerificationError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Maps a non-success status and its message onto the error kinds callers branch on.
    pub fn from_status(status: u16, message: String) -> Self {
        if status == 400 {
            VerificationError::BadRequest { message }
        } else {
            VerificationError::Api { status, message }
        }
    }
}

impl From<ReqwestError> for VerificationError {
    fn from(err: ReqwestError) -> Self {
        if err.is_decode() {
            VerificationError::Decode(err.to_string())
        } else {
            VerificationError::Http(err)
        }
    }
}

impl From<serde_json::Error> for VerificationError {
    fn from(err: serde_json::Error) -> Self {
        VerificationError::Decode(err.to_string())
    }
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationError::TokenNotFound(msg) => {
                writeln!(f, "Google Authentication Error")?;
                writeln!(f, "──────────────────────────")?;
                write!(f, "🔑 {msg}\n\n")?;
                writeln!(f, "🔧 QUICK FIXES:")?;
                writeln!(f, "   → Use the Cloud SDK: gcloud auth login")?;
                writeln!(
                    f,
                    "   → Set a token directly: export GOOGLE_OAUTH_ACCESS_TOKEN=\"$(gcloud auth print-access-token)\""
                )?;
                write!(
                    f,
                    "     (needs the https://www.googleapis.com/auth/siteverification scope)"
                )
            }
            VerificationError::Configuration(msg) => {
                writeln!(f, "Site Verification Configuration Error")?;
                writeln!(f, "─────────────────────────────────────")?;
                write!(f, "📂 {msg}\n\n")?;
                writeln!(f, "🔧 QUICK FIXES:")?;
                writeln!(f, "   → Check api.base_url in site-verifier.toml")?;
                write!(f, "   → Or override it: export SITE_VERIFIER_API__BASE_URL=https://www.googleapis.com/siteVerification/v1")
            }
            VerificationError::BadRequest { message } => {
                writeln!(f, "Site Verification API Error")?;
                writeln!(f, "───────────────────────────")?;
                write!(f, "🌐 HTTP 400: {message}")
            }
            VerificationError::Api { status, message } => {
                writeln!(f, "Site Verification API Error")?;
                writeln!(f, "───────────────────────────")?;
                writeln!(f, "🌐 HTTP {status}: {message}")?;
                writeln!(f)?;

                match status {
                    401 => {
                        writeln!(f, "🔧 AUTHENTICATION FAILED:")?;
                        writeln!(f, "   → Access token is invalid or expired")?;
                        write!(f, "   → Refresh it: export GOOGLE_OAUTH_ACCESS_TOKEN=\"$(gcloud auth print-access-token)\"")
                    }
                    403 => {
                        writeln!(f, "🔧 PERMISSION DENIED:")?;
                        writeln!(f, "   → Token lacks the siteverification scope")?;
                        write!(f, "   → Or the Site Verification API is not enabled for this project")
                    }
                    404 => {
                        writeln!(f, "🔧 RESOURCE NOT FOUND:")?;
                        writeln!(f, "   → The site is not verified for this account")?;
                        write!(f, "   → Check the exact URL, including scheme and trailing slash")
                    }
                    _ => {
                        writeln!(f, "🔧 TROUBLESHOOTING:")?;
                        writeln!(f, "   → Check authentication: gcloud auth list")?;
                        write!(f, "   → Check service status: https://status.cloud.google.com")
                    }
                }
            }
            VerificationError::Http(err) => {
                writeln!(f, "Site Verification Network Error")?;
                writeln!(f, "───────────────────────────────")?;
                write!(f, "🌐 {err}\n\n")?;
                writeln!(f, "🔧 LOCAL TROUBLESHOOTING:")?;
                writeln!(f, "   → Check internet connectivity: ping 8.8.8.8")?;
                writeln!(f, "   → Verify DNS resolution: nslookup www.googleapis.com")?;
                write!(f, "   → Check proxy settings: HTTPS_PROXY")
            }
            VerificationError::Decode(msg) => {
                writeln!(f, "Site Verification Response Error")?;
                writeln!(f, "────────────────────────────────")?;
                write!(f, "📄 Could not decode API response: {msg}")
            }
        }
    }
}

impl std::error::Error for VerificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerificationError::Http(err) => Some(err),
            _ => None,
        }
    }
}
