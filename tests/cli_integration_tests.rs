//! End-to-end CLI integration tests
//!
//! These tests use assert_cmd to drive the site-verifier binary against a
//! wiremock stand-in for the Site Verification API, feeding operator answers
//! through stdin.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "https://example.com/";
const TOKEN: &str = "<meta name=\"google-site-verification\" content=\"abc123\" />";

/// Helper for running the binary in an isolated directory against a mock API
struct CliTestEnvironment {
    temp_dir: TempDir,
    server: MockServer,
}

impl CliTestEnvironment {
    async fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            server: MockServer::start().await,
        }
    }

    fn base_url(&self) -> String {
        format!("{}/siteVerification/v1", self.server.uri())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("site-verifier").unwrap();
        cmd.current_dir(self.temp_dir.path())
            .env("GOOGLE_OAUTH_ACCESS_TOKEN", "mock-token")
            .env("SITE_VERIFIER_API__GCLOUD_FALLBACK", "false")
            .env_remove("SITE_VERIFIER_API__ACCESS_TOKEN")
            .env_remove("RUST_LOG")
            .arg("--api-base-url")
            .arg(self.base_url());
        cmd
    }

    fn resource(owners: &[&str]) -> serde_json::Value {
        json!({
            "id": "https%3A%2F%2Fexample.com%2F",
            "site": {"identifier": SITE, "type": "SITE"},
            "owners": owners
        })
    }

    async fn mount_happy_path(&self) {
        Mock::given(method("POST"))
            .and(path("/siteVerification/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"method": "META", "token": TOKEN})))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path("/siteVerification/v1/webResource"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::resource(&["a@example.com"])))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/siteVerification/v1/webResource"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"items": [Self::resource(&["a@example.com"])]})),
            )
            .mount(&self.server)
            .await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_declining_everything_succeeds_and_shows_token() {
    let env = CliTestEnvironment::new().await;
    env.mount_happy_path().await;

    env.command()
        .write_stdin(format!("{SITE}\n\nn\nn\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Place this META tag on your site:"))
        .stdout(predicate::str::contains(TOKEN))
        .stdout(predicate::str::contains("Here are all of the sites you own:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_unverify_after_delegation_still_succeeds() {
    let env = CliTestEnvironment::new().await;
    env.mount_happy_path().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/siteVerification/v1/webResource/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(CliTestEnvironment::resource(&["a@example.com"])))
        .expect(2)
        .mount(&env.server)
        .await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"^/siteVerification/v1/webResource/.+$"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Verification token still present"}
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    env.command()
        .write_stdin(format!("{SITE}\n\ny\nb@example.com\ny\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Delegation successful."))
        .stdout(predicate::str::contains("Undelegating co-owner prior to unverifying yourself... done."))
        .stdout(predicate::str::contains("Unverifying your site... failed."))
        .stderr(predicate::str::contains(
            "you have not yet removed your verification tokens from the site",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unverify_not_found_still_succeeds_quietly() {
    let env = CliTestEnvironment::new().await;
    env.mount_happy_path().await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"^/siteVerification/v1/webResource/.+$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Not Found"}
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    env.command()
        .write_stdin(format!("{SITE}\n\nn\ny\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Unverifying your site... "))
        .stdout(predicate::str::contains("failed.").not())
        .stderr(predicate::str::contains("you have not yet removed").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_env_file_settings_apply_and_are_logged() {
    let env = CliTestEnvironment::new().await;
    env.mount_happy_path().await;
    std::fs::write(
        env.temp_dir.path().join(".env"),
        "SITE_VERIFIER_OBSERVABILITY__LOG_LEVEL=info\n",
    )
    .unwrap();

    env.command()
        .env_remove("SITE_VERIFIER_OBSERVABILITY__LOG_LEVEL")
        .write_stdin(format!("{SITE}\n\nn\nn\n"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded environment variables from .env file"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_access_token_fails_before_any_prompt() {
    let env = CliTestEnvironment::new().await;

    env.command()
        .env_remove("GOOGLE_OAUTH_ACCESS_TOKEN")
        .write_stdin(format!("{SITE}\n"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter the URL").not())
        .stderr(predicate::str::contains("No OAuth access token found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_request_failure_exits_nonzero() {
    let env = CliTestEnvironment::new().await;

    Mock::given(method("POST"))
        .and(path("/siteVerification/v1/token"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "Backend Error"}
        })))
        .mount(&env.server)
        .await;

    env.command()
        .write_stdin(format!("{SITE}\n"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500: Backend Error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_closed_stdin_exits_nonzero() {
    let env = CliTestEnvironment::new().await;

    env.command()
        .write_stdin("")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter the URL of a site to be verified:"))
        .stderr(predicate::str::contains("operator input closed"));
}

#[test]
fn test_help_describes_the_walkthrough() {
    Command::cargo_bin("site-verifier")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--access-token"))
        .stdout(predicate::str::contains("--api-base-url"));
}
