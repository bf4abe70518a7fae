//! Credential preflight validation and login-link pre-fetch.
//!
//! Auth is validated before any sandbox hand-off: interactive login flows
//! that bounce through a browser cannot complete from inside an isolated
//! child, so configuration and credential mistakes must surface as actionable
//! errors while the process can still talk to the user directly.
//!
//! Validation is presence-only: an api-key method needs a non-empty key (or a
//! localhost endpoint) and a login method needs a saved-tokens file. Token
//! refresh and decryption belong to the assistant proper, not the bootstrap.

use crate::config::{AuthMethod, Settings};
use crate::error::AuthError;
use std::net::IpAddr;
use std::path::PathBuf;

/// Validate that the configured auth method can actually be used.
///
/// Errors are user-facing strings; the caller prints them and exits without a
/// relaunch.
pub fn validate_auth(settings: &Settings) -> Result<(), String> {
    validate_auth_with(settings, |path| path.exists())
}

/// Seam for tests: the login check takes the saved-tokens probe as a closure.
pub fn validate_auth_with<FExists>(settings: &Settings, tokens_exist: FExists) -> Result<(), String>
where
    FExists: Fn(&std::path::Path) -> bool,
{
    let base_url = validate_base_url(&settings.network.base_url)?;
    match settings.auth.method {
        AuthMethod::ApiKey => validate_api_key(settings, &base_url),
        AuthMethod::Login => validate_login(&tokens_exist),
        // Externally-managed credentials (wrapper scripts, proxies) are the
        // caller's responsibility.
        AuthMethod::External => Ok(()),
    }
}

fn validate_base_url(base_url: &str) -> Result<String, String> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(
            "No API base URL configured. Set network.base_url in quill.toml or QUILL_BASE_URL."
                .to_string(),
        );
    }

    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|err| format!("invalid base_url `{trimmed}`: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(format!(
                "invalid base_url `{trimmed}`: unsupported scheme `{other}` (expected http or https)"
            ));
        }
    }
    if parsed.host_str().is_none() {
        return Err(format!("invalid base_url `{trimmed}`: missing host"));
    }

    Ok(trimmed.to_string())
}

fn validate_api_key(settings: &Settings, base_url: &str) -> Result<(), String> {
    if !settings.auth.api_key.trim().is_empty() {
        return Ok(());
    }

    // Localhost-style endpoints commonly run with auth disabled; allow them
    // without a key, but fail early everywhere else.
    if is_localhost_endpoint(base_url) {
        return Ok(());
    }

    Err(
        "auth.method is `api-key` but no API key is configured. Set `auth.api_key` in quill.toml or QUILL_API_KEY."
            .to_string(),
    )
}

fn validate_login<FExists>(tokens_exist: &FExists) -> Result<(), String>
where
    FExists: Fn(&std::path::Path) -> bool,
{
    let Some(path) = tokens_path() else {
        return Err("could not determine the user config directory for saved logins".to_string());
    };
    if tokens_exist(&path) {
        Ok(())
    } else {
        Err(format!(
            "auth.method is `login`, but no saved login was found at {}. Run `quill login` first.",
            path.display()
        ))
    }
}

/// Location of saved login tokens.
pub fn tokens_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quill").join("tokens.json"))
}

fn is_localhost_endpoint(base_url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(base_url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>()
        .ok()
        .is_some_and(|ip| ip.is_loopback())
}

// ---------------------------------------------------------------------------
// Login-link pre-fetch
// ---------------------------------------------------------------------------

/// Device-login link, pre-fetched at startup for browserless flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginLink {
    pub verification_url: String,
    pub user_code: String,
}

/// Request a device-login link from the auth endpoint.
///
/// Runs during startup task coordination so the link is ready before any
/// interactive UI is constructed.
pub async fn prefetch_login_link(base_url: &str) -> Result<LoginLink, AuthError> {
    let url = format!("{}/device/code", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "client": "quill" }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Status(status.as_u16(), body));
    }

    let body: serde_json::Value = response.json().await?;
    parse_login_link(&body)
}

fn parse_login_link(body: &serde_json::Value) -> Result<LoginLink, AuthError> {
    let verification_url = body
        .get("verification_url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::Malformed("missing verification_url".to_string()))?;
    let user_code = body
        .get("user_code")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::Malformed("missing user_code".to_string()))?;
    Ok(LoginLink {
        verification_url: verification_url.to_string(),
        user_code: user_code.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMethod;

    #[test]
    fn rejects_empty_base_url() {
        let mut settings = Settings::default();
        settings.network.base_url.clear();
        let err = validate_auth(&settings).expect_err("should fail");
        assert!(err.contains("No API base URL"), "err: {err}");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut settings = Settings::default();
        settings.network.base_url = "file:///tmp".to_string();
        let err = validate_auth(&settings).expect_err("should fail");
        assert!(err.contains("unsupported scheme"), "err: {err}");
    }

    #[test]
    fn allows_localhost_without_api_key() {
        let mut settings = Settings::default();
        settings.network.base_url = "http://localhost:11434/v1".to_string();
        settings.auth.method = AuthMethod::ApiKey;
        settings.auth.api_key.clear();
        assert!(validate_auth(&settings).is_ok());
    }

    #[test]
    fn allows_loopback_ip_without_api_key() {
        let mut settings = Settings::default();
        settings.network.base_url = "http://127.0.0.1:8080/v1".to_string();
        settings.auth.api_key.clear();
        assert!(validate_auth(&settings).is_ok());
    }

    #[test]
    fn rejects_remote_endpoint_without_api_key() {
        let mut settings = Settings::default();
        settings.network.base_url = "https://api.example.com/v1".to_string();
        settings.auth.method = AuthMethod::ApiKey;
        settings.auth.api_key.clear();
        let err = validate_auth(&settings).expect_err("should fail");
        assert!(err.contains("no API key"), "err: {err}");
    }

    #[test]
    fn accepts_remote_endpoint_with_api_key() {
        let mut settings = Settings::default();
        settings.network.base_url = "https://api.example.com/v1".to_string();
        settings.auth.method = AuthMethod::ApiKey;
        settings.auth.api_key = "sk-test".to_string();
        assert!(validate_auth(&settings).is_ok());
    }

    #[test]
    fn login_without_saved_tokens_fails() {
        let mut settings = Settings::default();
        settings.network.base_url = "https://api.example.com/v1".to_string();
        settings.auth.method = AuthMethod::Login;
        let err = validate_auth_with(&settings, |_| false).expect_err("should fail");
        assert!(err.contains("quill login"), "err: {err}");
    }

    #[test]
    fn login_with_saved_tokens_succeeds() {
        let mut settings = Settings::default();
        settings.network.base_url = "https://api.example.com/v1".to_string();
        settings.auth.method = AuthMethod::Login;
        assert!(validate_auth_with(&settings, |_| true).is_ok());
    }

    #[test]
    fn external_auth_always_passes() {
        let mut settings = Settings::default();
        settings.network.base_url = "https://api.example.com/v1".to_string();
        settings.auth.method = AuthMethod::External;
        settings.auth.api_key.clear();
        assert!(validate_auth(&settings).is_ok());
    }

    #[test]
    fn parse_login_link_extracts_fields() {
        let body = serde_json::json!({
            "verification_url": "https://quill.dev/device",
            "user_code": "ABCD-1234",
        });
        let link = parse_login_link(&body).expect("should parse");
        assert_eq!(link.verification_url, "https://quill.dev/device");
        assert_eq!(link.user_code, "ABCD-1234");
    }

    #[test]
    fn parse_login_link_rejects_missing_code() {
        let body = serde_json::json!({ "verification_url": "https://quill.dev/device" });
        let err = parse_login_link(&body).expect_err("should fail");
        assert!(err.to_string().contains("user_code"), "err: {err}");
    }
}
