//! Settings loading from TOML files and environment variables.
//!
//! Settings are loaded in this order of precedence (highest wins):
//! 1. Environment variables (`QUILL_API_KEY`, `QUILL_BASE_URL`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./quill.toml in the current directory
//! 4. $XDG_CONFIG_HOME/quill/quill.toml (or ~/.config/quill/quill.toml)
//! 5. Built-in defaults
//!
//! The resulting [`Settings`] value is a read-only snapshot: it is resolved
//! once per process instance and never mutated after bootstrap hands it to the
//! execution paths.

use crate::error::SettingsError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod env;

pub use env::EnvMarkers;

/// Default DNS resolution order applied when the setting is absent or invalid.
pub const DEFAULT_DNS_RESOLUTION_ORDER: &str = "ipv4first";

const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_UPDATE_CHECK_URL: &str = "https://quill.dev/api/latest-version";
const DEFAULT_SANDBOX_ENGINE: &str = "docker";

// ---------------------------------------------------------------------------
// Resolved settings
// ---------------------------------------------------------------------------

/// Merged, read-only configuration snapshot for one process instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub auth: AuthSettings,
    pub sandbox: SandboxSettings,
    pub memory: MemorySettings,
    pub network: NetworkSettings,
    /// Extra diagnostics and developer-facing surfacing.
    pub debug: bool,
}

/// Selected authentication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Static API key, from settings or `QUILL_API_KEY`.
    ApiKey,
    /// Saved login credentials obtained through a browser/device flow.
    Login,
    /// Delegated to an external credential helper; never validated here.
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    pub method: AuthMethod,
    pub api_key: String,
    /// Suppress browser auto-launch for login flows; forces the one-shot
    /// credential pre-fetch so the login link can be printed instead.
    pub no_browser: bool,
}

/// Sandbox isolation flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxKind {
    /// Run the child inside a container image.
    Container,
    /// Re-exec the current binary under an OS sandbox profile.
    Profile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SandboxSettings {
    pub enabled: bool,
    pub kind: SandboxKind,
    pub engine: String,
    pub image: String,
    pub profile: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemorySettings {
    /// Allow the bootstrap to relaunch with a larger heap ceiling.
    pub auto_configure: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub base_url: String,
    pub model: String,
    /// Validated DNS resolution order: `ipv4first` or `verbatim`.
    pub dns_resolution_order: String,
    pub update_check_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auth: AuthSettings {
                method: AuthMethod::ApiKey,
                api_key: String::new(),
                no_browser: false,
            },
            sandbox: SandboxSettings {
                enabled: false,
                kind: SandboxKind::Container,
                engine: DEFAULT_SANDBOX_ENGINE.to_string(),
                image: String::new(),
                profile: String::new(),
            },
            memory: MemorySettings {
                auto_configure: true,
            },
            network: NetworkSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                dns_resolution_order: DEFAULT_DNS_RESOLUTION_ORDER.to_string(),
                update_check_url: DEFAULT_UPDATE_CHECK_URL.to_string(),
            },
            debug: false,
        }
    }
}

/// Settings plus warnings collected while resolving them.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    pub settings: Settings,
    /// User-facing warnings (validated-and-defaulted values, legacy sources).
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    auth: Option<FileAuth>,
    sandbox: Option<FileSandbox>,
    memory: Option<FileMemory>,
    network: Option<FileNetwork>,
    debug: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileAuth {
    method: Option<AuthMethod>,
    api_key: Option<String>,
    no_browser: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSandbox {
    enabled: Option<bool>,
    kind: Option<SandboxKind>,
    engine: Option<String>,
    image: Option<String>,
    profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileMemory {
    auto_configure: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileNetwork {
    base_url: Option<String>,
    model: Option<String>,
    dns_resolution_order: Option<String>,
    update_check_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load settings from disk and environment.
///
/// `path_override` is an explicit config file path (from the --config flag).
pub fn load_settings(path_override: Option<&str>) -> Result<LoadedSettings, SettingsError> {
    load_settings_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

fn load_settings_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedSettings, SettingsError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let config_text = read_settings_text(path_override, &read_file, &config_root)?;
    let parsed: FileConfig = match config_text {
        Some(text) => toml::from_str(&text)?,
        None => FileConfig::default(),
    };
    Ok(resolve_settings(parsed, &env_lookup))
}

fn read_settings_text<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<Option<String>, SettingsError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    // An explicit --config path must exist; implicit locations may not.
    if let Some(path) = path_override {
        let text = read_file(Path::new(path)).map_err(|e| {
            SettingsError::Invalid(format!("failed to read config file `{path}`: {e}"))
        })?;
        return Ok(Some(text));
    }

    let local = Path::new("quill.toml");
    if let Ok(text) = read_file(local) {
        return Ok(Some(text));
    }

    if let Some(root) = config_root() {
        let global = root.join("quill").join("quill.toml");
        if let Ok(text) = read_file(&global) {
            return Ok(Some(text));
        }
    }

    Ok(None)
}

/// Root directory holding the global `quill/` config folder.
pub fn config_root_dir() -> Option<PathBuf> {
    dirs::config_dir()
}

fn resolve_settings<FEnv>(file: FileConfig, env_lookup: &FEnv) -> LoadedSettings
where
    FEnv: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();
    let defaults = Settings::default();

    let auth = file.auth.unwrap_or_default();
    let sandbox = file.sandbox.unwrap_or_default();
    let memory = file.memory.unwrap_or_default();
    let network = file.network.unwrap_or_default();

    let dns_resolution_order =
        validate_dns_resolution_order(network.dns_resolution_order.as_deref(), &mut warnings);

    let mut settings = Settings {
        auth: AuthSettings {
            method: auth.method.unwrap_or(defaults.auth.method),
            api_key: auth.api_key.unwrap_or_default(),
            no_browser: auth.no_browser.unwrap_or(false),
        },
        sandbox: SandboxSettings {
            enabled: sandbox.enabled.unwrap_or(false),
            kind: sandbox.kind.unwrap_or(defaults.sandbox.kind),
            engine: sandbox.engine.unwrap_or(defaults.sandbox.engine),
            image: sandbox.image.unwrap_or_default(),
            profile: sandbox.profile.unwrap_or_default(),
        },
        memory: MemorySettings {
            auto_configure: memory.auto_configure.unwrap_or(true),
        },
        network: NetworkSettings {
            base_url: network.base_url.unwrap_or(defaults.network.base_url),
            model: network.model.unwrap_or(defaults.network.model),
            dns_resolution_order,
            update_check_url: network
                .update_check_url
                .unwrap_or(defaults.network.update_check_url),
        },
        debug: file.debug.unwrap_or(false),
    };

    // Env overrides outrank file values for immediate CLI use.
    if let Some(key) = env_lookup(env::API_KEY_ENV) {
        settings.auth.api_key = key;
    }
    if let Some(url) = env_lookup(env::BASE_URL_ENV) {
        settings.network.base_url = url;
    }

    LoadedSettings { settings, warnings }
}

/// Validate the DNS resolution order setting.
///
/// Unknown values never abort startup: they log a warning and fall back to the
/// default order.
pub fn validate_dns_resolution_order(
    value: Option<&str>,
    warnings: &mut Vec<String>,
) -> String {
    match value {
        None => DEFAULT_DNS_RESOLUTION_ORDER.to_string(),
        Some("ipv4first") => "ipv4first".to_string(),
        Some("verbatim") => "verbatim".to_string(),
        Some(other) => {
            warnings.push(format!(
                "invalid network.dns_resolution_order `{other}`; using default `{DEFAULT_DNS_RESOLUTION_ORDER}`"
            ));
            DEFAULT_DNS_RESOLUTION_ORDER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn dns_order_accepts_known_values() {
        let mut warnings = Vec::new();
        assert_eq!(
            validate_dns_resolution_order(Some("ipv4first"), &mut warnings),
            "ipv4first"
        );
        assert_eq!(
            validate_dns_resolution_order(Some("verbatim"), &mut warnings),
            "verbatim"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn dns_order_defaults_when_absent() {
        let mut warnings = Vec::new();
        assert_eq!(
            validate_dns_resolution_order(None, &mut warnings),
            "ipv4first"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn dns_order_warns_and_defaults_on_bogus_value() {
        let mut warnings = Vec::new();
        assert_eq!(
            validate_dns_resolution_order(Some("bogus"), &mut warnings),
            "ipv4first"
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("bogus"), "warning: {}", warnings[0]);
    }

    #[test]
    fn missing_files_resolve_to_defaults() {
        let loaded = load_settings_from_sources(
            None,
            |_| Err(std::io::Error::from(std::io::ErrorKind::NotFound)),
            no_env,
            || None,
        )
        .expect("defaults should load");
        assert_eq!(loaded.settings, Settings::default());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let err = load_settings_from_sources(
            Some("/nonexistent/quill.toml"),
            |_| Err(std::io::Error::from(std::io::ErrorKind::NotFound)),
            no_env,
            || None,
        )
        .expect_err("explicit path should fail");
        assert!(err.to_string().contains("/nonexistent/quill.toml"));
    }

    #[test]
    fn file_values_resolve_into_settings() {
        let text = r#"
            debug = true

            [auth]
            method = "login"
            no_browser = true

            [sandbox]
            enabled = true
            kind = "container"
            image = "quill-sandbox:latest"

            [network]
            dns_resolution_order = "verbatim"
        "#;
        let loaded = load_settings_from_sources(
            Some("quill.toml"),
            |_| Ok(text.to_string()),
            no_env,
            || None,
        )
        .expect("settings should parse");
        let settings = loaded.settings;
        assert!(settings.debug);
        assert_eq!(settings.auth.method, AuthMethod::Login);
        assert!(settings.auth.no_browser);
        assert!(settings.sandbox.enabled);
        assert_eq!(settings.sandbox.image, "quill-sandbox:latest");
        assert_eq!(settings.network.dns_resolution_order, "verbatim");
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn bogus_dns_order_in_file_warns_and_defaults() {
        let text = "[network]\ndns_resolution_order = \"random\"\n";
        let loaded = load_settings_from_sources(
            Some("quill.toml"),
            |_| Ok(text.to_string()),
            no_env,
            || None,
        )
        .expect("settings should parse");
        assert_eq!(loaded.settings.network.dns_resolution_order, "ipv4first");
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn env_overrides_outrank_file_values() {
        let text = "[auth]\napi_key = \"from-file\"\n";
        let loaded = load_settings_from_sources(
            Some("quill.toml"),
            |_| Ok(text.to_string()),
            |name| (name == env::API_KEY_ENV).then(|| "from-env".to_string()),
            || None,
        )
        .expect("settings should parse");
        assert_eq!(loaded.settings.auth.api_key, "from-env");
    }
}
