//! Configuration types.
//!
//! [`OrcheConfig`] is a draft: every field is optional so that one draft can
//! come from code, one from the local rc file and one from the environment
//! file. [`ResolvedConfig`] is what remains after precedence and defaults.

use std::fmt;
use std::time::Duration;

use orche_core::CorsConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default mount path.
pub const DEFAULT_MOUNT_PATH: &str = "/";

/// Engine-specific settings, passed through untouched except for the keys
/// the reference engine understands.
pub type Settings = Map<String, Value>;

/// The HTTP engine an application runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApiEngine {
    /// The bundled hyper engine.
    #[default]
    Hyper,
    /// Any other engine name. Bootstrapping falls back to [`ApiEngine::Hyper`].
    Other(String),
}

impl ApiEngine {
    /// Returns the engine name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hyper => "hyper",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ApiEngine {
    fn from(name: String) -> Self {
        if name.eq_ignore_ascii_case("hyper") {
            Self::Hyper
        } else {
            Self::Other(name)
        }
    }
}

impl From<ApiEngine> for String {
    fn from(engine: ApiEngine) -> Self {
        engine.as_str().to_string()
    }
}

impl fmt::Display for ApiEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration draft from one source.
///
/// # Example
///
/// ```
/// use orche_config::OrcheConfig;
///
/// let draft: OrcheConfig = serde_json::from_str(
///     r#"{"appName": "computers", "path": "/orche", "port": 8080}"#,
/// ).unwrap();
/// assert_eq!(draft.port, Some(8080));
/// assert_eq!(draft.mount_path.as_deref(), Some("/orche"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrcheConfig {
    /// Engine name.
    pub api_engine: Option<ApiEngine>,
    /// Base path every route is mounted under.
    #[serde(rename = "path", alias = "mountPath")]
    pub mount_path: Option<String>,
    /// Listening port.
    pub port: Option<u16>,
    /// Application name, also the key into the environment file.
    pub app_name: Option<String>,
    /// Application-wide CORS policy.
    pub cors_config: Option<CorsConfig>,
    /// Development mode.
    pub debug: Option<bool>,
    /// Opaque extension descriptors.
    pub extensions: Option<Vec<Value>>,
    /// Engine settings.
    pub settings: Option<Settings>,
    /// Logged once the server listens.
    pub init_message: Option<String>,
}

impl OrcheConfig {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application name.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Sets the mount path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.mount_path = Some(path.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the engine.
    #[must_use]
    pub fn api_engine(mut self, engine: ApiEngine) -> Self {
        self.api_engine = Some(engine);
        self
    }

    /// Sets the application-wide CORS policy.
    #[must_use]
    pub fn cors_config(mut self, cors: CorsConfig) -> Self {
        self.cors_config = Some(cors);
        self
    }

    /// Sets development mode.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Sets one engine setting.
    #[must_use]
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings
            .get_or_insert_with(Settings::new)
            .insert(key.into(), value.into());
        self
    }

    /// Adds an extension descriptor.
    #[must_use]
    pub fn extension(mut self, extension: Value) -> Self {
        self.extensions.get_or_insert_with(Vec::new).push(extension);
        self
    }

    /// Sets the startup message.
    #[must_use]
    pub fn init_message(mut self, message: impl Into<String>) -> Self {
        self.init_message = Some(message.into());
        self
    }

    /// Layers `self` over `lower`: each field set here wins, the rest come
    /// from `lower`. Fields are never merged internally.
    #[must_use]
    pub fn over(self, lower: Self) -> Self {
        Self {
            api_engine: self.api_engine.or(lower.api_engine),
            mount_path: self.mount_path.or(lower.mount_path),
            port: self.port.or(lower.port),
            app_name: self.app_name.or(lower.app_name),
            cors_config: self.cors_config.or(lower.cors_config),
            debug: self.debug.or(lower.debug),
            extensions: self.extensions.or(lower.extensions),
            settings: self.settings.or(lower.settings),
            init_message: self.init_message.or(lower.init_message),
        }
    }
}

/// The configuration an application runs with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    /// Engine to run on.
    pub api_engine: ApiEngine,
    /// Sanitized base path.
    #[serde(rename = "path")]
    pub mount_path: String,
    /// Listening port.
    pub port: u16,
    /// Application name.
    pub app_name: String,
    /// Application-wide CORS policy.
    pub cors_config: Option<CorsConfig>,
    /// Development mode.
    pub debug: bool,
    /// Extension descriptors.
    pub extensions: Option<Vec<Value>>,
    /// Engine settings.
    pub settings: Option<Settings>,
    /// Startup message.
    pub init_message: Option<String>,
}

impl ResolvedConfig {
    /// Fills the defaults for whatever the draft leaves unset.
    pub fn from_draft(draft: OrcheConfig, default_app_name: &str) -> Self {
        Self {
            api_engine: draft.api_engine.unwrap_or_default(),
            mount_path: orche_router::sanitize(
                draft.mount_path.as_deref().unwrap_or(DEFAULT_MOUNT_PATH),
            ),
            port: draft.port.unwrap_or(DEFAULT_PORT),
            app_name: draft
                .app_name
                .unwrap_or_else(|| default_app_name.to_string()),
            cors_config: draft.cors_config,
            debug: draft.debug.unwrap_or(false),
            extensions: draft.extensions,
            settings: draft.settings,
            init_message: draft.init_message,
        }
    }

    /// Returns one engine setting.
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.as_ref()?.get(key)
    }

    /// `settings.requestTimeoutMs`, if set to a positive integer.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.setting("requestTimeoutMs")
            .and_then(Value::as_u64)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// `settings.maxBodyBytes`, if set.
    pub fn max_body_bytes(&self) -> Option<usize> {
        self.setting("maxBodyBytes")
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::from_draft(OrcheConfig::default(), "orche")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ResolvedConfig::from_draft(OrcheConfig::new(), "my-app");
        assert_eq!(config.port, 3000);
        assert_eq!(config.mount_path, "/");
        assert_eq!(config.api_engine, ApiEngine::Hyper);
        assert_eq!(config.app_name, "my-app");
        assert!(!config.debug);
        assert!(config.cors_config.is_none());
        assert!(config.extensions.is_none());
        assert!(config.settings.is_none());
        assert!(config.init_message.is_none());
    }

    #[test]
    fn test_mount_path_is_sanitized() {
        let config = ResolvedConfig::from_draft(OrcheConfig::new().path("orche/"), "app");
        assert_eq!(config.mount_path, "/orche");
        let config = ResolvedConfig::from_draft(OrcheConfig::new().path(""), "app");
        assert_eq!(config.mount_path, "/");
    }

    #[test]
    fn test_over_picks_per_field() {
        let high = OrcheConfig::new().port(9000);
        let low = OrcheConfig::new().port(8080).path("/orche").debug(true);
        let merged = high.over(low);
        assert_eq!(merged.port, Some(9000));
        assert_eq!(merged.mount_path.as_deref(), Some("/orche"));
        assert_eq!(merged.debug, Some(true));
    }

    #[test]
    fn test_settings_are_not_merged() {
        let high = OrcheConfig::new().setting("a", 1);
        let low = OrcheConfig::new().setting("b", 2);
        let merged = high.over(low);
        let settings = merged.settings.unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings["a"], json!(1));
    }

    #[test]
    fn test_engine_names() {
        let draft: OrcheConfig = serde_json::from_str(r#"{"apiEngine": "HYPER"}"#).unwrap();
        assert_eq!(draft.api_engine, Some(ApiEngine::Hyper));
        let draft: OrcheConfig = serde_json::from_str(r#"{"apiEngine": "express"}"#).unwrap();
        assert_eq!(draft.api_engine, Some(ApiEngine::Other("express".into())));
    }

    #[test]
    fn test_draft_from_toml() {
        let draft: OrcheConfig = toml::from_str(
            r#"
                appName = "computers"
                path = "/orche"
                port = 8080
                debug = true

                [corsConfig]
                preflight = true

                [settings]
                requestTimeoutMs = 2500
            "#,
        )
        .unwrap();
        let config = ResolvedConfig::from_draft(draft, "unused");
        assert_eq!(config.app_name, "computers");
        assert_eq!(config.port, 8080);
        assert!(config.cors_config.as_ref().unwrap().preflight);
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.max_body_bytes(), None);
    }
}
