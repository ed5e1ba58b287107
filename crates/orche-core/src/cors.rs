//! CORS declarations.
//!
//! These are plain data: what a route unit (or the whole application)
//! declares. Enforcement lives in `orche-middleware`.

use serde::{Deserialize, Serialize};

/// Default methods advertised by a preflight response.
pub const DEFAULT_CORS_METHODS: [&str; 6] = ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"];

/// The CORS policy of a route unit or of the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsConfig {
    /// Register an `OPTIONS` responder for the unit path ahead of the verb handler.
    pub preflight: bool,
    /// Options applied by the responder and by the verb wrapper.
    ///
    /// When absent the verb handler is mounted without CORS enforcement.
    pub cors_options: Option<CorsOptions>,
}

impl CorsConfig {
    /// Enforces `options` on the verb handler and answers preflights.
    pub fn with_preflight(options: CorsOptions) -> Self {
        Self {
            preflight: true,
            cors_options: Some(options),
        }
    }

    /// Enforces `options` on the verb handler only.
    pub fn enforce(options: CorsOptions) -> Self {
        Self {
            preflight: false,
            cors_options: Some(options),
        }
    }

    /// Returns the options a preflight responder should use.
    pub fn preflight_options(&self) -> CorsOptions {
        self.cors_options.clone().unwrap_or_default()
    }
}

/// Which origins are allowed.
///
/// Deserializes from `"*"`, a single origin string or a list of origins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OriginsRepr", into = "OriginsRepr")]
pub enum AllowedOrigins {
    /// Every origin (`*`).
    #[default]
    Any,
    /// Only the listed origins.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Checks if an origin is allowed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o == origin),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OriginsRepr {
    One(String),
    Many(Vec<String>),
}

impl From<OriginsRepr> for AllowedOrigins {
    fn from(repr: OriginsRepr) -> Self {
        match repr {
            OriginsRepr::One(origin) if origin == "*" => Self::Any,
            OriginsRepr::One(origin) => Self::List(vec![origin]),
            OriginsRepr::Many(list) if list.iter().any(|o| o == "*") => Self::Any,
            OriginsRepr::Many(list) => Self::List(list),
        }
    }
}

impl From<AllowedOrigins> for OriginsRepr {
    fn from(origins: AllowedOrigins) -> Self {
        match origins {
            AllowedOrigins::Any => Self::One("*".to_string()),
            AllowedOrigins::List(list) => Self::Many(list),
        }
    }
}

/// CORS options, shaped after the widely used `cors` middleware options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsOptions {
    /// Allowed origins.
    pub origin: AllowedOrigins,
    /// Methods advertised to preflight requests.
    pub methods: Vec<String>,
    /// Allowed request headers; `None` reflects whatever the preflight asks for.
    pub allowed_headers: Option<Vec<String>>,
    /// Response headers exposed to scripts.
    pub exposed_headers: Vec<String>,
    /// Emit `Access-Control-Allow-Credentials: true`.
    pub credentials: bool,
    /// Preflight cache lifetime in seconds.
    pub max_age: Option<u64>,
    /// Status of a successful preflight response.
    pub options_success_status: u16,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            origin: AllowedOrigins::Any,
            methods: DEFAULT_CORS_METHODS.iter().map(ToString::to_string).collect(),
            allowed_headers: None,
            exposed_headers: Vec::new(),
            credentials: false,
            max_age: None,
            options_success_status: 204,
        }
    }
}

impl CorsOptions {
    /// Restricts the allowed origins.
    pub fn origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origin = AllowedOrigins::from(OriginsRepr::Many(
            origins.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Sets the advertised methods.
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the allowed request headers.
    pub fn allowed_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the exposed response headers.
    pub fn exposed_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exposed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Allows credentials.
    pub fn credentials(mut self, allow: bool) -> Self {
        self.credentials = allow;
        self
    }

    /// Sets the preflight cache lifetime in seconds.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }
}
