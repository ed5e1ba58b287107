//! HTTP verbs as seen by route and interceptor declarations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A verb a route unit or interceptor can be declared for.
///
/// `All` matches every request method. `Other` carries a verb the route
/// compiler cannot mount; units declared with it are skipped and reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// Any method.
    All,
    /// A verb outside the supported set.
    Other(String),
}

impl HttpMethod {
    /// The verbs a declaration may target, in mount-table order.
    pub const SUPPORTED: [HttpMethod; 8] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
        Self::All,
    ];

    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::All => "ALL",
            Self::Other(name) => name,
        }
    }

    /// Returns true if the route compiler can mount this verb.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns true if a request with `method` is covered by this verb.
    pub fn matches(&self, method: &http::Method) -> bool {
        match self {
            Self::All => true,
            Self::Other(name) => name.eq_ignore_ascii_case(method.as_str()),
            verb => verb.as_str() == method.as_str(),
        }
    }

    /// Like [`matches`](Self::matches), with `GET` also covering `HEAD`.
    ///
    /// Mounted routes and interceptor filters both dispatch through this,
    /// so a `HEAD` request sees the same guards as the `GET` it mirrors.
    pub fn answers(&self, method: &http::Method) -> bool {
        self.matches(method) || (*self == Self::Get && method == http::Method::HEAD)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "ALL" | "*" => Self::All,
            _ => Self::Other(upper),
        })
    }
}

impl From<&http::Method> for HttpMethod {
    fn from(method: &http::Method) -> Self {
        match method.as_str().parse() {
            Ok(verb) => verb,
            Err(never) => match never {},
        }
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(verb) => Ok(verb),
            Err(never) => match never {},
        }
    }
}
