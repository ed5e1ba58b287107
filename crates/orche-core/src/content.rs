//! Content types declared on route units.

use mime::Mime;

/// The request and response media types of a route unit.
///
/// Both default to `application/json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    /// Media type the unit expects in request bodies.
    pub request: Mime,
    /// Media type written on responses produced from the unit's result.
    pub response: Mime,
}

impl ContentType {
    /// Declares both sides explicitly.
    pub fn new(request: Mime, response: Mime) -> Self {
        Self { request, response }
    }

    /// Uses the same media type for requests and responses.
    pub fn both(mime: Mime) -> Self {
        Self {
            request: mime.clone(),
            response: mime,
        }
    }

    /// Keeps the JSON request type and overrides the response type.
    pub fn responds(mime: Mime) -> Self {
        Self {
            request: mime::APPLICATION_JSON,
            response: mime,
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::both(mime::APPLICATION_JSON)
    }
}

/// Returns true for `application/json` and `+json` suffixed types.
pub fn is_json(mime: &Mime) -> bool {
    mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)
}
