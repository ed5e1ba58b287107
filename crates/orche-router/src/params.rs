//! Captured path parameters.
//!
//! Named segments (`:uuid`, `{uuid}`) and wildcards captured while matching a
//! [`PathPattern`](crate::PathPattern) end up here. Values are kept exactly as
//! they appeared in the request path; no type coercion happens at this layer.

use smallvec::SmallVec;

/// Most routes capture a handful of parameters; keep those on the stack.
const INLINE_PARAMS: usize = 4;

/// Path parameters captured by a pattern match, in capture order.
///
/// # Example
///
/// ```rust
/// use orche_router::Params;
///
/// let mut params = Params::new();
/// params.push("uuid", "42");
/// params.set("uuid", "43");
///
/// assert_eq!(params.get("uuid"), Some("43"));
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter without checking for an existing name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Inserts or replaces the value stored under `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.inner.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.inner.push((name, value)),
        }
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops every captured parameter.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Copies every pair of `other` into this set, replacing same-named values.
    pub fn merge(&mut self, other: &Params) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
