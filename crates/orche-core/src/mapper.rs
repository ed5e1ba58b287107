//! The request-mapper facade.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::args::ParamValue;

/// A flattened, read-only view of a request's path, query and headers.
///
/// Handlers bound to [`ParamKind::RequestMapper`](crate::ParamKind) get one
/// of these instead of the raw request. Values are raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMapper {
    path_params: BTreeMap<String, String>,
    query: IndexMap<String, ParamValue>,
    headers: BTreeMap<String, String>,
}

impl RequestMapper {
    /// Assembles a mapper. Header names are lower-cased.
    pub fn new(
        path_params: impl IntoIterator<Item = (String, String)>,
        query: impl IntoIterator<Item = (String, ParamValue)>,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            path_params: path_params.into_iter().collect(),
            query: query.into_iter().collect(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    /// Returns a path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Returns every path parameter.
    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    /// Returns the first query value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).and_then(ParamValue::as_str)
    }

    /// Returns the raw query value for `name`.
    pub fn query_value(&self, name: &str) -> &ParamValue {
        static MISSING: ParamValue = ParamValue::Missing;
        self.query.get(name).unwrap_or(&MISSING)
    }

    /// Returns a header value; the lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Looks `name` up in the query first, then in the path parameters.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.query(name).or_else(|| self.path_param(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> RequestMapper {
        RequestMapper::new(
            [("uuid".to_string(), "42".to_string())],
            [
                ("bearer".to_string(), ParamValue::Text("tok".into())),
                (
                    "tag".to_string(),
                    ParamValue::List(vec!["a".into(), "b".into()]),
                ),
            ],
            [("Authorization".to_string(), "tok".to_string())],
        )
    }

    #[test]
    fn test_lookups() {
        let m = mapper();
        assert_eq!(m.path_param("uuid"), Some("42"));
        assert_eq!(m.query("bearer"), Some("tok"));
        assert_eq!(m.query("tag"), Some("a"));
        assert_eq!(m.header("AUTHORIZATION"), Some("tok"));
        assert!(m.query_value("missing").is_missing());
    }

    #[test]
    fn test_get_prefers_query() {
        let m = RequestMapper::new(
            [("id".to_string(), "path".to_string())],
            [("id".to_string(), ParamValue::Text("query".into()))],
            [],
        );
        assert_eq!(m.get("id"), Some("query"));
    }
}
