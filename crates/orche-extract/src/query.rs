//! Query string parsing.

use orche_core::QueryMap;

use crate::{ExtractionError, ExtractionSource};

/// Parses a raw query string (without the leading `?`).
///
/// Keys repeated in the query keep every value, in order.
///
/// ```rust
/// use orche_extract::parse_query;
///
/// let query = parse_query("name=mac&tag=a&tag=b&size=10").unwrap();
/// assert_eq!(query["name"], vec!["mac"]);
/// assert_eq!(query["tag"], vec!["a", "b"]);
/// ```
pub fn parse_query(raw: &str) -> Result<QueryMap, ExtractionError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string()))?;

    let mut query = QueryMap::new();
    for (key, value) in pairs {
        query.entry(key).or_default().push(value);
    }
    Ok(query)
}
