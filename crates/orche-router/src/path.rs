//! Path sanitation and joining.

/// Normalizes a mount path, class prefix or unit path.
///
/// A leading slash is enforced, trailing slashes are stripped, repeated
/// slashes collapse, and an empty path becomes `/`.
///
/// ```rust
/// use orche_router::sanitize;
///
/// assert_eq!(sanitize("computers/"), "/computers");
/// assert_eq!(sanitize(""), "/");
/// assert_eq!(sanitize("//a//b"), "/a/b");
/// ```
pub fn sanitize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.trim().split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Joins path pieces with exactly one slash between them.
///
/// Every piece is sanitized first; root pieces contribute nothing.
///
/// ```rust
/// use orche_router::join_paths;
///
/// assert_eq!(join_paths(&["/orche", "computers", "/"]), "/orche/computers");
/// assert_eq!(join_paths(&["/", "/", ":uuid"]), "/:uuid");
/// assert_eq!(join_paths(&["/", ""]), "/");
/// ```
pub fn join_paths(pieces: &[&str]) -> String {
    let mut out = String::new();
    for piece in pieces {
        let clean = sanitize(piece);
        if clean != "/" {
            out.push_str(&clean);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
