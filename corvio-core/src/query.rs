//! Backend URL paths and listing query strings.
//!
//! Every path component is escaped on its own, so a `/` inside an account,
//! container or object name ends up percent-encoded rather than producing
//! an extra path segment on the wire.

/// Escape one path component (RFC 3986 unreserved characters pass through).
pub fn escape_path(component: &str) -> String {
    urlencoding::encode(component).into_owned()
}

/// Render the backend path for a logical (account, container, object)
/// tuple. Empty trailing components collapse to the parent tier:
/// `("a", "", "")` renders the account path, `("a", "c", "")` the
/// container path.
pub fn backend_path(account: &str, container: &str, object: &str) -> String {
    let mut path = format!("/{}", escape_path(account));
    if !container.is_empty() {
        path.push('/');
        path.push_str(&escape_path(container));
        if !object.is_empty() {
            path.push('/');
            path.push_str(&escape_path(object));
        }
    }
    path
}

/// Recognized listing parameters for account and container GETs.
///
/// Rendering drops empty values and a zero limit; the remaining pairs are
/// percent-encoded on both sides and joined into a `?`-prefixed query.
#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    pub format: String,
    pub marker: String,
    pub end_marker: String,
    pub prefix: String,
    pub delimiter: String,
    pub limit: usize,
}

impl ListingOptions {
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        let limit = self.limit.to_string();
        if !self.format.is_empty() {
            pairs.push(("format", &self.format));
        }
        if !self.marker.is_empty() {
            pairs.push(("marker", &self.marker));
        }
        if !self.end_marker.is_empty() {
            pairs.push(("end_marker", &self.end_marker));
        }
        if !self.prefix.is_empty() {
            pairs.push(("prefix", &self.prefix));
        }
        if !self.delimiter.is_empty() {
            pairs.push(("delimiter", &self.delimiter));
        }
        if self.limit != 0 {
            pairs.push(("limit", &limit));
        }

        if pairs.is_empty() {
            return String::new();
        }

        let encoded: Vec<String> = pairs
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        format!("?{}", encoded.join("&"))
    }
}
