//! Typed URL builder for Seafile API endpoints.

use std::fmt;

use url::form_urlencoded;

/// A request target: an API path (or an absolute URL handed out by the
/// server) plus form-encoded query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrl {
    path: String,
    query: Vec<(String, String)>,
}

impl ApiUrl {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.query.push((key.to_string(), value.as_ref().to_string()));
        self
    }

    /// Append a query parameter only when a value is present.
    pub fn query_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Whether this URL points outside the API server (e.g. an upload link).
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }

    /// Full URL to send the request to.
    pub fn resolve(&self, server: &str) -> String {
        if self.is_absolute() {
            self.to_string()
        } else {
            format!("{}{}", server.trim_end_matches('/'), self)
        }
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.query.is_empty() {
            return Ok(());
        }

        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        let sep = if self.path.contains('?') { '&' } else { '?' };
        write!(f, "{}{}", sep, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_form_encoded() {
        let url = ApiUrl::new("/api2/repos/r1/dir/").query("p", "/a/b");
        assert_eq!(url.to_string(), "/api2/repos/r1/dir/?p=%2Fa%2Fb");
    }

    #[test]
    fn test_no_query() {
        let url = ApiUrl::new("/api2/repos/r1/dir/");
        assert_eq!(url.to_string(), "/api2/repos/r1/dir/");
    }

    #[test]
    fn test_query_opt() {
        let url = ApiUrl::new("/api2/repos/").query_opt("type", None);
        assert_eq!(url.to_string(), "/api2/repos/");

        let url = ApiUrl::new("/api2/repos/").query_opt("type", Some("mine"));
        assert_eq!(url.to_string(), "/api2/repos/?type=mine");
    }

    #[test]
    fn test_spaces_and_unicode() {
        let url = ApiUrl::new("/x/").query("p", "/my docs/é.txt");
        assert_eq!(url.to_string(), "/x/?p=%2Fmy+docs%2F%C3%A9.txt");
    }

    #[test]
    fn test_resolve_relative() {
        let url = ApiUrl::new("/api2/repos/");
        assert_eq!(
            url.resolve("https://cloud.example.com/"),
            "https://cloud.example.com/api2/repos/"
        );
    }

    #[test]
    fn test_resolve_absolute_keeps_host() {
        let url = ApiUrl::new("https://upload.example.com/seafhttp/upload-api/abc")
            .query("ret-json", "1");
        assert!(url.is_absolute());
        assert_eq!(
            url.resolve("https://cloud.example.com"),
            "https://upload.example.com/seafhttp/upload-api/abc?ret-json=1"
        );
    }

    #[test]
    fn test_existing_query_appends() {
        let url = ApiUrl::new("/api2/repos/r1/?op=rename").query("x", "1");
        assert_eq!(url.to_string(), "/api2/repos/r1/?op=rename&x=1");
    }
}
