//! Parsing helpers for URLs handed out by Seafile: share links and the
//! quoted links returned by the upload/download endpoints.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::{Result, SeafileError};

/// Quoted body returned by `upload-link` and `file/?p=` endpoints.
static QUOTED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"(.*)""#).expect("Invalid quoted link regex"));

/// Share tokens are URL-safe identifiers.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid share token regex"));

/// Index of the token among the `/`-separated pieces of a share link,
/// e.g. `https://host/d/<token>/`.
const TOKEN_SEGMENT: usize = 4;

/// Extract the share token from a share link.
///
/// # Examples
///
/// ```
/// use seafile_api::url_parser::extract_share_token;
///
/// let token = extract_share_token("https://cloud.example.com/d/4f1c2a/").unwrap();
/// assert_eq!(token, "4f1c2a");
/// ```
pub fn extract_share_token(share_link: &str) -> Result<String> {
    let trimmed = share_link.trim();
    let invalid = || SeafileError::InvalidArgument("Invalid share link".to_string());

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }

    let token = trimmed.split('/').nth(TOKEN_SEGMENT).ok_or_else(invalid)?;
    check_share_token(token)?;
    Ok(token.to_string())
}

/// Reject tokens that could change the request path when placed in a URL.
pub(crate) fn check_share_token(token: &str) -> Result<()> {
    if TOKEN_REGEX.is_match(token) {
        Ok(())
    } else {
        Err(SeafileError::InvalidArgument("Invalid share link".to_string()))
    }
}

/// Strip the surrounding quotes from a link returned as a JSON string body.
pub fn unquote_link(body: &str) -> Result<String> {
    QUOTED_REGEX
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            SeafileError::MalformedResponse(format!("expected a quoted link, got: {}", body))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_dir_link() {
        let link = "https://cloud.example.com/d/abc123/";
        assert_eq!(extract_share_token(link).unwrap(), "abc123");
    }

    #[test]
    fn test_extract_file_link() {
        let link = "https://cloud.example.com/f/xyz789/";
        assert_eq!(extract_share_token(link).unwrap(), "xyz789");
    }

    #[test]
    fn test_too_few_segments() {
        assert!(extract_share_token("https://cloud.example.com/d").is_err());
    }

    #[test]
    fn test_empty_token() {
        assert!(extract_share_token("https://cloud.example.com/d/").is_err());
    }

    #[test]
    fn test_token_with_url_syntax() {
        assert!(extract_share_token("https://cloud.example.com/d/abc?x=1").is_err());
        assert!(extract_share_token("https://cloud.example.com/d/abc#frag").is_err());
        assert!(extract_share_token("https://cloud.example.com/d/../").is_err());
        assert!(extract_share_token("https://cloud.example.com/d/./").is_err());
    }

    #[test]
    fn test_not_a_url() {
        let err = extract_share_token("not a url").unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Invalid share link");
    }

    #[test]
    fn test_unquote_link() {
        let body = r#""https://cloud.example.com/seafhttp/upload-api/abc""#;
        assert_eq!(
            unquote_link(body).unwrap(),
            "https://cloud.example.com/seafhttp/upload-api/abc"
        );
    }

    #[test]
    fn test_unquote_unquoted_body() {
        assert!(matches!(
            unquote_link("https://cloud.example.com/x"),
            Err(SeafileError::MalformedResponse(_))
        ));
    }
}
