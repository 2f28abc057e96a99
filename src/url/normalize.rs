use url::Url;

/// Parses the configured base URL into the form relative links resolve against
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Remove fragment and query
/// 3. Treat an extension-less last segment as a directory (append `/`), so
///    `https://host/90` and `https://host/90/` resolve `session/x` identically
///
/// # Examples
///
/// ```
/// use conference_harvester::url::normalize_base_url;
///
/// let url = normalize_base_url("https://conf.example.org/90").unwrap();
/// assert_eq!(url.as_str(), "https://conf.example.org/90/");
/// ```
pub fn normalize_base_url(url_str: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(url_str.trim())?;
    url.set_fragment(None);
    url.set_query(None);

    let path = url.path().to_string();
    if !path.ends_with('/') {
        let last_segment = path.rsplit('/').next().unwrap_or("");
        if !last_segment.contains('.') {
            url.set_path(&format!("{}/", path));
        }
    }

    Ok(url)
}

/// Removes the fragment from an absolute URL string
///
/// Two links that differ only in `#anchor` point at the same document.
pub fn strip_fragment(url: &mut Url) {
    url.set_fragment(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_added_for_directory() {
        let url = normalize_base_url("https://example.com/90").unwrap();
        assert_eq!(url.as_str(), "https://example.com/90/");
    }

    #[test]
    fn test_trailing_slash_kept() {
        let url = normalize_base_url("https://example.com/90/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/90/");
    }

    #[test]
    fn test_file_path_left_alone() {
        let url = normalize_base_url("https://example.com/90/index.html").unwrap();
        assert_eq!(url.as_str(), "https://example.com/90/index.html");
        assert_eq!(
            url.join("session/1-moa/index.html").unwrap().as_str(),
            "https://example.com/90/session/1-moa/index.html"
        );
    }

    #[test]
    fn test_root_without_path() {
        let url = normalize_base_url("http://127.0.0.1:4000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/");
    }

    #[test]
    fn test_fragment_and_query_removed() {
        let url = normalize_base_url("https://example.com/90/?x=1#top").unwrap();
        assert_eq!(url.as_str(), "https://example.com/90/");
    }

    #[test]
    fn test_invalid_url() {
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_strip_fragment() {
        let mut url = Url::parse("https://example.com/page#section").unwrap();
        strip_fragment(&mut url);
        assert_eq!(url.as_str(), "https://example.com/page");
    }
}
