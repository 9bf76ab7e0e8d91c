//! Incremental URL construction with explicit percent-encoding control.
//!
//! [`UrlBuilder`] assembles an absolute URL component by component
//! (scheme/host/path/query) and guarantees every caller-supplied segment is
//! escaped per URL-encoding rules before serialization. [`SfsUrlBuilder`]
//! layers the SFS endpoint templates on top.
//!
//! The builder keeps its own component state and validates the assembled
//! result through the `url` crate on every [`UrlBuilder::url`] call, so a
//! malformed host or URL fails at construction time with the parser's
//! diagnostic, deterministically, before any request is attempted.
//!
//! # Examples
//!
//! ```
//! use sfs_client::url_builder::{Scheme, UrlBuilder};
//!
//! let mut builder = UrlBuilder::new();
//! builder.set_scheme(Scheme::Https);
//! builder.set_host("example.com").unwrap();
//! builder.set_path("api/v1", false);
//! builder.append_path("name with spaces", true);
//! builder.append_query("action", "select");
//! assert_eq!(
//!     builder.url().unwrap(),
//!     "https://example.com/api/v1/name%20with%20spaces?action=select"
//! );
//! ```

use crate::error::{Result, SfsError};

/// URL schemes the builder can be set to.
///
/// The service only speaks HTTPS; parsing a full URL via
/// [`UrlBuilder::set_url`] may still carry other schemes (test servers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `https`
    Https,
}

/// Bytes that survive percent-encoding unmodified (RFC 3986 unreserved set).
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

fn escape_bytes(value: &str, keep_separators: bool) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        if is_unreserved(byte) || (keep_separators && byte == b'/') {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

/// Percent-encode `value` for use as a single URL component.
///
/// Escapes everything outside the RFC 3986 unreserved set, including `/`.
/// Exposed so callers never interpolate unescaped path segments by hand.
///
/// # Examples
///
/// ```
/// use sfs_client::url_builder::escape_string;
///
/// assert_eq!(escape_string("a/b c"), "a%2Fb%20c");
/// assert_eq!(escape_string("1.2.3"), "1.2.3");
/// ```
pub fn escape_string(value: &str) -> String {
    escape_bytes(value, false)
}

/// Component-wise URL builder.
///
/// Path and query are stored in already-escaped form; the `encode` flags on
/// the path operations decide whether the builder escapes for you or trusts
/// the input verbatim.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    scheme: &'static str,
    host: String,
    path: String,
    query: String,
}

impl UrlBuilder {
    /// Create an empty builder (scheme `https`, no host).
    pub fn new() -> Self {
        UrlBuilder {
            scheme: "https",
            host: String::new(),
            path: String::new(),
            query: String::new(),
        }
    }

    /// Set the URL scheme.
    pub fn set_scheme(&mut self, scheme: Scheme) {
        self.scheme = match scheme {
            Scheme::Https => "https",
        };
    }

    /// Set the host.
    ///
    /// # Errors
    ///
    /// Returns [`SfsError::ConnectionUrlSetupFailed`] carrying the `url`
    /// crate's diagnostic when `host` is not a valid hostname.
    pub fn set_host(&mut self, host: &str) -> Result<()> {
        if host.is_empty() {
            return Err(SfsError::ConnectionUrlSetupFailed(
                "bad hostname: host is empty".to_string(),
            ));
        }
        url::Host::parse(host).map_err(|err| {
            SfsError::ConnectionUrlSetupFailed(format!("bad hostname '{host}': {err}"))
        })?;
        self.host = host.to_string();
        Ok(())
    }

    /// Replace the entire path.
    ///
    /// With `encode`, every character outside the unreserved set is
    /// percent-encoded *except* `/`, which keeps its separator role.
    pub fn set_path(&mut self, path: &str, encode: bool) {
        let path = path.trim_start_matches('/');
        self.path = if encode {
            escape_bytes(path, true)
        } else {
            path.to_string()
        };
    }

    /// Append one path segment.
    ///
    /// With `encode`, the segment is fully percent-encoded, including `/`;
    /// an encoded segment can never introduce extra path levels.
    pub fn append_path(&mut self, segment: &str, encode: bool) {
        let segment = if encode {
            escape_bytes(segment, false)
        } else {
            segment.trim_matches('/').to_string()
        };
        if !self.path.is_empty() {
            self.path.push('/');
        }
        self.path.push_str(&segment);
    }

    /// Clear the path.
    pub fn reset_path(&mut self) {
        self.path.clear();
    }

    /// Replace the query string with a single `key=value` pair.
    pub fn set_query(&mut self, key: &str, value: &str) {
        self.query = format!("{}={}", escape_string(key), escape_string(value));
    }

    /// Add a `key=value` pair to the existing query string.
    pub fn append_query(&mut self, key: &str, value: &str) {
        if !self.query.is_empty() {
            self.query.push('&');
        }
        self.query
            .push_str(&format!("{}={}", escape_string(key), escape_string(value)));
    }

    /// Clear the query string.
    pub fn reset_query(&mut self) {
        self.query.clear();
    }

    /// Parse `value` as an absolute URL and replace the whole builder state.
    ///
    /// # Errors
    ///
    /// Returns [`SfsError::ConnectionUrlSetupFailed`] carrying the parser's
    /// diagnostic on malformed input.
    pub fn set_url(&mut self, value: &str) -> Result<()> {
        let parsed = url::Url::parse(value).map_err(|err| {
            SfsError::ConnectionUrlSetupFailed(format!("bad URL '{value}': {err}"))
        })?;
        let host = parsed.host_str().ok_or_else(|| {
            SfsError::ConnectionUrlSetupFailed(format!("bad URL '{value}': missing host"))
        })?;
        // Scheme is kept verbatim; test servers are plain http.
        self.scheme = match parsed.scheme() {
            "https" => "https",
            "http" => "http",
            other => {
                return Err(SfsError::ConnectionUrlSetupFailed(format!(
                    "bad URL '{value}': unsupported scheme '{other}'"
                )))
            }
        };
        self.host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        self.path = parsed.path().trim_start_matches('/').to_string();
        self.query = parsed.query().unwrap_or_default().to_string();
        Ok(())
    }

    /// Serialize the current state as an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`SfsError::ConnectionUrlSetupFailed`] when no host is set or
    /// the assembled URL does not survive a validating re-parse.
    pub fn url(&self) -> Result<String> {
        if self.host.is_empty() {
            return Err(SfsError::ConnectionUrlSetupFailed(
                "cannot serialize URL: host is not set".to_string(),
            ));
        }
        let mut assembled = format!("{}://{}/{}", self.scheme, self.host, self.path);
        if !self.query.is_empty() {
            assembled.push('?');
            assembled.push_str(&self.query);
        }
        url::Url::parse(&assembled).map_err(|err| {
            SfsError::ConnectionUrlSetupFailed(format!("bad URL '{assembled}': {err}"))
        })?;
        Ok(assembled)
    }
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// SFS endpoint URLs over the fixed path template
/// `api/{apiVersion}/contents/{instanceId}/namespaces/{namespace}/names/...`.
///
/// Every caller-supplied segment (product names, versions) is escaped; the
/// fixed template parts are appended verbatim.
#[derive(Debug, Clone)]
pub(crate) struct SfsUrlBuilder {
    base: UrlBuilder,
    instance_id: String,
    namespace: String,
}

/// API version for single-content operations.
const API_VERSION_V1: &str = "v1";

/// API version for the batched latest-version lookup.
const API_VERSION_V2: &str = "v2";

impl SfsUrlBuilder {
    /// Build against the production host for `account_id`.
    pub(crate) fn new(account_id: &str, instance_id: &str, namespace: &str) -> Result<Self> {
        let mut base = UrlBuilder::new();
        base.set_scheme(Scheme::Https);
        base.set_host(&format!("{account_id}.api.cdp.microsoft.com"))?;
        Ok(SfsUrlBuilder {
            base,
            instance_id: instance_id.to_string(),
            namespace: namespace.to_string(),
        })
    }

    /// Build against an explicit base URL (test servers).
    pub(crate) fn with_base_url(
        base_url: &str,
        instance_id: &str,
        namespace: &str,
    ) -> Result<Self> {
        let mut base = UrlBuilder::new();
        base.set_url(base_url)?;
        base.reset_path();
        base.reset_query();
        Ok(SfsUrlBuilder {
            base,
            instance_id: instance_id.to_string(),
            namespace: namespace.to_string(),
        })
    }

    fn names_builder(&self, api_version: &str) -> UrlBuilder {
        let mut builder = self.base.clone();
        builder.reset_path();
        builder.reset_query();
        builder.append_path("api", false);
        builder.append_path(api_version, false);
        builder.append_path("contents", false);
        builder.append_path(&self.instance_id, true);
        builder.append_path("namespaces", false);
        builder.append_path(&self.namespace, true);
        builder.append_path("names", false);
        builder
    }

    /// `…/names/{product}/versions/latest?action=select`
    pub(crate) fn latest_version_url(&self, product: &str) -> Result<String> {
        let mut builder = self.names_builder(API_VERSION_V1);
        builder.append_path(product, true);
        builder.append_path("versions", false);
        builder.append_path("latest", false);
        builder.set_query("action", "select");
        builder.url()
    }

    /// `…/names?action=BatchUpdates` (api v2)
    pub(crate) fn latest_version_batch_url(&self) -> Result<String> {
        let mut builder = self.names_builder(API_VERSION_V2);
        builder.set_query("action", "BatchUpdates");
        builder.url()
    }

    /// `…/names/{product}/versions/{version}`
    pub(crate) fn specific_version_url(&self, product: &str, version: &str) -> Result<String> {
        let mut builder = self.names_builder(API_VERSION_V1);
        builder.append_path(product, true);
        builder.append_path("versions", false);
        builder.append_path(version, true);
        builder.url()
    }

    /// `…/names/{product}/versions/{version}/files?action=GenerateDownloadInfo`
    pub(crate) fn download_info_url(&self, product: &str, version: &str) -> Result<String> {
        let mut builder = self.names_builder(API_VERSION_V1);
        builder.append_path(product, true);
        builder.append_path("versions", false);
        builder.append_path(version, true);
        builder.append_path("files", false);
        builder.set_query("action", "GenerateDownloadInfo");
        builder.url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain-name_1.0~x"), "plain-name_1.0~x");
        assert_eq!(escape_string("a/b c"), "a%2Fb%20c");
        assert_eq!(escape_string("100%"), "100%25");
        assert_eq!(escape_string("k=v&x"), "k%3Dv%26x");
    }

    #[test]
    fn test_basic_assembly() {
        let mut builder = UrlBuilder::new();
        builder.set_scheme(Scheme::Https);
        builder.set_host("example.com").unwrap();
        builder.set_path("api/v1/contents", false);
        builder.append_query("action", "select");
        assert_eq!(
            builder.url().unwrap(),
            "https://example.com/api/v1/contents?action=select"
        );
    }

    #[test]
    fn test_set_path_encode_keeps_separators() {
        let mut builder = UrlBuilder::new();
        builder.set_host("example.com").unwrap();
        builder.set_path("a b/c d", true);
        assert_eq!(builder.url().unwrap(), "https://example.com/a%20b/c%20d");
    }

    #[test]
    fn test_append_path_encode_escapes_separators() {
        let mut builder = UrlBuilder::new();
        builder.set_host("example.com").unwrap();
        builder.set_path("names", false);
        builder.append_path("a/b", true);
        assert_eq!(builder.url().unwrap(), "https://example.com/names/a%2Fb");
    }

    #[test]
    fn test_append_path_unencoded_keeps_separators() {
        let mut builder = UrlBuilder::new();
        builder.set_host("example.com").unwrap();
        builder.append_path("a/b", false);
        assert_eq!(builder.url().unwrap(), "https://example.com/a/b");
    }

    #[test]
    fn test_query_replace_and_append() {
        let mut builder = UrlBuilder::new();
        builder.set_host("example.com").unwrap();
        builder.append_query("a", "1");
        builder.append_query("b", "2");
        assert_eq!(builder.url().unwrap(), "https://example.com/?a=1&b=2");

        builder.set_query("only", "one");
        assert_eq!(builder.url().unwrap(), "https://example.com/?only=one");

        builder.reset_query();
        assert_eq!(builder.url().unwrap(), "https://example.com/");
    }

    #[test]
    fn test_bad_host_is_url_setup_failure() {
        let mut builder = UrlBuilder::new();
        let err = builder.set_host("exa mple.com").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConnectionUrlSetupFailed);
        assert!(err.to_string().contains("bad hostname"));

        let err = builder.set_host("").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConnectionUrlSetupFailed);
    }

    #[test]
    fn test_url_requires_host() {
        let builder = UrlBuilder::new();
        let err = builder.url().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConnectionUrlSetupFailed);
    }

    #[test]
    fn test_set_url_round_trip() {
        let mut builder = UrlBuilder::new();
        builder
            .set_url("https://example.com:8443/api/v1?x=1")
            .unwrap();
        assert_eq!(
            builder.url().unwrap(),
            "https://example.com:8443/api/v1?x=1"
        );

        builder.reset_query();
        builder.append_path("more", false);
        assert_eq!(builder.url().unwrap(), "https://example.com:8443/api/v1/more");
    }

    #[test]
    fn test_set_url_rejects_malformed_input() {
        let mut builder = UrlBuilder::new();
        for value in ["", "not a url", "ftp://example.com/x", "https://"] {
            let err = builder.set_url(value).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ConnectionUrlSetupFailed, "input: {value:?}");
        }
    }

    #[test]
    fn test_round_trip_components_survive_reparse() {
        let mut builder = UrlBuilder::new();
        builder.set_scheme(Scheme::Https);
        builder.set_host("test.example.com").unwrap();
        builder.set_path("api/v1", false);
        builder.append_path("product name+special", true);
        builder.append_query("action", "GenerateDownloadInfo");

        let parsed = url::Url::parse(&builder.url().unwrap()).unwrap();
        assert_eq!(parsed.host_str(), Some("test.example.com"));
        let segments: Vec<_> = parsed.path_segments().unwrap().collect();
        assert_eq!(segments, vec!["api", "v1", "product%20name%2Bspecial"]);
        assert_eq!(parsed.query(), Some("action=GenerateDownloadInfo"));
    }

    #[test]
    fn test_sfs_latest_version_url() {
        let builder = SfsUrlBuilder::new("myaccount", "default", "default").unwrap();
        assert_eq!(
            builder.latest_version_url("my product").unwrap(),
            "https://myaccount.api.cdp.microsoft.com/api/v1/contents/default/namespaces/default/names/my%20product/versions/latest?action=select"
        );
    }

    #[test]
    fn test_sfs_batch_url_uses_v2() {
        let builder = SfsUrlBuilder::new("myaccount", "default", "default").unwrap();
        assert_eq!(
            builder.latest_version_batch_url().unwrap(),
            "https://myaccount.api.cdp.microsoft.com/api/v2/contents/default/namespaces/default/names?action=BatchUpdates"
        );
    }

    #[test]
    fn test_sfs_specific_version_and_download_info_urls() {
        let builder = SfsUrlBuilder::new("acct", "inst", "ns").unwrap();
        assert_eq!(
            builder.specific_version_url("prod", "1.2.3").unwrap(),
            "https://acct.api.cdp.microsoft.com/api/v1/contents/inst/namespaces/ns/names/prod/versions/1.2.3"
        );
        assert_eq!(
            builder.download_info_url("prod", "1.2.3").unwrap(),
            "https://acct.api.cdp.microsoft.com/api/v1/contents/inst/namespaces/ns/names/prod/versions/1.2.3/files?action=GenerateDownloadInfo"
        );
    }

    #[test]
    fn test_sfs_urls_escape_caller_segments() {
        let builder = SfsUrlBuilder::new("acct", "inst", "ns").unwrap();
        let url = builder.specific_version_url("a/b", "1 0").unwrap();
        assert!(url.contains("/names/a%2Fb/versions/1%200"));
    }

    #[test]
    fn test_sfs_with_base_url_override() {
        let builder = SfsUrlBuilder::with_base_url("http://127.0.0.1:8080", "i", "n").unwrap();
        assert_eq!(
            builder.latest_version_batch_url().unwrap(),
            "http://127.0.0.1:8080/api/v2/contents/i/namespaces/n/names?action=BatchUpdates"
        );
    }
}
