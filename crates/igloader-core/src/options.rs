use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Settings for one upload run.
#[derive(Clone, Default)]
pub struct UploadOptions {
    /// OAuth bearer token sent with every request.
    pub access_token: Option<String>,

    /// Per-request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,

    /// Resource types that are classified but never sent.
    pub skip_types: BTreeSet<String>,

    /// Stop after the first failed resource. A 422 response (the server
    /// rejected the content) does not stop the run.
    pub fail_fast: bool,
}

impl UploadOptions {
    /// Creates options with no token, no timeout and nothing skipped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_skip_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_types.extend(types.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn skips(&self, resource_type: &str) -> bool {
        self.skip_types.contains(resource_type)
    }

    /// The token reduced to its first three characters, for banners.
    pub fn masked_token(&self) -> Option<String> {
        self.access_token
            .as_deref()
            .map(|t| format!("{}...", t.chars().take(3).collect::<String>()))
    }
}

// Keep the token out of debug output.
impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("access_token", &self.masked_token())
            .field("request_timeout", &self.request_timeout)
            .field("skip_types", &self.skip_types)
            .field("fail_fast", &self.fail_fast)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = UploadOptions::default();
        assert!(options.access_token.is_none());
        assert!(options.request_timeout.is_none());
        assert!(options.skip_types.is_empty());
        assert!(!options.fail_fast);
    }

    #[test]
    fn test_builder() {
        let options = UploadOptions::new()
            .with_access_token(Some("secret-token".into()))
            .with_request_timeout(Duration::from_secs(30))
            .with_skip_types(["ImplementationGuide"])
            .with_fail_fast(true);

        assert_eq!(options.access_token.as_deref(), Some("secret-token"));
        assert_eq!(options.request_timeout, Some(Duration::from_secs(30)));
        assert!(options.skips("ImplementationGuide"));
        assert!(!options.skips("ValueSet"));
        assert!(options.fail_fast);
    }

    #[test]
    fn test_empty_token_is_no_token() {
        let options = UploadOptions::new().with_access_token(Some(String::new()));
        assert!(options.access_token.is_none());
        assert!(options.masked_token().is_none());
    }

    #[test]
    fn test_token_is_masked() {
        let options = UploadOptions::new().with_access_token(Some("abcdef123".into()));
        assert_eq!(options.masked_token().as_deref(), Some("abc..."));

        let debug = format!("{options:?}");
        assert!(!debug.contains("abcdef123"));
        assert!(debug.contains("abc..."));
    }
}
