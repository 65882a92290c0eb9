/// One transfer invocation, owned by the caller.
///
/// Two requests with the same [`key`](Self::key) are the same logical
/// resource: while one is in flight, starting the other attaches to it.
///
/// # Examples
///
/// ```
/// use stowage_fetch::TransferRequest;
///
/// let request = TransferRequest::new("https://cdn.example.com/f/42?sig=abc").with_key("file-42");
/// assert_eq!(request.key(), "file-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub url: String,
    key:     Option<String>,
}

impl TransferRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: None,
        }
    }

    /// Override the single-flight key, e.g. with a resource id when URLs
    /// carry per-request signatures.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The single-flight key. Defaults to the URL.
    pub fn key(&self) -> &str { self.key.as_deref().unwrap_or(&self.url) }
}
