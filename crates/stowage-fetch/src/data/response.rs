use bytes::Bytes;

/// Response metadata captured when a transfer is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status code.
    pub status: u16,

    /// `Content-Length`. Counts encoded bytes when a content encoding is set.
    pub content_length: Option<u64>,

    /// `Content-Encoding`, if the payload is transport-compressed.
    pub content_encoding: Option<String>,

    /// `Content-Type`.
    pub content_type: Option<String>,

    /// `X-File-Size`: the decoded payload size, sent alongside compressed
    /// bodies.
    pub file_size: Option<u64>,
}

impl ResponseMeta {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    #[must_use]
    pub fn content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    /// 2xx.
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// One pull from a [`ChunkReader`](crate::ChunkReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReadResult {
    pub bytes: Option<Bytes>,
    pub done:  bool,
}

impl ChunkReadResult {
    pub fn chunk(bytes: Bytes) -> Self {
        Self {
            bytes: Some(bytes),
            done:  false,
        }
    }

    pub fn done() -> Self {
        Self {
            bytes: None,
            done:  true,
        }
    }
}
