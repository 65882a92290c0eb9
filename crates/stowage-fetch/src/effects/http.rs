use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::data::ResponseMeta;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// An opened response: metadata plus the not-yet-consumed body.
///
/// The body can be consumed exactly once.
pub struct FetchResponse<E> {
    pub meta: ResponseMeta,
    pub body: BoxStream<'static, Result<Bytes, E>>,
}

impl<E> FetchResponse<E> {
    pub fn new(meta: ResponseMeta, body: BoxStream<'static, Result<Bytes, E>>) -> Self { Self { meta, body } }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait is the only network capability the transfer pipeline uses.
/// Implementations handle their own redirect following and timeout
/// configuration.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + 'static;

    /// Issue a GET for `url` and return its status, headers and body stream.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained (DNS failure,
    /// connection refused, ...). A non-success status is NOT an error at this
    /// level; callers inspect [`ResponseMeta::status`].
    fn fetch(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<FetchResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use reqwest::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName};

    use super::*;
    use crate::core::parse_length;

    const X_FILE_SIZE: &str = "x-file-size";

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Self { Self::default() }

        /// Wrap a preconfigured client.
        pub fn with_client(client: reqwest::Client) -> Self { Self { client } }
    }

    fn header<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
        headers.get(name).and_then(|value| value.to_str().ok())
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn fetch(&self, url: &str) -> Result<FetchResponse<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?;
            let headers = response.headers();
            let x_file_size = HeaderName::from_static(X_FILE_SIZE);

            let meta = ResponseMeta {
                status:           response.status().as_u16(),
                content_length:   header(headers, &CONTENT_LENGTH).and_then(parse_length),
                content_encoding: header(headers, &CONTENT_ENCODING).map(str::to_owned),
                content_type:     header(headers, &CONTENT_TYPE).map(str::to_owned),
                file_size:        header(headers, &x_file_size).and_then(parse_length),
            };

            Ok(FetchResponse::new(meta, Box::pin(response.bytes_stream())))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
