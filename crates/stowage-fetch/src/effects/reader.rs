use std::fmt::Display;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::core::total_hint;
use crate::data::{ChunkReadResult, ResponseMeta, TransferRequest};
use crate::effects::http::{BoxStream, HttpClient};
use crate::error::{Error, Result};

/// Pull-based reader over one response body.
///
/// Dropping the reader releases the underlying connection.
pub struct ChunkReader<E> {
    meta: ResponseMeta,
    body: BoxStream<'static, std::result::Result<Bytes, E>>,
    done: bool,
}

impl<E: Display> ChunkReader<E> {
    /// Open `request` with `client`.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] if no response arrived, [`Error::Status`] if the
    /// server answered with a non-success status.
    pub async fn open<C>(client: &C, request: &TransferRequest) -> Result<Self>
    where
        C: HttpClient<Error = E>,
    {
        let response = client.fetch(&request.url).await.map_err(Error::transport)?;
        if !response.meta.is_success() {
            debug!(url = %request.url, status = response.meta.status, "transfer rejected");
            return Err(Error::Status(response.meta.status));
        }
        Ok(Self::new(response.meta, response.body))
    }

    pub fn new(meta: ResponseMeta, body: BoxStream<'static, std::result::Result<Bytes, E>>) -> Self {
        Self {
            meta,
            body,
            done: false,
        }
    }

    pub fn meta(&self) -> &ResponseMeta { &self.meta }

    /// Expected payload size for progress, see [`total_hint`].
    pub fn total_hint(&self) -> Option<u64> { total_hint(&self.meta) }

    /// Read the next chunk.
    ///
    /// Callers stop at the first `done` result; pulling again keeps
    /// answering `done` without touching the body.
    pub async fn pull(&mut self) -> Result<ChunkReadResult> {
        if self.done {
            return Ok(ChunkReadResult::done());
        }
        match self.body.next().await {
            Some(Ok(bytes)) => Ok(ChunkReadResult::chunk(bytes)),
            Some(Err(e)) => Err(Error::transport(e)),
            None => {
                self.done = true;
                Ok(ChunkReadResult::done())
            }
        }
    }

    /// The pull loop as a stream of chunks. It ends after `done` or after
    /// the first error, which is yielded.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send
    where
        E: Send,
    {
        futures_util::stream::unfold(Some(self), |reader| async move {
            let mut reader = reader?;
            match reader.pull().await {
                Ok(ChunkReadResult { bytes: Some(bytes), .. }) => Some((Ok(bytes), Some(reader))),
                Ok(_) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn body(
        items: Vec<std::result::Result<&'static str, &'static str>>,
    ) -> BoxStream<'static, std::result::Result<Bytes, &'static str>> {
        Box::pin(stream::iter(items.into_iter().map(|item| item.map(|s| Bytes::from_static(s.as_bytes())))))
    }

    #[tokio::test]
    async fn test_pull_until_done() {
        let mut reader = ChunkReader::new(ResponseMeta::new(200), body(vec![Ok("ab"), Ok("c")]));

        assert_eq!(reader.pull().await, Ok(ChunkReadResult::chunk(Bytes::from_static(b"ab"))));
        assert_eq!(reader.pull().await, Ok(ChunkReadResult::chunk(Bytes::from_static(b"c"))));
        assert_eq!(reader.pull().await, Ok(ChunkReadResult::done()));
        assert_eq!(reader.pull().await, Ok(ChunkReadResult::done()));
    }

    #[tokio::test]
    async fn test_pull_error_is_transport() {
        let mut reader = ChunkReader::new(ResponseMeta::new(200), body(vec![Ok("ab"), Err("reset by peer")]));

        assert!(reader.pull().await.is_ok());
        assert_eq!(reader.pull().await, Err(Error::Transport("reset by peer".to_string())));
    }

    #[tokio::test]
    async fn test_stream_ends_after_error() {
        let reader = ChunkReader::new(
            ResponseMeta::new(200),
            body(vec![Ok("ab"), Err("reset by peer"), Ok("never")]),
        );

        let items: Vec<_> = reader.into_stream().collect().await;

        assert_eq!(items, vec![
            Ok(Bytes::from_static(b"ab")),
            Err(Error::Transport("reset by peer".to_string())),
        ]);
    }

    #[test]
    fn test_total_hint_from_meta() {
        let meta = ResponseMeta::new(200).content_length(10).content_encoding("gzip").file_size(30);
        let reader = ChunkReader::new(meta, body(vec![]));
        assert_eq!(reader.total_hint(), Some(30));
    }
}
