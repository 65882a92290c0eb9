use bytes::{Bytes, BytesMut};

/// Concatenate chunks in arrival order.
///
/// A single chunk is returned as is, without copying.
pub fn assemble(chunks: Vec<Bytes>) -> Bytes {
    if chunks.len() == 1 {
        return chunks.into_iter().next().unwrap_or_default();
    }
    let len = chunks.iter().map(Bytes::len).sum();
    let mut buffer = BytesMut::with_capacity(len);
    for chunk in &chunks {
        buffer.extend_from_slice(chunk);
    }
    buffer.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_order() {
        let chunks = vec![Bytes::from_static(b"ab"), Bytes::from_static(b""), Bytes::from_static(b"cde")];
        assert_eq!(assemble(chunks), Bytes::from_static(b"abcde"));
    }

    #[test]
    fn test_empty_and_single() {
        assert!(assemble(Vec::new()).is_empty());
        assert_eq!(assemble(vec![Bytes::from_static(b"xyz")]), Bytes::from_static(b"xyz"));
    }
}
