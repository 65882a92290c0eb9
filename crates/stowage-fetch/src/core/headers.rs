use crate::data::ResponseMeta;

/// Parse a length header value. Surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use stowage_fetch::core::parse_length;
///
/// assert_eq!(parse_length(" 1000 "), Some(1000));
/// assert_eq!(parse_length("-1"), None);
/// ```
pub fn parse_length(value: &str) -> Option<u64> { value.trim().parse().ok() }

/// The payload size progress should be measured against.
///
/// `X-File-Size` wins when present, because it is what servers send next to
/// a compressed body. Without it, `Content-Length` is only trusted for
/// identity-encoded bodies: under a content encoding it counts encoded bytes
/// while the body stream yields decoded ones.
pub fn total_hint(meta: &ResponseMeta) -> Option<u64> {
    if meta.file_size.is_some() {
        return meta.file_size;
    }
    let encoded = meta
        .content_encoding
        .as_deref()
        .is_some_and(|encoding| !encoding.trim().eq_ignore_ascii_case("identity"));
    if encoded { None } else { meta.content_length }
}
