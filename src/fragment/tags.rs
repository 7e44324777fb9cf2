//! Encoding of the tag block carried by the final fragment.
//!
//! Tags are UTF-8 strings separated by a single zero byte with no trailing
//! separator. Order is preserved in both directions.

use std::str;

use bytes::{BufMut, Bytes, BytesMut};

use super::FragmentationError;

const SEPARATOR: u8 = 0;

/// Encoded size of `tags` without allocating.
#[must_use]
pub fn encoded_len<S: AsRef<str>>(tags: &[S]) -> usize {
    let separators = tags.len().saturating_sub(1);
    tags.iter().map(|tag| tag.as_ref().len()).sum::<usize>() + separators
}

/// Encode `tags` into a tag block.
///
/// # Errors
///
/// Returns [`FragmentationError::InvalidTag`] when a tag is empty or contains
/// the separator byte, since neither survives the encoding.
pub fn encode<S: AsRef<str>>(tags: &[S]) -> Result<Bytes, FragmentationError> {
    let mut block = BytesMut::with_capacity(encoded_len(tags));
    for (position, tag) in tags.iter().enumerate() {
        let bytes = tag.as_ref().as_bytes();
        if bytes.is_empty() || bytes.contains(&SEPARATOR) {
            return Err(FragmentationError::InvalidTag { position });
        }
        if position > 0 {
            block.put_u8(SEPARATOR);
        }
        block.put_slice(bytes);
    }
    Ok(block.freeze())
}

/// Parse a tag block back into its tags.
///
/// An empty block yields no tags.
///
/// # Errors
///
/// Returns the UTF-8 error of the first tag that is not valid UTF-8.
pub fn decode(block: &[u8]) -> Result<Vec<String>, str::Utf8Error> {
    if block.is_empty() {
        return Ok(Vec::new());
    }
    block
        .split(|byte| *byte == SEPARATOR)
        .map(|tag| str::from_utf8(tag).map(str::to_owned))
        .collect()
}
