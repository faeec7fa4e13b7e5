//! Byte-window reads over body files.
//!
//! Windows are cut at UTF-8 character boundaries: an incomplete trailing
//! character is left for the next window. A window too small to hold a
//! single character is widened to that one character.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use super::model::{BodyChunk, BodyFormat, BodySource};
use crate::{Error, Result};

/// Longest UTF-8 encoding minus one: the most a window is ever widened by.
const MAX_CHAR_EXTRA: u64 = 3;

/// Checks request parameters against the size of the selected body.
pub(super) fn validate(offset: u64, limit: u64, total_size: u64) -> Result<()> {
    if limit == 0 {
        return Err(Error::Validation("limit must be greater than zero".into()));
    }
    if offset > total_size {
        return Err(Error::Validation(format!(
            "offset {offset} is past the end of the body ({total_size} bytes)"
        )));
    }
    Ok(())
}

/// Reads one window of `path` without loading the rest of the file.
pub(super) fn read_file_window(path: &Path, offset: u64, limit: u64) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::new();
    file.take(limit.saturating_add(MAX_CHAR_EXTRA)).read_to_end(&mut buf)?;
    Ok(decode_window(&buf, limit))
}

/// Reads one window of an in-memory body.
pub(super) fn read_bytes_window(data: &[u8], offset: u64, limit: u64) -> (String, u64) {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
    let end = usize::try_from(offset.saturating_add(limit).saturating_add(MAX_CHAR_EXTRA))
        .unwrap_or(usize::MAX)
        .min(data.len());
    decode_window(&data[start..end], limit)
}

/// Decodes the first `limit` bytes of `buf` (which may hold a few bytes of
/// lookahead), returning the text and the number of bytes it consumed.
fn decode_window(buf: &[u8], limit: u64) -> (String, u64) {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let window = &buf[..limit.min(buf.len())];

    match std::str::from_utf8(window) {
        Ok(text) => (text.to_string(), window.len() as u64),
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => {
            let valid = e.valid_up_to();
            (String::from_utf8_lossy(&window[..valid]).into_owned(), valid as u64)
        }
        Err(e) if e.error_len().is_none() => {
            // Window holds only part of the first character; take all of it.
            let width = char_width(buf[0]).min(buf.len());
            match std::str::from_utf8(&buf[..width]) {
                Ok(text) => (text.to_string(), width as u64),
                Err(_) => (String::from_utf8_lossy(window).into_owned(), window.len() as u64),
            }
        }
        // Not valid UTF-8 at all, or the offset split a character.
        Err(_) => (String::from_utf8_lossy(window).into_owned(), window.len() as u64),
    }
}

const fn char_width(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Assembles the response for one window.
pub(super) fn chunk(
    format: BodyFormat,
    source: BodySource,
    total_size: u64,
    offset: u64,
    limit: u64,
    (content, length): (String, u64),
) -> BodyChunk {
    let remaining = total_size.saturating_sub(offset).saturating_sub(length);
    BodyChunk {
        content,
        format,
        source,
        total_size,
        offset,
        limit,
        length,
        remaining,
        is_complete: remaining == 0,
    }
}

/// Response for a message with no body in the requested format.
pub(super) fn empty(format: BodyFormat, limit: u64) -> BodyChunk {
    chunk(format, BodySource::None, 0, 0, limit, (String::new(), 0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn ascii_window_is_exact() {
        assert_eq!(read_bytes_window(b"hello world", 6, 3), ("wor".to_string(), 3));
    }

    #[test]
    fn incomplete_trailing_character_is_deferred() {
        let text = "ab\u{e9}cd"; // é is two bytes
        assert_eq!(read_bytes_window(text.as_bytes(), 0, 3), ("ab".to_string(), 2));
        assert_eq!(read_bytes_window(text.as_bytes(), 2, 3), ("\u{e9}c".to_string(), 3));
    }

    #[test]
    fn tiny_window_takes_one_whole_character() {
        let text = "\u{1f600}!";
        assert_eq!(read_bytes_window(text.as_bytes(), 0, 1), ("\u{1f600}".to_string(), 4));
    }

    #[test]
    fn file_window_reads_only_the_requested_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.txt");
        std::fs::write(&path, "0123456789").unwrap();
        assert_eq!(read_file_window(&path, 4, 3).unwrap(), ("456".to_string(), 3));
        assert_eq!(read_file_window(&path, 8, 10).unwrap(), ("89".to_string(), 2));
    }

    #[test]
    fn validation_rejects_zero_limit_and_offset_past_end() {
        assert!(matches!(validate(0, 0, 10), Err(Error::Validation(_))));
        assert!(matches!(validate(11, 5, 10), Err(Error::Validation(_))));
        assert!(validate(10, 5, 10).is_ok());
    }

    proptest! {
        #[test]
        fn windows_reassemble_the_body(body in "\\PC{0,200}", limit in 1u64..40) {
            let bytes = body.as_bytes();
            let total = bytes.len() as u64;
            let mut offset = 0;
            let mut joined = String::new();
            loop {
                let (content, length) = read_bytes_window(bytes, offset, limit);
                let chunk = chunk(BodyFormat::Text, BodySource::TextBody, total, offset, limit, (content, length));
                joined.push_str(&chunk.content);
                offset += chunk.length;
                if chunk.is_complete {
                    break;
                }
                prop_assert!(chunk.length > 0);
            }
            prop_assert_eq!(joined.len() as u64, total);
            prop_assert_eq!(joined, body);
        }
    }
}
