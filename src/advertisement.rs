//! Length-prefixed (TLV) advertisement parsing.
//!
//! A raw advertisement is a sequence of blocks, each introduced by a length
//! byte that counts the bytes following it. A zero length byte terminates the
//! advertisement; scanners commonly pad records with zeros.

use std::fmt::Write;

/// Size of the header skipped before the fixed-offset payload slice.
pub const HEADER_LEN: usize = 3;

/// Size of the fixed-offset payload slice handed to the decoder.
pub const PAYLOAD_SLICE_LEN: usize = 14;

/// Advertisements shorter than this carry no decodable payload.
/// Header (3 bytes) + timestamp (4 bytes) + message type (1 byte) + 1.
pub const MIN_PAYLOAD_SOURCE_LEN: usize = 9;

/// Separator placed between blocks in the hex view.
pub const BLOCK_SEPARATOR: char = ',';

/// One length-prefixed block of an advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvBlock<'a> {
    /// Declared content length (excludes the length byte itself)
    pub length: u8,
    /// Block content; shorter than `length` if the advertisement was cut off
    pub bytes: &'a [u8],
}

impl TlvBlock<'_> {
    /// AD type of the block (its first content byte).
    pub fn ad_type(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// True if the advertisement ended before the declared length.
    pub fn is_truncated(&self) -> bool {
        self.bytes.len() < usize::from(self.length)
    }
}

/// Result of splitting an advertisement into blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement<'a> {
    pub blocks: Vec<TlvBlock<'a>>,
    /// Lower-case hex of every scanned byte, blocks separated by [`BLOCK_SEPARATOR`]
    pub hex_view: String,
}

fn push_hex(out: &mut String, bytes: &[u8]) {
    for byte in bytes {
        // Writing into a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
}

/// Split `raw` into TLV blocks and build its hex view.
///
/// Parsing stops at the first zero length byte or at the end of the buffer.
/// A block whose declared length runs past the end is truncated to the
/// remaining bytes and ends the scan.
pub fn parse(raw: &[u8]) -> Advertisement<'_> {
    let mut blocks = Vec::new();
    let mut hex_view = String::with_capacity(raw.len() * 3);
    let mut offset = 0;

    while offset < raw.len() {
        let length = raw[offset];
        if length == 0 {
            break;
        }

        let start = offset + 1;
        let end = (start + usize::from(length)).min(raw.len());

        if offset > 0 {
            hex_view.push(BLOCK_SEPARATOR);
        }
        push_hex(&mut hex_view, &raw[offset..end]);

        blocks.push(TlvBlock {
            length,
            bytes: &raw[start..end],
        });
        offset = start + usize::from(length);
    }

    Advertisement { blocks, hex_view }
}

/// Extract the fixed-offset payload slice used for structured decoding.
///
/// Returns `None` when `raw` is shorter than [`MIN_PAYLOAD_SOURCE_LEN`].
/// Otherwise returns up to [`PAYLOAD_SLICE_LEN`] bytes after the header; the
/// decoder validates the length it actually needs.
pub fn payload_slice(raw: &[u8]) -> Option<&[u8]> {
    if raw.len() < MIN_PAYLOAD_SOURCE_LEN {
        return None;
    }
    let end = raw.len().min(HEADER_LEN + PAYLOAD_SLICE_LEN);
    Some(&raw[HEADER_LEN..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_splits_blocks() {
        let raw = [0x02, 0x01, 0x06, 0x03, 0xFF, 0x99, 0x04];
        let adv = parse(&raw);

        assert_eq!(adv.blocks.len(), 2);
        assert_eq!(adv.blocks[0].length, 2);
        assert_eq!(adv.blocks[0].bytes, &[0x01, 0x06]);
        assert_eq!(adv.blocks[1].ad_type(), Some(0xFF));
        assert_eq!(adv.blocks[1].bytes, &[0xFF, 0x99, 0x04]);
        assert_eq!(adv.hex_view, "020106,03ff9904");
    }

    #[test]
    fn test_parse_stops_at_zero_length_padding() {
        let raw = [0x02, 0x01, 0x06, 0x00, 0x00, 0x00, 0x05];
        let adv = parse(&raw);

        assert_eq!(adv.blocks.len(), 1);
        assert_eq!(adv.hex_view, "020106");
    }

    #[test]
    fn test_parse_leading_zero_yields_nothing() {
        let adv = parse(&[0x00, 0x02, 0x01, 0x06]);
        assert!(adv.blocks.is_empty());
        assert!(adv.hex_view.is_empty());
    }

    #[test]
    fn test_parse_empty_buffer() {
        let adv = parse(&[]);
        assert!(adv.blocks.is_empty());
        assert!(adv.hex_view.is_empty());
    }

    #[test]
    fn test_parse_truncates_overlong_block() {
        let raw = [0x02, 0x01, 0x06, 0x10, 0xAA, 0xBB];
        let adv = parse(&raw);

        assert_eq!(adv.blocks.len(), 2);
        let last = adv.blocks[1];
        assert_eq!(last.length, 0x10);
        assert_eq!(last.bytes, &[0xAA, 0xBB]);
        assert!(last.is_truncated());
        assert!(!adv.blocks[0].is_truncated());
        assert_eq!(adv.hex_view, "020106,10aabb");
    }

    #[test]
    fn test_payload_slice_requires_nine_bytes() {
        assert_eq!(payload_slice(&[0u8; 8]), None);
        let raw: Vec<u8> = (0..9).collect();
        assert_eq!(payload_slice(&raw), Some(&raw[3..9]));
    }

    #[test]
    fn test_payload_slice_is_capped_at_fourteen_bytes() {
        let raw: Vec<u8> = (0..31).collect();
        let slice = payload_slice(&raw).unwrap();
        assert_eq!(slice.len(), PAYLOAD_SLICE_LEN);
        assert_eq!(slice[0], 3);
        assert_eq!(slice[13], 16);
    }

    proptest! {
        #[test]
        fn parse_never_reads_past_input(raw in prop::collection::vec(any::<u8>(), 0..64)) {
            let adv = parse(&raw);
            let consumed: usize = adv.blocks.iter().map(|b| 1 + b.bytes.len()).sum();
            prop_assert!(consumed <= raw.len());
            // Two hex digits per scanned byte plus one separator between blocks.
            let separators = adv.blocks.len().saturating_sub(1);
            prop_assert_eq!(adv.hex_view.len(), consumed * 2 + separators);
        }

        #[test]
        fn payload_slice_stays_in_bounds(raw in prop::collection::vec(any::<u8>(), 0..40)) {
            match payload_slice(&raw) {
                None => prop_assert!(raw.len() < MIN_PAYLOAD_SOURCE_LEN),
                Some(slice) => {
                    prop_assert!(slice.len() <= PAYLOAD_SLICE_LEN);
                    prop_assert_eq!(slice, &raw[HEADER_LEN..HEADER_LEN + slice.len()]);
                }
            }
        }
    }
}
