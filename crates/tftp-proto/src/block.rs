//! Block numbering and the last-block rule.

use std::fmt;

/// Payload bytes in a full block.
pub const BLOCK_SIZE: usize = 512;

/// Most blocks a single read transfer may use before ids would repeat.
pub const MAX_BLOCKS: u64 = u16::MAX as u64;

/// 16-bit block sequence number.
///
/// Wraps modulo 65536: the block after 65535 is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(u16);

impl BlockId {
    /// Block 0: the write-session acknowledgement of the request itself.
    pub const ZERO: Self = Self(0);

    /// First data block of a read session.
    pub const FIRST: Self = Self(1);

    /// Largest block id before wrapping.
    pub const MAX: Self = Self(u16::MAX);

    /// Wrap a raw block id.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Raw block id.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// The following block id, wrapping at 65536.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<u16> for BlockId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl From<BlockId> for u16 {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Whether a payload of `len` bytes ends the transfer.
///
/// Only a full block (exactly [`BLOCK_SIZE`]) means more blocks follow.
pub const fn is_last_block(len: usize) -> bool {
    len < BLOCK_SIZE
}

/// Number of data blocks needed to send `len` bytes.
///
/// Always at least one, because the transfer ends with a short block; a file
/// whose size is a multiple of the block size needs a trailing empty block.
pub const fn blocks_required(len: u64) -> u64 {
    len / BLOCK_SIZE as u64 + 1
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn next_wraps() {
        assert_eq!(BlockId::MAX.next(), BlockId::ZERO);
        assert_eq!(BlockId::ZERO.next(), BlockId::FIRST);
    }

    #[test]
    fn block_counts() {
        assert_eq!(blocks_required(0), 1);
        assert_eq!(blocks_required(511), 1);
        assert_eq!(blocks_required(512), 2);
        assert_eq!(blocks_required(1000), 2);
        assert_eq!(blocks_required(1024), 3);
        assert_eq!(blocks_required(MAX_BLOCKS * BLOCK_SIZE as u64 - 1), MAX_BLOCKS);
        assert_eq!(blocks_required(MAX_BLOCKS * BLOCK_SIZE as u64), MAX_BLOCKS + 1);
    }

    proptest! {
        #[test]
        fn short_blocks_are_last(len in 0usize..BLOCK_SIZE) {
            prop_assert!(is_last_block(len));
        }

        #[test]
        fn full_block_is_never_last(extra in 0usize..16) {
            prop_assert!(!is_last_block(BLOCK_SIZE + extra));
        }
    }
}
