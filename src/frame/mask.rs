//!  Mask flag and key.

/// Payload mask with a 32-bit key.
///
/// Frames from a client always carry a key, frames from this server never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    Key([u8; 4]),
    None,
}

impl Mask {
    /// Whether the second header byte has its mask bit set.
    #[inline]
    pub const fn is_set(b: u8) -> bool { b & 0x80 == 0x80 }

    /// Get the flag byte.
    #[inline]
    pub const fn to_flag(&self) -> u8 {
        match self {
            Mask::Key(_) => 0x80,
            Mask::None => 0x00,
        }
    }
}

/// Mask the buffer, byte by byte.
#[inline]
pub fn apply_mask(key: [u8; 4], buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b ^= key[i & 0x03];
    }
}

/// Mask the buffer, 4 bytes at a time.
///
/// Same result as [`apply_mask`].
#[inline]
pub fn apply_mask4(key: [u8; 4], buf: &mut [u8]) {
    let key4 = u32::from_ne_bytes(key);
    let mut chunks = buf.chunks_exact_mut(4);

    for chunk in &mut chunks {
        let mut word = [0_u8; 4];
        word.copy_from_slice(chunk);
        let x = u32::from_ne_bytes(word) ^ key4;
        chunk.copy_from_slice(&x.to_ne_bytes());
    }

    // the tail starts on a multiple of 4, so the key lines up from index 0
    apply_mask(key, chunks.into_remainder());
}
