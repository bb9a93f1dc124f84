/// Read cursor over a borrowed buffer.
///
/// Each read either returns the requested bytes and advances, or returns
/// `None` and leaves the cursor untouched.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    #[inline]
    pub const fn new(buf: &'a [u8]) -> Self { Self { buf, pos: 0 } }

    /// Number of bytes consumed so far.
    #[inline]
    pub const fn pos(&self) -> usize { self.pos }

    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let arr: [u8; N] = self.buf.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(arr)
    }
}
