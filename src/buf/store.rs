/// Fixed-capacity byte buffer.
///
/// Bytes are appended at `wr` and consumed from the front. Consuming
/// shifts the remaining bytes down so the free space is always a single
/// contiguous tail.
#[derive(Debug, Clone)]
pub struct Store<const N: usize> {
    wr: usize,
    buf: [u8; N],
}

impl<const N: usize> Default for Store<N> {
    fn default() -> Self { Self::new() }
}

impl<const N: usize> Store<N> {
    #[inline]
    pub const fn new() -> Self { Self { wr: 0, buf: [0; N] } }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.wr == 0 }

    #[inline]
    pub const fn is_full(&self) -> bool { self.wr == N }

    /// Buffered bytes.
    #[inline]
    pub fn read(&self) -> &[u8] { &self.buf[..self.wr] }

    /// Buffered bytes, mutable.
    #[inline]
    pub fn read_mut(&mut self) -> &mut [u8] { &mut self.buf[..self.wr] }

    /// Free space after the buffered bytes.
    #[inline]
    pub fn write(&mut self) -> &mut [u8] { &mut self.buf[self.wr..] }

    /// Mark `n` bytes of [`write`](Self::write) as filled.
    #[inline]
    pub fn advance_wr_pos(&mut self, n: usize) { self.wr = std::cmp::min(self.wr + n, N); }

    /// Append as much of `data` as fits, returning the count copied.
    #[cfg(test)]
    pub fn extend(&mut self, data: &[u8]) -> usize {
        let n = std::cmp::min(data.len(), N - self.wr);
        self.buf[self.wr..self.wr + n].copy_from_slice(&data[..n]);
        self.wr += n;
        n
    }

    /// Drop `n` bytes from the front.
    pub fn consume(&mut self, n: usize) {
        if n >= self.wr {
            self.wr = 0;
            return;
        }
        self.buf.copy_within(n..self.wr, 0);
        self.wr -= n;
    }

    #[inline]
    pub fn reset(&mut self) { self.wr = 0; }
}
