/// Write cursor over a borrowed buffer.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self { Writer { buf, pos: 0 } }

    #[inline]
    pub const fn pos(&self) -> usize { self.pos }

    #[inline]
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// Copy `src` at the cursor, or fail with `f()` if it does not fit.
    #[inline]
    pub fn write_or_err<F, E>(&mut self, src: &[u8], f: F) -> Result<usize, E>
    where
        F: FnOnce() -> E,
    {
        if self.remaining() < src.len() {
            return Err(f());
        }
        let end = self.pos + src.len();
        self.buf[self.pos..end].copy_from_slice(src);
        self.pos = end;
        Ok(src.len())
    }
}
