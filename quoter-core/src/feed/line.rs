//! Line reassembly over an arbitrary byte stream
//!
//! Reads from a pipe are not line-aligned: a record can be split across any
//! number of reads. `LineAssembler` keeps the partial line between calls in a
//! fixed-size buffer, so memory stays bounded no matter what the producer
//! writes.
//!
//! - `\n` is the only terminator
//! - `\r` bytes are stripped wherever they appear
//! - bytes beyond the capacity are dropped; the line still ends at its `\n`

/// Default maximum line length in bytes
pub const MAX_LINE_LEN: usize = 2048;

/// Bounded line buffer that survives across reads
///
/// `N` is the maximum retained line length. Lines longer than `N` are
/// truncated to their first `N` bytes (after `\r` stripping).
pub struct LineAssembler<const N: usize = MAX_LINE_LEN> {
    buf: [u8; N],
    len: usize,
    /// Set when the current line has lost bytes to truncation
    overflowed: bool,
    /// Completed lines that were truncated
    truncated_lines: u64,
}

impl<const N: usize> LineAssembler<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            overflowed: false,
            truncated_lines: 0,
        }
    }

    /// Run one chunk through the assembler
    ///
    /// The returned cursor yields every line completed by this chunk; bytes
    /// after the last `\n` stay buffered for the next call. Dropping the
    /// cursor early is fine: unconsumed bytes are simply discarded along
    /// with the chunk.
    #[inline]
    pub fn feed<'a>(&'a mut self, chunk: &'a [u8]) -> Lines<'a, N> {
        Lines {
            assembler: self,
            chunk,
            pos: 0,
            emitted: false,
        }
    }

    /// Bytes of the line currently being assembled
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of completed lines that exceeded the capacity
    pub fn truncated_lines(&self) -> u64 {
        self.truncated_lines
    }

    /// Discard any partial line
    pub fn reset(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if b == b'\r' {
                continue;
            }
            if self.len < N {
                self.buf[self.len] = b;
                self.len += 1;
            } else {
                self.overflowed = true;
            }
        }
    }

    #[inline(always)]
    fn finish_line(&mut self) {
        if self.overflowed {
            self.truncated_lines += 1;
        }
        self.len = 0;
        self.overflowed = false;
    }
}

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over the lines completed by one chunk
///
/// Each returned line borrows the assembler's buffer and is valid until
/// the next call to `next_line`.
pub struct Lines<'a, const N: usize> {
    assembler: &'a mut LineAssembler<N>,
    chunk: &'a [u8],
    pos: usize,
    /// The buffer holds a line handed out by the previous call
    emitted: bool,
}

impl<'a, const N: usize> Lines<'a, N> {
    /// Next completed line, or `None` once the chunk is exhausted
    #[inline]
    pub fn next_line(&mut self) -> Option<&[u8]> {
        if self.emitted {
            self.assembler.finish_line();
            self.emitted = false;
        }

        let chunk = self.chunk;
        let rest = &chunk[self.pos..];
        if rest.is_empty() {
            return None;
        }

        match rest.iter().position(|&b| b == b'\n') {
            Some(end) => {
                self.assembler.extend(&rest[..end]);
                self.pos += end + 1;
                self.emitted = true;
                Some(self.assembler.pending())
            }
            None => {
                self.assembler.extend(rest);
                self.pos = chunk.len();
                None
            }
        }
    }

    /// Visit every remaining line in this chunk
    #[inline]
    pub fn for_each(mut self, mut f: impl FnMut(&[u8])) {
        while let Some(line) = self.next_line() {
            f(line);
        }
    }
}

impl<const N: usize> Drop for Lines<'_, N> {
    fn drop(&mut self) {
        if self.emitted {
            self.assembler.finish_line();
        }
    }
}
