use super::error::ProtocolError;
use std::io::{self, Read, Write};

/// Upper bound for any single length-prefixed field. Lengths above this are
/// rejected before allocating so a corrupt prefix cannot exhaust memory.
pub const MAX_FIELD_LEN: usize = 256 * 1024 * 1024;

/// Reads protocol primitives from a raw byte stream.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Read the next action code. Returns `None` only when the stream ends
    /// cleanly on a frame boundary; a partial code is a truncation.
    pub fn read_action_code(&mut self) -> Result<Option<i32>, ProtocolError> {
        let mut buf = [0u8; 4];
        let got = self.fill_partial(&mut buf)?;
        match got {
            0 => Ok(None),
            4 => Ok(Some(i32::from_le_bytes(buf))),
            _ => Err(ProtocolError::Truncated {
                what: "action code",
                expected: 4,
                got,
            }),
        }
    }

    pub fn read_i32(&mut self, what: &'static str) -> Result<i32, ProtocolError> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf, what)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_bool(&mut self, what: &'static str) -> Result<bool, ProtocolError> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf, what)?;
        Ok(buf[0] != 0)
    }

    /// Read a non-negative `i32` count or length, bounded by [`MAX_FIELD_LEN`].
    pub fn read_len(&mut self, what: &'static str) -> Result<usize, ProtocolError> {
        let len = self.read_i32(what)?;
        if len < 0 {
            return Err(ProtocolError::NegativeLength { what, len });
        }
        let len = len as usize;
        if len > MAX_FIELD_LEN {
            return Err(ProtocolError::LengthTooLarge {
                what,
                len,
                max: MAX_FIELD_LEN,
            });
        }
        Ok(len)
    }

    pub fn read_string(&mut self, what: &'static str) -> Result<String, ProtocolError> {
        let bytes = self.read_bytes(what)?;
        String::from_utf8(bytes).map_err(|source| ProtocolError::InvalidUtf8 { what, source })
    }

    pub fn read_bytes(&mut self, what: &'static str) -> Result<Vec<u8>, ProtocolError> {
        let len = self.read_len(what)?;
        let mut out = Vec::new();
        self.inner.by_ref().take(len as u64).read_to_end(&mut out)?;
        if out.len() < len {
            return Err(ProtocolError::Truncated {
                what,
                expected: len,
                got: out.len(),
            });
        }
        Ok(out)
    }

    fn fill(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), ProtocolError> {
        let got = self.fill_partial(buf)?;
        if got < buf.len() {
            return Err(ProtocolError::Truncated {
                what,
                expected: buf.len(),
                got,
            });
        }
        Ok(())
    }

    fn fill_partial(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let mut got = 0;
        while got < buf.len() {
            match self.inner.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(got)
    }
}

/// Writes protocol primitives. Values are staged in memory and only reach the
/// underlying stream on [`FrameWriter::flush_frame`], so a logical message is
/// never observed half-written.
pub struct FrameWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    pub fn put_i32(&mut self, value: i32) {
        self.pending.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_bool(&mut self, value: bool) {
        self.pending.push(u8::from(value));
    }

    pub fn put_len(&mut self, what: &'static str, len: usize) -> Result<(), ProtocolError> {
        if len > MAX_FIELD_LEN {
            return Err(ProtocolError::LengthTooLarge {
                what,
                len,
                max: MAX_FIELD_LEN,
            });
        }
        self.put_i32(len as i32);
        Ok(())
    }

    pub fn put_string(&mut self, what: &'static str, value: &str) -> Result<(), ProtocolError> {
        self.put_bytes(what, value.as_bytes())
    }

    pub fn put_bytes(&mut self, what: &'static str, value: &[u8]) -> Result<(), ProtocolError> {
        self.put_len(what, value.len())?;
        self.pending.extend_from_slice(value);
        Ok(())
    }

    /// Append bytes with no length prefix (image magic headers).
    pub fn put_raw(&mut self, value: &[u8]) {
        self.pending.extend_from_slice(value);
    }

    /// Push the staged message to the stream in one write and flush it.
    pub fn flush_frame(&mut self) -> Result<(), ProtocolError> {
        if !self.pending.is_empty() {
            self.inner.write_all(&self.pending)?;
            self.pending.clear();
        }
        self.inner.flush()?;
        Ok(())
    }

    /// Flush whatever is staged and hand back the underlying stream.
    pub fn finish(mut self) -> Result<W, ProtocolError> {
        self.flush_frame()?;
        Ok(self.inner)
    }
}
