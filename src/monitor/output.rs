use std::io::{self, Write};

/// Translates `\n` into `\r\n` for terminals in raw mode.
pub struct CrlfWriter<W: Write> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if byte == b'\n' {
                self.inner.write_all(&buf[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_writer() {
        let mut out = CrlfWriter::new(Vec::new());
        write!(out, "one\ntwo\n").unwrap();
        write!(out, "three").unwrap();
        assert_eq!(out.into_inner(), b"one\r\ntwo\r\nthree");
    }
}
