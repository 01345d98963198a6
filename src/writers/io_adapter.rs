//! `std::io::Write` view of a [`Writer`]

use crate::core::{Level, Writer};
use std::io;

/// Forwards every `io::Write::write` to the wrapped writer at [`Level::MAX`]
///
/// A successful forward reports the whole input as written, since writers
/// take a record whole or fail.
#[derive(Debug)]
pub struct IoAdapter<W> {
    inner: W,
}

/// Wrap a writer for APIs that want `std::io::Write`
pub fn to_io_writer<W: Writer>(writer: W) -> IoAdapter<W> {
    IoAdapter { inner: writer }
}

impl<W: Writer> IoAdapter<W> {
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Close the wrapped writer
    pub fn close(&self) -> io::Result<()> {
        self.inner.close().map_err(io::Error::from)
    }
}

impl<W: Writer> io::Write for IoAdapter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(Level::MAX, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(io::Error::from)
    }
}
