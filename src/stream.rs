//! Narrow stream capabilities consumed by the codec.
//!
//! The writer and reader touch their underlying byte streams only through
//! [`Sink`] and [`Source`]. The required capabilities are the mandatory
//! trait methods; the optional ones (flush, sync, position, seek) have
//! defaults that either do nothing or report their own absence, so a plain
//! pipe and a regular file go through the same code path.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use crate::error::{RecordLogError, Result};

/// A byte sink the writer appends blocks to.
pub trait Sink {
    /// Appends bytes from `buf`, returning how many were consumed.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Appends the whole of `buf`.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink accepted no bytes",
                    ));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Pushes OS-buffered data towards the device. Sinks without the
    /// capability keep the default no-op.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Durability barrier (fsync or equivalent). Sinks without the
    /// capability keep the default no-op.
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// The sink's current absolute byte position, used to anchor reported
    /// record offsets. `None` when the sink cannot tell.
    fn position(&mut self) -> Option<u64> {
        None
    }
}

/// A byte source the reader pulls blocks from.
pub trait Source {
    /// Reads up to `buf.len()` bytes. `Ok(0)` means the true end of the
    /// stream; short reads are fine, the codec retries them.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Repositions the source to `offset` bytes from its start. Sources
    /// without the capability keep the default, which reports
    /// [`NotSeekable`](RecordLogError::NotSeekable).
    fn seek(&mut self, offset: u64) -> Result<()> {
        let _ = offset;
        Err(RecordLogError::NotSeekable)
    }
}

impl Sink for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn position(&mut self) -> Option<u64> {
        self.stream_position().ok()
    }
}

impl Source for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        Seek::seek(self, SeekFrom::Start(offset))?;
        Ok(())
    }
}

/// An append-only in-memory sink.
impl Sink for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn position(&mut self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

impl Sink for Cursor<Vec<u8>> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn position(&mut self) -> Option<u64> {
        Some(Cursor::position(self))
    }
}

impl<T: AsRef<[u8]>> Source for Cursor<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        Seek::seek(self, SeekFrom::Start(offset))?;
        Ok(())
    }
}

/// A plain byte slice reads as a non-seekable stream, which is handy for
/// exercising pipe-like sources.
impl Source for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }

    fn position(&mut self) -> Option<u64> {
        (**self).position()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }

    fn position(&mut self) -> Option<u64> {
        (**self).position()
    }
}

impl<S: Source + ?Sized> Source for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        (**self).seek(offset)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        (**self).seek(offset)
    }
}

/// Adapter exposing any [`io::Write`] as a [`Sink`] with none of the
/// optional capabilities.
pub struct WriteSink<W: Write>(W);

impl<W: Write> WriteSink<W> {
    /// Wraps `inner`.
    pub fn new(inner: W) -> WriteSink<W> {
        WriteSink(inner)
    }

    /// Returns the wrapped writer, consuming self.
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }
}

/// Adapter exposing any [`io::Read`] as a non-seekable [`Source`].
pub struct ReadSource<R: Read>(R);

impl<R: Read> ReadSource<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> ReadSource<R> {
        ReadSource(inner)
    }

    /// Returns the wrapped reader, consuming self.
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R: Read> Source for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}
