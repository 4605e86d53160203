//! An A3M file writer.

use std::io;
use std::io::Write;

use crate::a3m::Record;

/// An A3M file writer.
#[derive(Debug)]
pub struct Writer<W>(W)
where
    W: Write;

impl<W> Writer<W>
where
    W: Write,
{
    /// Creates an A3M writer.
    pub fn new(inner: W) -> Self {
        Self(inner)
    }

    /// Gets a mutable reference to the inner writer.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.0
    }

    /// Consumes self and returns the inner writer.
    pub fn into_inner(self) -> W {
        self.0
    }

    /// Writes a single [`Record`] followed by a new line.
    ///
    /// # Examples
    ///
    /// ```
    /// use msabench::a3m::Record;
    /// use msabench::a3m::Writer;
    ///
    /// let mut writer = Writer::new(Vec::new());
    /// writer.write_record(&Record::new("query", "ACDE"))?;
    /// writer.write_record(&Record::new("hit", "ACgD-"))?;
    ///
    /// assert_eq!(writer.into_inner(), b">query\nACDE\n>hit\nACgD-\n");
    ///
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        writeln!(self.0, "{record}")
    }
}
