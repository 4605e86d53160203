//! An A3M file reader.

use std::io;
use std::io::BufRead;

use crate::a3m::Msa;
use crate::a3m::Record;
use crate::a3m::record::HEADER_PREFIX;

/// The new line character.
const NEW_LINE: u8 = b'\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// An A3M (or any FASTA-like alignment) reader.
///
/// The reader is lenient in the same ways alignment tools tend to be: blank
/// lines are skipped, sequences may span multiple lines, any text before the
/// first header is ignored, and invalid UTF-8 is replaced rather than treated
/// as an error.
#[derive(Clone, Debug)]
pub struct Reader<T>(T)
where
    T: BufRead;

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates an A3M reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b">query\nACDE\n>hit\nAC-E\n";
    /// let reader = msabench::a3m::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a reference to the inner reader.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// The trailing line ending (`\n` or `\r\n`) is removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b">query\r\nACDE";
    /// let mut reader = msabench::a3m::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 8);
    /// assert_eq!(buffer, ">query");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 4);
    /// assert_eq!(buffer, "ACDE");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 0);
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        read_line(&mut self.0, buffer)
    }

    /// Returns an iterator over the [`Record`]s in the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b">query desc\nACDE\nFG\n\n>hit\nAC-efE\nFG\n";
    /// let mut reader = msabench::a3m::Reader::new(&data[..]);
    ///
    /// let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(records.len(), 2);
    /// assert_eq!(records[0].header(), "query desc");
    /// assert_eq!(records[0].sequence(), "ACDEFG");
    /// assert_eq!(records[1].sequence(), "AC-efEFG");
    ///
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn records(&mut self) -> Records<'_, T> {
        Records::new(self)
    }

    /// Reads every record into an [`Msa`].
    ///
    /// Returns [`None`] if the underlying reader holds no records.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b">query\nACDE\n>hit\nAC-E\n";
    /// let mut reader = msabench::a3m::Reader::new(&data[..]);
    ///
    /// let msa = reader.read_msa()?.unwrap();
    /// assert_eq!(msa.query().header(), "query");
    /// assert_eq!(msa.len(), 2);
    ///
    /// let mut reader = msabench::a3m::Reader::new(&b""[..]);
    /// assert!(reader.read_msa()?.is_none());
    ///
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn read_msa(&mut self) -> io::Result<Option<Msa>> {
        let records = self.records().collect::<io::Result<Vec<_>>>()?;
        Ok(Msa::try_from_records(records))
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self(inner)
    }
}

/// An iterator over the [`Record`]s of a [`Reader`].
#[derive(Debug)]
pub struct Records<'a, T>
where
    T: BufRead,
{
    /// The inner reader.
    reader: &'a mut Reader<T>,

    /// The header of the next record, if one has been read already.
    header: Option<String>,

    /// Whether the underlying reader is exhausted.
    done: bool,
}

impl<'a, T> Records<'a, T>
where
    T: BufRead,
{
    /// Creates a new [`Records`].
    fn new(reader: &'a mut Reader<T>) -> Self {
        Self {
            reader,
            header: None,
            done: false,
        }
    }
}

impl<T> Iterator for Records<'_, T>
where
    T: BufRead,
{
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer = String::new();
        let mut sequence = String::new();

        loop {
            if self.done {
                return self
                    .header
                    .take()
                    .map(|header| Ok(Record::new(header, sequence)));
            }

            match self.reader.read_line_raw(&mut buffer) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    let line = buffer.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if let Some(next) = line.strip_prefix(HEADER_PREFIX) {
                        let next = next.trim().to_string();

                        match self.header.replace(next) {
                            Some(header) => return Some(Ok(Record::new(header, sequence))),
                            None => continue,
                        }
                    }

                    // Lines before the first header are ignored.
                    if self.header.is_some() {
                        sequence.push_str(line);
                    }
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Reads a line from a buffered reader, lossily decoding it as UTF-8.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    let mut bytes = Vec::new();

    match reader.read_until(NEW_LINE, &mut bytes) {
        Ok(0) => Ok(0),
        Ok(n) => {
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            if buffer.ends_with(NEW_LINE as char) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_read_line() {
        let data = b"hello\r\nworld!";
        let mut cursor = io::Cursor::new(data);

        let mut buffer = String::new();
        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "hello");
        assert_eq!(len, 7);

        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "world!");
        assert_eq!(len, 6);
    }

    #[test]
    fn test_text_before_first_header_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"# comment\nACDE\n>query\nAC\n";
        let mut reader = Reader::new(&data[..]);

        let records = reader.records().collect::<io::Result<Vec<_>>>()?;
        assert_eq!(records, vec![Record::new("query", "AC")]);

        Ok(())
    }

    #[test]
    fn test_header_without_sequence() -> Result<(), Box<dyn std::error::Error>> {
        let data = b">query\nAC\n>empty\n>last\nDE";
        let mut reader = Reader::new(&data[..]);

        let records = reader.records().collect::<io::Result<Vec<_>>>()?;
        assert_eq!(
            records,
            vec![
                Record::new("query", "AC"),
                Record::new("empty", ""),
                Record::new("last", "DE"),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_replaced() -> Result<(), Box<dyn std::error::Error>> {
        let data = b">query\xff\nAC\n";
        let mut reader = Reader::new(&data[..]);

        let records = reader.records().collect::<io::Result<Vec<_>>>()?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence(), "AC");

        Ok(())
    }
}
