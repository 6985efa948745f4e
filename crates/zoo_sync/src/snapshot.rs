//! Line-delimited JSON snapshot files.
//!
//! One JSON object per line, no enclosing array. Blank lines are skipped;
//! line numbers in errors are 1-based and count blank lines too.

use crate::error::{SyncError, SyncResult};
use serde::Serialize;
use std::io::{BufRead, BufWriter, Lines, Write};
use zoo_codec::{from_json_line, to_json_line, Value};

/// Streams records out of a snapshot, one line at a time.
pub struct SnapshotReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> SnapshotReader<R> {
    /// Reads a snapshot from any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for SnapshotReader<R> {
    /// A record with the line it came from.
    type Item = SyncResult<(usize, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            return Some(
                from_json_line(&text)
                    .map(|record| (self.line, record))
                    .map_err(|source| SyncError::Parse {
                        line: self.line,
                        source,
                    }),
            );
        }
    }
}

/// Writes one JSON value per line.
pub struct SnapshotWriter<W: Write> {
    writer: BufWriter<W>,
    written: usize,
}

impl<W: Write> SnapshotWriter<W> {
    /// Wraps any writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Writes a record with the keys of every nested map sorted.
    pub fn write_record(&mut self, record: &Value) -> SyncResult<()> {
        let line = to_json_line(&record.with_sorted_keys())?;
        self.write_line(line.as_bytes())
    }

    /// Writes any serializable value as one line.
    pub fn write_json<T: Serialize>(&mut self, value: &T) -> SyncResult<()> {
        let line = serde_json::to_vec(value)?;
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &[u8]) -> SyncResult<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes buffered lines and returns the inner writer.
    pub fn finish(self) -> SyncResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| SyncError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reader_skips_blank_lines_and_counts_them() {
        let input = "{\"a\": 1}\n\n   \n{\"b\": 2}\n";
        let records: Vec<(usize, Value)> = SnapshotReader::new(Cursor::new(input))
            .collect::<SyncResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 1);
        assert_eq!(records[1].0, 4);
        assert_eq!(records[1].1.get("b"), Some(&Value::from(2)));
    }

    #[test]
    fn reader_reports_bad_line() {
        let input = "{\"a\": 1}\n[1, 2]\n{\"c\": 3}\n";
        let mut reader = SnapshotReader::new(Cursor::new(input));
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(matches!(err, SyncError::Parse { .. }));
    }

    #[test]
    fn writer_sorts_keys_and_counts_lines() {
        let mut writer = SnapshotWriter::new(Vec::new());
        writer
            .write_record(&from_json_line(r#"{"b": {"y": 1, "x": 2}, "a": [2, 1]}"#).unwrap())
            .unwrap();
        writer.write_json(&serde_json::json!({"k": true})).unwrap();
        assert_eq!(writer.written(), 2);

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "{\"a\":[2,1],\"b\":{\"x\":2,\"y\":1}}\n{\"k\":true}\n");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(SnapshotReader::new(Cursor::new("")).count(), 0);
    }
}
