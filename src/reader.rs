use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{NetstatError, Result};

/// Lazily yields `(line_number, line)` pairs from one `/proc` table.
///
/// Line numbers start at 0 so decoders can recognise the header. Trailing
/// newlines are removed; leading whitespace is kept because the IGMP table
/// marks child rows with a tab.
pub struct RecordReader {
    path: PathBuf,
    inner: BufReader<File>,
    line_no: usize,
    buf: Vec<u8>,
}

impl RecordReader {
    /// Open a table. Returns `Ok(None)` when the file does not exist, which
    /// means the kernel was built without that protocol.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        match File::open(path) {
            Ok(file) => Ok(Some(Self {
                path: path.to_path_buf(),
                inner: BufReader::new(file),
                line_no: 0,
                buf: Vec::with_capacity(256),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NetstatError::io(path, e)),
        }
    }
}

impl Iterator for RecordReader {
    type Item = (usize, String);

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.inner.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                let line_no = self.line_no;
                self.line_no += 1;
                Some((line_no, line))
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    line = self.line_no,
                    "read failed: {}",
                    e
                );
                None
            }
        }
    }
}
