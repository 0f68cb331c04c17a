use super::types::RawLine;
use crate::error::FileAccessError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opens log files, plain or gzip-compressed, as line streams
pub struct LogReader;

impl LogReader {
    /// Open a file for line-by-line reading. Paths ending in `.gz` are
    /// decompressed on the fly.
    pub fn open(path: &Path) -> Result<LineStream, FileAccessError> {
        let file = File::open(path).map_err(|source| FileAccessError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let inner: Box<dyn Read + Send> = if is_gzip(path) {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Ok(LineStream {
            reader: BufReader::new(inner),
            path: path.to_path_buf(),
            display: Arc::from(path.to_string_lossy().as_ref()),
            line_number: 0,
            buf: Vec::with_capacity(256),
            done: false,
        })
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Lazy, forward-only sequence of 1-based numbered lines.
/// Invalid UTF-8 is replaced with U+FFFD. The stream ends after the first
/// read error.
pub struct LineStream {
    reader: BufReader<Box<dyn Read + Send>>,
    path: PathBuf,
    display: Arc<str>,
    line_number: usize,
    buf: Vec<u8>,
    done: bool,
}

impl LineStream {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared display form of the path, attached to every line
    pub fn display_path(&self) -> Arc<str> {
        self.display.clone()
    }
}

impl Iterator for LineStream {
    type Item = Result<RawLine, FileAccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_number += 1;
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(RawLine {
                    path: self.display.clone(),
                    line_number: self.line_number,
                    text: String::from_utf8_lossy(&self.buf).into_owned(),
                }))
            }
            Err(source) => {
                self.done = true;
                Some(Err(FileAccessError::Read {
                    path: self.path.clone(),
                    line: self.line_number + 1,
                    source,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn lines(path: &Path) -> Vec<String> {
        LogReader::open(path)
            .unwrap()
            .map(|l| l.unwrap().text)
            .collect()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_file_lines_are_numbered() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("simulate.log");
        fs::write(&file, "first\r\nsecond\nthird").unwrap();

        let read: Vec<RawLine> = LogReader::open(&file).unwrap().map(Result::unwrap).collect();
        assert_eq!(read.len(), 3);
        assert_eq!(read[0].text, "first");
        assert_eq!(read[1].line_number, 2);
        assert_eq!(read[2].text, "third");
    }

    #[test]
    fn test_gzip_is_decompressed() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("simulate.log.gz");
        fs::write(&file, gzip(b"UVM_ERROR one\nUVM_ERROR two\n")).unwrap();

        assert_eq!(lines(&file), vec!["UVM_ERROR one", "UVM_ERROR two"]);
    }

    #[test]
    fn test_multi_member_gzip() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("compile.log.gz");
        let mut data = gzip(b"a\n");
        data.extend(gzip(b"b\n"));
        fs::write(&file, data).unwrap();

        assert_eq!(lines(&file), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("simulate.log");
        fs::write(&file, b"bad \xff byte\n").unwrap();

        assert_eq!(lines(&file), vec!["bad \u{FFFD} byte"]);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = LogReader::open(Path::new("/nonexistent/simulate.log")).err().unwrap();
        assert!(matches!(err, FileAccessError::Open { .. }));
    }

    #[test]
    fn test_truncated_gzip_yields_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("simulate.log.gz");
        let data = gzip("UVM_ERROR x\n".repeat(200).as_bytes());
        fs::write(&file, &data[..data.len() / 2]).unwrap();

        let results: Vec<_> = LogReader::open(&file).unwrap().collect();
        assert!(matches!(results.last(), Some(Err(FileAccessError::Read { .. }))));
    }
}
