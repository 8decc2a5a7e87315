//! Line-by-line reader for trace dumps.
//!
//! xperf output is mostly ASCII but symbol names can carry arbitrary bytes,
//! so lines are decoded lossily instead of failing the whole run.

use std::io::BufRead;

/// Iterator over `(line_number, line)` pairs, 1-based, without line endings
pub struct TraceLines<R> {
    reader: R,
    line_number: usize,
    buf: Vec<u8>,
}

/// Wrap a buffered reader
///
/// **Public** - every ingest pass reads its input through this
pub fn read_lines<R: BufRead>(reader: R) -> TraceLines<R> {
    TraceLines {
        reader,
        line_number: 0,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for TraceLines<R> {
    type Item = std::io::Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                Some(Ok((self.line_number, line)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_numbers_lines_and_strips_endings() {
        let input = Cursor::new(b"first\r\nsecond\n\nlast".to_vec());
        let lines: Vec<(usize, String)> = read_lines(input).map(|l| l.unwrap()).collect();
        assert_eq!(
            lines,
            vec![
                (1, "first".to_string()),
                (2, "second".to_string()),
                (3, String::new()),
                (4, "last".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let input = Cursor::new(b"app\xff.exe\n".to_vec());
        let (_, line) = read_lines(input).next().unwrap().unwrap();
        assert_eq!(line, "app\u{fffd}.exe");
    }
}
